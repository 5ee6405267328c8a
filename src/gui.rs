use std::{collections::BTreeMap, path::PathBuf, time::Duration};

use eframe::egui::{
    self, Button, CentralPanel, Context, DragValue, Grid, Layout, ScrollArea, Slider,
    TopBottomPanel, Window,
};

use crate::{
    alarm::AlarmState,
    alert::Alert,
    challenge::Puzzle,
    clock::Settings,
    communication::{Command, Snapshot, Update},
    config::{self, Config, Theme},
    editor::{AlarmEditor, EditingState},
    gate::{ChallengeRequest, ChallengeTicket, DismissMode},
    scheduler::{PreemptPolicy, StopPolicy},
    service::ServiceHandle,
};

const MAX_NOTICES: usize = 5;

struct ChallengeWindow {
    request: ChallengeRequest,
    puzzle: Option<Puzzle>,
    answer: String,
    wrong: bool,
}

impl ChallengeWindow {
    fn new(request: ChallengeRequest, config: &Config) -> Self {
        let mut window = Self {
            request,
            puzzle: None,
            answer: String::new(),
            wrong: false,
        };
        window.new_puzzle(config);
        window
    }

    fn new_puzzle(&mut self, config: &Config) {
        self.puzzle = config
            .puzzles
            .pick(self.request.snooze_count, &mut rand::thread_rng())
            .cloned();
        self.answer.clear();
        self.wrong = false;
    }
}

pub struct AlarmApp {
    config: Config,
    config_path: PathBuf,
    service: ServiceHandle,
    snapshot: Snapshot,
    editor: Option<AlarmEditor>,
    /// edited copies of the settings, applied together
    settings: Option<(Settings, String)>,
    challenges: BTreeMap<ChallengeTicket, ChallengeWindow>,
    notices: Vec<String>,
    outbox: Vec<Command>,
}

impl AlarmApp {
    #[must_use]
    pub fn new(config: Config, config_path: PathBuf, service: ServiceHandle) -> Self {
        Self {
            config,
            config_path,
            service,
            snapshot: Snapshot::default(),
            editor: None,
            settings: None,
            challenges: BTreeMap::new(),
            notices: Vec::new(),
            outbox: Vec::new(),
        }
    }

    fn notice(&mut self, notice: String) {
        self.notices.push(notice);
        if self.notices.len() > MAX_NOTICES {
            self.notices.remove(0);
        }
    }

    fn receive(&mut self) {
        let updates: Vec<Update> = self.service.updates().collect();
        for update in updates {
            match update {
                Update::Snapshot(snapshot) => self.snapshot = snapshot,
                Update::Alert(alert) => {
                    log::debug!("{alert}");
                    match alert {
                        Alert::PlaybackBlocked { .. }
                        | Alert::AlarmPreempted { .. }
                        | Alert::AlarmSnoozed { .. }
                        | Alert::AlarmStopped(_) => self.notice(alert.to_string()),
                        _ => {}
                    }
                }
                Update::Rejected(reason) => self.notice(reason),
            }
        }
        self.reconcile_challenges();
    }

    /// one window per pending challenge, no more, no less
    fn reconcile_challenges(&mut self) {
        let pending = &self.snapshot.challenges;
        self.challenges
            .retain(|ticket, _| pending.iter().any(|request| request.ticket == *ticket));
        for request in pending {
            if !self.challenges.contains_key(&request.ticket) {
                self.challenges.insert(
                    request.ticket,
                    ChallengeWindow::new(request.clone(), &self.config),
                );
            }
        }
    }

    fn save(&mut self) {
        if let Err(err) = self.config.save(&self.config_path) {
            log::error!("{err}");
            self.notice(err.to_string());
        }
    }

    fn render_header(&mut self, ctx: &Context) {
        TopBottomPanel::top("time_and_ctrl").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let theme = ui.add(Button::new(if self.config.theme == Theme::Dark {
                    "🌞"
                } else {
                    "🌙"
                }));
                if theme.clicked() {
                    self.config.theme = !self.config.theme;
                    self.save();
                }
                ui.label(format!(
                    "Time: {}",
                    chrono::Local::now().format(&self.config.time_format)
                ));
                ui.with_layout(Layout::right_to_left(egui::Align::Min), |ui| {
                    if ui.button("⚙").on_hover_text("settings").clicked() {
                        self.settings = Some((
                            self.config.alarm.clone(),
                            self.config.time_format.clone(),
                        ));
                    }
                });
            });
        });
    }

    fn render_settings(&mut self, ctx: &Context) {
        let Some((settings, time_format)) = &mut self.settings else {
            return;
        };
        let mut apply = false;
        let mut close = false;
        Window::new("settings ⚙").show(ctx, |ui| {
            Grid::new("settings").num_columns(2).show(ui, |ui| {
                ui.label("Snooze (seconds)");
                ui.add(DragValue::new(&mut settings.snooze_secs).range(1..=3600));
                ui.end_row();

                ui.label("Challenge to dismiss");
                ui.checkbox(&mut settings.challenge, "");
                ui.end_row();

                ui.label("After stop");
                ui.horizontal(|ui| {
                    ui.radio_value(&mut settings.on_stop, StopPolicy::Remove, "remove");
                    ui.radio_value(&mut settings.on_stop, StopPolicy::Retain, "keep");
                });
                ui.end_row();

                ui.label("When silenced by another alarm");
                ui.horizontal(|ui| {
                    ui.radio_value(
                        &mut settings.on_preempt,
                        PreemptPolicy::Reschedule,
                        "tomorrow",
                    );
                    ui.radio_value(&mut settings.on_preempt, PreemptPolicy::Remove, "remove");
                });
                ui.end_row();

                ui.label("Volume");
                ui.add(Slider::new(&mut settings.volume.base, 0.0..=1.0));
                ui.end_row();

                ui.label("Louder per snooze");
                ui.add(Slider::new(&mut settings.volume.step, 0.0..=0.5));
                ui.end_row();

                ui.label("Time format");
                ui.text_edit_singleline(time_format);
                ui.end_row();
            });
            ui.horizontal(|ui| {
                apply = ui.button("apply").clicked();
                close = ui.button("close").clicked();
            });
        });
        if apply {
            let (settings, time_format) = (settings.clone(), time_format.clone());
            if config::is_valid_time_format(&time_format) {
                self.config.time_format = time_format;
            } else {
                self.notice(format!("{time_format:?} is not a valid time format"));
            }
            self.config.alarm = settings.clone();
            self.outbox.push(Command::Configure(settings));
            self.save();
        }
        if close {
            self.settings = None;
        }
    }

    fn render_editor(&mut self, ctx: &Context) {
        let Some(editor) = &mut self.editor else {
            return;
        };
        match editor.show(ctx, &mut self.config.sounds) {
            EditingState::Done(alarm) => {
                self.editor = None;
                self.outbox.push(Command::SetAlarm {
                    time: alarm.time,
                    sound: alarm.sound,
                    name: alarm.name,
                });
                // custom sounds stay in the library
                self.save();
            }
            EditingState::Cancelled => self.editor = None,
            EditingState::Editing => {}
        }
    }

    fn render_ringing(&mut self, ctx: &Context) {
        let Some(alarm) = self
            .snapshot
            .ringing
            .and_then(|id| self.snapshot.alarm(id))
        else {
            return;
        };
        let id = alarm.id;
        let title = alarm.name.clone().unwrap_or_else(|| format!("alarm {id}"));
        let time = alarm.time.format(&self.config.time_format).to_string();
        Window::new("Alarm ringing")
            .collapsible(false)
            .auto_sized()
            .show(ctx, |ui| {
                ui.heading(format!("⏰ {title}"));
                ui.label(time);
                ui.horizontal(|ui| {
                    if ui.button("Snooze").clicked() {
                        self.outbox.push(Command::RequestSnooze(id));
                    }
                    if ui.button("Stop").clicked() {
                        self.outbox.push(Command::RequestStop(id));
                    }
                });
            });
    }

    fn render_challenges(&mut self, ctx: &Context) {
        for (&ticket, window) in &mut self.challenges {
            let action = match window.request.mode {
                DismissMode::Stop => "stop",
                DismissMode::Snooze => "snooze",
            };
            let mut repick = false;
            Window::new(format!("Solve to {action}"))
                .id(egui::Id::new(("challenge", ticket)))
                .collapsible(false)
                .show(ctx, |ui| {
                    match &window.puzzle {
                        Some(puzzle) => {
                            ui.label(&puzzle.question);
                            let answer = ui.text_edit_singleline(&mut window.answer);
                            let submitted = answer.lost_focus()
                                && ui.input(|input| input.key_pressed(egui::Key::Enter));
                            if window.wrong {
                                ui.colored_label(egui::Color32::RED, "not quite, try again");
                            }
                            ui.horizontal(|ui| {
                                if ui.button("Submit").clicked() || submitted {
                                    if puzzle.is_solved_by(&window.answer) {
                                        self.outbox.push(Command::ChallengeWon(ticket));
                                    } else {
                                        window.wrong = true;
                                        window.answer.clear();
                                    }
                                }
                                repick = ui.button("New puzzle").clicked();
                                if ui.button("Cancel").clicked() {
                                    self.outbox.push(Command::CancelChallenge(ticket));
                                }
                            });
                        }
                        None => {
                            ui.label("there are no puzzles to solve");
                            if ui.button("Cancel").clicked() {
                                self.outbox.push(Command::CancelChallenge(ticket));
                            }
                        }
                    }
                });
            if repick {
                window.new_puzzle(&self.config);
            }
        }
    }

    fn render_stats(&self, ctx: &Context) {
        TopBottomPanel::bottom("stats").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!("Snoozes: {}", self.snapshot.stats.snooze_count()));
                ui.separator();
                ui.label(format!(
                    "Successful wake-ups: {}",
                    self.snapshot.stats.wake_up_success()
                ));
            });
            for notice in &self.notices {
                ui.small(notice);
            }
        });
    }

    fn list_alarms(&mut self, ui: &mut egui::Ui) {
        for alarm in &self.snapshot.alarms {
            if ui.button("x").on_hover_text("delete alarm").clicked() {
                self.outbox.push(Command::RemoveAlarm(alarm.id));
            }
            ui.label(alarm.time.format(&self.config.time_format).to_string());
            ui.label(alarm.name.as_deref().unwrap_or("-"));
            ui.label(&alarm.sound);
            match (alarm.state, alarm.snoozed_until) {
                (AlarmState::Snoozed, Some(until)) => {
                    ui.label(format!("snoozed until {}", until.format("%H:%M:%S")));
                }
                (state, _) => {
                    ui.label(state.to_string());
                }
            }
            if matches!(alarm.state, AlarmState::Ringing | AlarmState::Snoozed)
                && ui.button("stop").clicked()
            {
                self.outbox.push(Command::RequestStop(alarm.id));
            }
            ui.end_row();
        }
    }
}

impl eframe::App for AlarmApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.receive();
        ctx.set_visuals(self.config.theme.into());

        self.render_header(ctx);
        self.render_stats(ctx);
        self.render_settings(ctx);
        self.render_editor(ctx);
        self.render_ringing(ctx);
        self.render_challenges(ctx);

        CentralPanel::default().show(ctx, |ui| {
            if ui.button("+").on_hover_text("add alarm").clicked() && self.editor.is_none() {
                self.editor = Some(AlarmEditor::new(&self.config.default_sound));
            }
            ScrollArea::vertical().show(ui, |ui| {
                Grid::new("alarms").striped(true).show(ui, |ui| {
                    self.list_alarms(ui);
                });
            });
        });

        for command in self.outbox.drain(..) {
            self.service.send(command);
        }
        // the clock ticks elsewhere, keep the window in step with it
        ctx.request_repaint_after(Duration::from_millis(250));
    }
}
