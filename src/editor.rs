use std::{
    collections::HashMap,
    ffi::OsStr,
    path::{Path, PathBuf},
};

use chrono::NaiveTime;
use eframe::egui::{self, ScrollArea, Window};

use crate::{config::Sound, widgets::Dial};

const DIAL_RADIUS: f32 = 48.;

/// What the editor hands back once the user is done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAlarm {
    pub time: Option<NaiveTime>,
    pub sound: Option<PathBuf>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditingState {
    Cancelled,
    Editing,
    Done(NewAlarm),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlarmEditor {
    pub name: String,
    pub hour: u8,
    pub minute: u8,
    /// name of a sound in the library
    pub sound: Option<String>,
}

impl AlarmEditor {
    #[must_use]
    pub fn new(default_sound: &str) -> Self {
        Self {
            sound: Some(default_sound.to_string()),
            ..Self::default()
        }
    }

    /// Resolves the picked sound against the library. A sound that isn't in
    /// the library leaves the alarm without a ringtone, which the service
    /// will refuse.
    #[must_use]
    pub fn finish(&self, sounds: &HashMap<String, Sound>) -> NewAlarm {
        NewAlarm {
            time: NaiveTime::from_hms_opt(u32::from(self.hour), u32::from(self.minute), 0),
            sound: self
                .sound
                .as_ref()
                .and_then(|name| sounds.get(name))
                .map(|sound| sound.path.clone()),
            name: Some(self.name.trim())
                .filter(|name| !name.is_empty())
                .map(str::to_string),
        }
    }

    pub fn show(&mut self, ctx: &egui::Context, sounds: &mut HashMap<String, Sound>) -> EditingState {
        let mut state = EditingState::Editing;
        Window::new("New alarm")
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Name");
                    ui.text_edit_singleline(&mut self.name);
                });
                ui.horizontal(|ui| {
                    self.time_editor(ui);
                    ui.separator();
                    self.sound_picker(ui, sounds);
                });
                ui.horizontal(|ui| {
                    if ui.button("Set").clicked() {
                        state = EditingState::Done(self.finish(sounds));
                    } else if ui.button("Cancel").clicked() {
                        state = EditingState::Cancelled;
                    }
                });
            });
        state
    }

    fn time_editor(&mut self, ui: &mut egui::Ui) {
        ui.vertical(|ui| {
            let hand = ui.visuals().selection.bg_fill;
            ui.horizontal(|ui| {
                ui.vertical(|ui| {
                    ui.label("Hour");
                    ui.add(Dial::new(&mut self.hour, 24).radius(DIAL_RADIUS).hand_color(hand));
                });
                ui.vertical(|ui| {
                    ui.label("Minute");
                    ui.add(Dial::new(&mut self.minute, 60).radius(DIAL_RADIUS).hand_color(hand));
                });
            });
            ui.label(format!("{:02}:{:02}", self.hour, self.minute));
        });
    }

    fn sound_picker(&mut self, ui: &mut egui::Ui, sounds: &mut HashMap<String, Sound>) {
        ui.vertical(|ui| {
            ui.label("Sound");
            ScrollArea::vertical()
                .id_salt("sounds")
                .max_height(120.)
                .show(ui, |ui| {
                    let mut names: Vec<&String> = sounds.keys().collect();
                    names.sort();
                    for name in names {
                        ui.selectable_value(&mut self.sound, Some(name.clone()), name);
                    }
                });
            if ui.button("Custom").clicked() {
                if let Some(sound) = pick_sound() {
                    self.sound = Some(sound.name.clone());
                    sounds.insert(sound.name.clone(), sound);
                }
            }
        });
    }
}

fn pick_sound() -> Option<Sound> {
    let dialog = rfd::FileDialog::new()
        .set_title("Pick alarm sound")
        .add_filter("audio", &["mp3", "wav", "ogg", "flac"]);
    let dialog = match directories::UserDirs::new()
        .and_then(|dirs| dirs.audio_dir().map(Path::to_path_buf))
    {
        Some(audio) => dialog.set_directory(audio),
        None => dialog,
    };
    let path = dialog.pick_file()?;
    let name = path.file_stem().and_then(OsStr::to_str)?.to_string();
    Some(Sound::new(name, path))
}
