//! The alarm service: one thread owns the [`AlarmClock`] and handles
//! [`Command`]s strictly in order, ticks from the [`ClockPoller`] included.

use std::{
    io,
    ops::ControlFlow,
    path::Path,
    sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryIter},
    thread::{self, JoinHandle},
    time::Duration,
};

use chrono::{NaiveDateTime, NaiveTime};

use crate::{
    alarm::{AlarmBuilder, AlarmId},
    alert::Alert,
    clock::{AlarmClock, Settings},
    communication::{Command, Update},
    error::{AlarmError, MissingPart, ServiceError},
    gate::Dismissal,
    poller::{self, ClockPoller, TICK_INTERVAL},
    ringtone::{MemoryProvider, RingtoneProvider, SpeakerProvider},
};

/// the label shown for an alarm, `alarm` for `sounds/alarm.mp3`
fn sound_label(path: &Path) -> String {
    path.file_stem().map_or_else(
        || "custom".to_string(),
        |stem| stem.to_string_lossy().into_owned(),
    )
}

#[derive(Debug)]
pub struct Service<P: RingtoneProvider> {
    provider: P,
    clock: AlarmClock<P::Ringtone>,
    updates: Sender<Update>,
    last_tick: Option<NaiveDateTime>,
}

impl<P: RingtoneProvider> Service<P> {
    pub fn new(provider: P, settings: Settings, updates: Sender<Update>) -> Self {
        Self {
            provider,
            clock: AlarmClock::new(settings),
            updates,
            last_tick: None,
        }
    }

    pub const fn clock(&self) -> &AlarmClock<P::Ringtone> {
        &self.clock
    }

    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// Handles commands until [`Command::Shutdown`] or until every sender
    /// is gone, then silences everything.
    pub fn run(mut self, commands: Receiver<Command>) {
        log::info!("alarm service started");
        for command in commands {
            if self.handle(command).is_break() {
                return;
            }
        }
        log::debug!("every command sender is gone");
        self.shutdown();
    }

    pub fn handle(&mut self, command: Command) -> ControlFlow<()> {
        log::debug!("handling {command:?}");
        let now = self.now();
        let outcome = match command {
            Command::Tick(now) => {
                self.last_tick = Some(now);
                for alert in self.clock.tick(now) {
                    self.publish(Update::Alert(alert));
                }
                Ok(None)
            }
            Command::SetAlarm { time, sound, name } => self
                .set_alarm(time, sound.as_deref(), name)
                .map(|id| Some(Alert::AlarmAdded(id))),
            Command::RemoveAlarm(id) => self
                .clock
                .remove_alarm(id)
                .map(|()| Some(Alert::AlarmRemoved(id)))
                .map_err(ServiceError::from),
            Command::RequestStop(id) => self
                .clock
                .request_stop(id, now)
                .map(|dismissal| Some(Self::dismissal_alert(dismissal)))
                .map_err(ServiceError::from),
            Command::RequestSnooze(id) => self
                .clock
                .request_snooze(id, now)
                .map(|dismissal| Some(Self::dismissal_alert(dismissal)))
                .map_err(ServiceError::from),
            Command::ChallengeWon(ticket) => self
                .clock
                .report_win(ticket, now)
                .map(Some)
                .map_err(ServiceError::from),
            Command::CancelChallenge(ticket) => self
                .clock
                .cancel_challenge(ticket)
                .map(|request| Some(Alert::ChallengeCancelled(request.ticket)))
                .map_err(ServiceError::from),
            Command::Configure(settings) => {
                log::info!("new alarm settings: {settings:?}");
                self.clock.configure(settings);
                Ok(None)
            }
            Command::Shutdown => {
                self.shutdown();
                return ControlFlow::Break(());
            }
        };
        match outcome {
            Ok(Some(alert)) => self.publish(Update::Alert(alert)),
            Ok(None) => {}
            Err(err) => {
                log::warn!("{err}");
                self.publish(Update::Rejected(err.to_string()));
            }
        }
        self.publish(Update::Snapshot(self.clock.snapshot()));
        ControlFlow::Continue(())
    }

    /// # Errors
    /// Fails if the time or sound is missing, the sound can't be opened or
    /// another alarm is set for the same minute.
    pub fn set_alarm(
        &mut self,
        time: Option<NaiveTime>,
        sound: Option<&Path>,
        name: Option<String>,
    ) -> Result<AlarmId, ServiceError> {
        let time = time.ok_or(AlarmError::IncompleteAlarmSpec(MissingPart::Time))?;
        let sound = sound.ok_or(AlarmError::IncompleteAlarmSpec(MissingPart::Ringtone))?;
        let ringtone = self.provider.open(sound)?;
        let mut builder = AlarmBuilder::new()
            .time(time)
            .ringtone(ringtone)
            .sound(sound_label(sound));
        if let Some(name) = name {
            builder = builder.name(name);
        }
        Ok(self.clock.set_alarm(builder)?)
    }

    fn dismissal_alert(dismissal: Dismissal) -> Alert {
        match dismissal {
            Dismissal::Committed(alert) => alert,
            Dismissal::Challenged(request) => Alert::ChallengeIssued(request),
        }
    }

    fn now(&self) -> NaiveDateTime {
        self.last_tick.unwrap_or_else(poller::local_now)
    }

    fn publish(&self, update: Update) {
        if self.updates.send(update).is_err() {
            log::debug!("nobody is listening for updates");
        }
    }

    fn shutdown(&mut self) {
        self.clock.teardown();
        self.publish(Update::Snapshot(self.clock.snapshot()));
        log::info!("alarm service stopped");
    }
}

/// Runs a [`Service`] and the [`ClockPoller`] feeding it, each on its own
/// thread.
#[derive(Debug)]
pub struct ServiceHandle {
    commands: Sender<Command>,
    updates: Receiver<Update>,
    poller: Option<ClockPoller>,
    thread: Option<JoinHandle<()>>,
}

impl ServiceHandle {
    /// Plays through the default audio output, or silently if there is none.
    ///
    /// # Errors
    /// Fails if a thread can't be spawned.
    pub fn spawn(settings: Settings) -> io::Result<Self> {
        Self::start(TICK_INTERVAL, poller::local_now, move |commands, updates| {
            match SpeakerProvider::open_default() {
                Ok(speaker) => Service::new(speaker, settings, updates).run(commands),
                Err(err) => {
                    log::error!("{err}, alarms will ring without sound");
                    Service::new(MemoryProvider::new(), settings, updates).run(commands);
                }
            }
        })
    }

    /// Ticks every `interval` with the time from `now`, playing through
    /// whatever `provider` opens.
    ///
    /// # Errors
    /// Fails if a thread can't be spawned.
    pub fn spawn_with<P, F, C>(
        settings: Settings,
        interval: Duration,
        now: C,
        provider: F,
    ) -> io::Result<Self>
    where
        P: RingtoneProvider,
        F: FnOnce() -> P + Send + 'static,
        C: Fn() -> NaiveDateTime + Send + 'static,
    {
        Self::start(interval, now, move |commands, updates| {
            Service::new(provider(), settings, updates).run(commands);
        })
    }

    fn start<C, S>(interval: Duration, now: C, service: S) -> io::Result<Self>
    where
        C: Fn() -> NaiveDateTime + Send + 'static,
        S: FnOnce(Receiver<Command>, Sender<Update>) + Send + 'static,
    {
        let (commands, inbox) = mpsc::channel();
        let (outbox, updates) = mpsc::channel();
        let thread = thread::Builder::new()
            .name("alarm-service".to_string())
            .spawn(move || service(inbox, outbox))?;
        let ticks = commands.clone();
        let poller = ClockPoller::spawn_with(interval, now, move |now| {
            ticks.send(Command::Tick(now)).is_ok()
        })?;
        Ok(Self {
            commands,
            updates,
            poller: Some(poller),
            thread: Some(thread),
        })
    }

    pub fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            log::error!("the alarm service is gone");
        }
    }

    /// updates that arrived since the last call
    pub fn updates(&self) -> TryIter<'_, Update> {
        self.updates.try_iter()
    }

    /// Waits up to `timeout` for the next update.
    #[must_use]
    pub fn next_update(&self, timeout: Duration) -> Option<Update> {
        match self.updates.recv_timeout(timeout) {
            Ok(update) => Some(update),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Stops the poller, then the service, and waits for both.
    pub fn shutdown(&mut self) {
        if let Some(mut poller) = self.poller.take() {
            poller.cancel();
        }
        if let Some(thread) = self.thread.take() {
            // the service may have exited already
            let _ = self.commands.send(Command::Shutdown);
            if thread.join().is_err() {
                log::error!("alarm service panicked");
            }
        }
    }
}

impl Drop for ServiceHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
