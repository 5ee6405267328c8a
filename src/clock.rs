//! [`AlarmClock`] owns all alarm state: the registry, the scheduler, the
//! dismissal gate and the session statistics. Everything that changes an
//! alarm goes through it, one call at a time.

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::{
    alarm::{Alarm, AlarmBuilder, AlarmId, AlarmState},
    alert::Alert,
    communication::{AlarmView, Snapshot},
    error::{AlarmError, Result},
    gate::{ChallengeRequest, ChallengeTicket, DismissMode, Dismissal, DismissalGate},
    registry::AlarmRegistry,
    ringtone::Ringtone,
    scheduler::{PreemptPolicy, Scheduler, StopPolicy, VolumeCurve},
    stats::Statistics,
};

/// How alarms behave, the `[alarm]` table of the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// seconds between a snooze and the next ring
    pub snooze_secs: u32,
    /// stop and snooze have to win a challenge first
    pub challenge: bool,
    pub on_stop: StopPolicy,
    pub on_preempt: PreemptPolicy,
    pub volume: VolumeCurve,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            snooze_secs: 5,
            challenge: false,
            on_stop: StopPolicy::default(),
            on_preempt: PreemptPolicy::default(),
            volume: VolumeCurve::default(),
        }
    }
}

impl Settings {
    /// never zero, a snooze always ends after the tick that started it
    #[must_use]
    pub fn snooze(&self) -> TimeDelta {
        TimeDelta::seconds(i64::from(self.snooze_secs.max(1)))
    }
}

#[derive(Debug)]
pub struct AlarmClock<R: Ringtone> {
    registry: AlarmRegistry<R>,
    scheduler: Scheduler,
    gate: DismissalGate,
    stats: Statistics,
    settings: Settings,
}

impl<R: Ringtone> Default for AlarmClock<R> {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl<R: Ringtone> AlarmClock<R> {
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            registry: AlarmRegistry::new(),
            scheduler: Scheduler::new(settings.volume, settings.on_preempt),
            gate: DismissalGate::new(settings.challenge),
            stats: Statistics::default(),
            settings,
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// applies to every request and tick from now on
    pub fn configure(&mut self, settings: Settings) {
        self.scheduler.configure(settings.volume, settings.on_preempt);
        self.gate.set_challenge_required(settings.challenge);
        self.settings = settings;
    }

    /// # Errors
    /// [`AlarmError::IncompleteAlarmSpec`] or [`AlarmError::DuplicateTime`]
    pub fn set_alarm(&mut self, builder: AlarmBuilder<R>) -> Result<AlarmId> {
        let id = self.registry.add(builder)?;
        log::info!("alarm {id} set");
        Ok(id)
    }

    /// Removes an alarm in any state, silencing it if it was ringing.
    ///
    /// # Errors
    /// [`AlarmError::UnknownAlarmId`]
    pub fn remove_alarm(&mut self, id: AlarmId) -> Result<()> {
        self.registry.remove(id)?;
        self.scheduler.forget(id);
        self.gate.forget(id);
        log::info!("alarm {id} removed");
        Ok(())
    }

    /// # Errors
    /// [`AlarmError::UnknownAlarmId`]
    pub fn alarm(&self, id: AlarmId) -> Result<&Alarm<R>> {
        self.registry.get(id)
    }

    pub fn alarms(&self) -> impl Iterator<Item = &Alarm<R>> {
        self.registry.iter()
    }

    #[must_use]
    pub const fn ringing(&self) -> Option<AlarmId> {
        self.scheduler.ringing()
    }

    #[must_use]
    pub const fn stats(&self) -> Statistics {
        self.stats
    }

    #[must_use]
    pub fn pending_challenges(&self) -> &[ChallengeRequest] {
        self.gate.pending()
    }

    pub fn tick(&mut self, now: NaiveDateTime) -> Vec<Alert> {
        let alerts = self
            .scheduler
            .tick(&mut self.registry, now, self.stats.snooze_count());
        for alert in &alerts {
            if let Alert::AlarmPreempted { id, .. } = alert {
                self.gate.forget(*id);
            }
        }
        alerts
    }

    /// # Errors
    /// [`AlarmError::UnknownAlarmId`], or [`AlarmError::NotRinging`] unless
    /// the alarm is ringing or snoozed
    pub fn request_stop(&mut self, id: AlarmId, now: NaiveDateTime) -> Result<Dismissal> {
        self.request(id, DismissMode::Stop, now)
    }

    /// # Errors
    /// [`AlarmError::UnknownAlarmId`], or [`AlarmError::NotRinging`] unless
    /// the alarm is ringing
    pub fn request_snooze(&mut self, id: AlarmId, now: NaiveDateTime) -> Result<Dismissal> {
        self.request(id, DismissMode::Snooze, now)
    }

    /// Commits the request behind a won challenge.
    ///
    /// # Errors
    /// [`AlarmError::UnknownChallenge`] if the challenge is no longer
    /// pending, or the alarm errors of the request if the alarm moved on
    /// in the meantime.
    pub fn report_win(&mut self, ticket: ChallengeTicket, now: NaiveDateTime) -> Result<Alert> {
        let request = self.gate.resolve(ticket)?;
        self.check_dismissable(request.alarm, request.mode)?;
        log::info!("challenge {ticket} won");
        self.commit(request.alarm, request.mode, now)
    }

    /// The alarm keeps doing whatever it was doing.
    ///
    /// # Errors
    /// [`AlarmError::UnknownChallenge`]
    pub fn cancel_challenge(&mut self, ticket: ChallengeTicket) -> Result<ChallengeRequest> {
        self.gate.withdraw(ticket)
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            alarms: self.registry.iter().map(AlarmView::from).collect(),
            ringing: self.ringing(),
            stats: self.stats,
            challenges: self.gate.pending().to_vec(),
        }
    }

    /// Silences and drops every alarm.
    pub fn teardown(&mut self) {
        self.registry.clear();
        self.gate.clear();
        if let Some(id) = self.scheduler.ringing() {
            self.scheduler.forget(id);
        }
        log::info!("alarm clock torn down");
    }

    fn request(&mut self, id: AlarmId, mode: DismissMode, now: NaiveDateTime) -> Result<Dismissal> {
        self.check_dismissable(id, mode)?;
        match self.gate.admit(id, mode, self.stats.snooze_count()) {
            Some(request) => {
                log::info!("alarm {id} waits on challenge {}", request.ticket);
                Ok(Dismissal::Challenged(request))
            }
            None => self.commit(id, mode, now).map(Dismissal::Committed),
        }
    }

    fn check_dismissable(&self, id: AlarmId, mode: DismissMode) -> Result<()> {
        let state = self.registry.get(id)?.state();
        let allowed = match mode {
            DismissMode::Stop => matches!(state, AlarmState::Ringing | AlarmState::Snoozed),
            DismissMode::Snooze => state == AlarmState::Ringing,
        };
        if allowed {
            Ok(())
        } else {
            Err(AlarmError::NotRinging(id))
        }
    }

    fn commit(&mut self, id: AlarmId, mode: DismissMode, now: NaiveDateTime) -> Result<Alert> {
        let alert = match mode {
            DismissMode::Stop => {
                let alert = self
                    .scheduler
                    .commit_stop(&mut self.registry, id, self.settings.on_stop)?;
                self.stats.record_wake_up();
                alert
            }
            DismissMode::Snooze => {
                let until = now + self.settings.snooze();
                let alert = self
                    .scheduler
                    .commit_snooze(&mut self.registry, id, until)?;
                self.stats.record_snooze();
                alert
            }
        };
        self.gate.forget(id);
        Ok(alert)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::*;
    use crate::ringtone::MemoryRingtone;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn with_alarm(settings: Settings) -> AlarmClock<MemoryRingtone> {
        let mut clock = AlarmClock::new(settings);
        clock
            .set_alarm(
                AlarmBuilder::new()
                    .time(NaiveTime::from_hms_opt(7, 0, 0).unwrap())
                    .ringtone(MemoryRingtone::new("alarm.mp3")),
            )
            .unwrap();
        clock
    }

    #[test]
    fn snooze_is_never_shorter_than_a_second() {
        let settings = Settings {
            snooze_secs: 0,
            ..Settings::default()
        };
        assert_eq!(settings.snooze(), TimeDelta::seconds(1));
    }

    #[test]
    fn stop_removes_the_alarm_by_default() {
        let mut clock = with_alarm(Settings::default());
        clock.tick(at(7, 0, 0));
        let dismissal = clock.request_stop(1, at(7, 0, 3)).unwrap();

        assert_eq!(dismissal, Dismissal::Committed(Alert::AlarmStopped(1)));
        assert!(clock.alarm(1).is_err());
        assert_eq!(clock.stats().wake_up_success(), 1);
        assert_eq!(clock.ringing(), None);
    }

    #[test]
    fn scheduled_alarm_cannot_be_dismissed() {
        let mut clock = with_alarm(Settings::default());
        assert_eq!(
            clock.request_snooze(1, at(6, 0, 0)),
            Err(AlarmError::NotRinging(1))
        );
        assert_eq!(
            clock.request_stop(1, at(6, 0, 0)),
            Err(AlarmError::NotRinging(1))
        );
        assert_eq!(clock.stats(), Statistics::default());
    }

    #[test]
    fn snoozed_alarm_can_be_stopped() {
        let mut clock = with_alarm(Settings::default());
        clock.tick(at(7, 0, 0));
        clock.request_snooze(1, at(7, 0, 0)).unwrap();
        clock.request_stop(1, at(7, 0, 2)).unwrap();

        assert!(clock.tick(at(7, 0, 5)).is_empty());
        assert_eq!(clock.stats().snooze_count(), 1);
        assert_eq!(clock.stats().wake_up_success(), 1);
    }

    #[test]
    fn removing_the_ringing_alarm_silences_it() {
        let mut clock = with_alarm(Settings::default());
        let probe = clock.alarm(1).unwrap().ringtone().probe();
        clock.tick(at(7, 0, 0));
        clock.remove_alarm(1).unwrap();

        assert_eq!(probe.playing(), 0);
        assert_eq!(clock.ringing(), None);
        assert_eq!(clock.remove_alarm(1), Err(AlarmError::UnknownAlarmId(1)));
    }

    #[test]
    fn configure_switches_challenges_on() {
        let mut clock = with_alarm(Settings::default());
        clock.configure(Settings {
            challenge: true,
            ..Settings::default()
        });
        clock.tick(at(7, 0, 0));
        assert!(matches!(
            clock.request_stop(1, at(7, 0, 1)),
            Ok(Dismissal::Challenged(_))
        ));
    }

    #[test]
    fn teardown_silences_everything() {
        let mut clock = with_alarm(Settings {
            challenge: true,
            ..Settings::default()
        });
        let probe = clock.alarm(1).unwrap().ringtone().probe();
        clock.tick(at(7, 0, 0));
        clock.request_snooze(1, at(7, 0, 1)).unwrap();
        clock.teardown();

        assert_eq!(probe.playing(), 0);
        assert_eq!(clock.alarms().count(), 0);
        assert!(clock.pending_challenges().is_empty());
        assert_eq!(clock.ringing(), None);
    }

    #[test]
    fn snapshot_lists_alarms_for_display() {
        let mut clock = with_alarm(Settings::default());
        clock.tick(at(7, 0, 0));
        let snapshot = clock.snapshot();

        assert_eq!(snapshot.ringing, Some(1));
        assert_eq!(snapshot.alarms.len(), 1);
        assert_eq!(snapshot.alarms[0].state, AlarmState::Ringing);
        assert_eq!(snapshot.alarms[0].sound, "custom");
    }
}
