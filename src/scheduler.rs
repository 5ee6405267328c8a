//! The ringing state machine.
//!
//! ```text
//! Scheduled -> Ringing -> (Snoozed -> Ringing | Stopped)
//! ```
//!
//! On every tick the ringing alarm (if any) is left alone, then the first
//! `Scheduled` or `Snoozed` alarm in registry order that is due starts
//! ringing. Whatever was ringing before is preempted first, so only one
//! alarm ever plays.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{
    alarm::{AlarmId, AlarmState},
    alert::Alert,
    error::{AlarmError, Result},
    registry::AlarmRegistry,
    ringtone::Ringtone,
};

/// Ring volume, louder with every snooze.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeCurve {
    pub base: f32,
    pub step: f32,
}

impl Default for VolumeCurve {
    fn default() -> Self {
        Self {
            base: 0.5,
            step: 0.2,
        }
    }
}

impl VolumeCurve {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn at(&self, snooze_count: u32) -> f32 {
        self.step
            .mul_add(snooze_count as f32, self.base)
            .clamp(0.0, 1.0)
    }
}

/// What happens to an alarm after it is stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopPolicy {
    /// take it out of the registry
    #[default]
    Remove,
    /// keep listing it as stopped
    Retain,
}

/// What happens to a ringing alarm when another one starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreemptPolicy {
    /// back to `Scheduled`, it won't go off again the same day
    #[default]
    Reschedule,
    Remove,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    ringing: Option<AlarmId>,
    volume: VolumeCurve,
    on_preempt: PreemptPolicy,
}

impl Scheduler {
    #[must_use]
    pub fn new(volume: VolumeCurve, on_preempt: PreemptPolicy) -> Self {
        Self {
            ringing: None,
            volume,
            on_preempt,
        }
    }

    #[must_use]
    pub const fn ringing(&self) -> Option<AlarmId> {
        self.ringing
    }

    #[must_use]
    pub const fn volume(&self) -> VolumeCurve {
        self.volume
    }

    pub(crate) fn configure(&mut self, volume: VolumeCurve, on_preempt: PreemptPolicy) {
        self.volume = volume;
        self.on_preempt = on_preempt;
    }

    /// Runs one evaluation at `now`.
    pub fn tick<R: Ringtone>(
        &mut self,
        registry: &mut AlarmRegistry<R>,
        now: NaiveDateTime,
        snooze_count: u32,
    ) -> Vec<Alert> {
        let mut alerts = Vec::new();
        if let Some(id) = self.ringing {
            // removed or dismissed since the last tick
            if registry
                .get(id)
                .map_or(true, |alarm| alarm.state() != AlarmState::Ringing)
            {
                self.ringing = None;
            }
        }

        let Some(due) = registry
            .iter()
            .find(|alarm| alarm.is_due(now))
            .map(|alarm| alarm.id())
        else {
            return alerts;
        };

        if let Some(previous) = self.ringing.take() {
            if let Some(alert) = self.preempt(registry, previous, due) {
                alerts.push(alert);
            }
        }

        let volume = self.volume.at(snooze_count);
        if let Ok(alarm) = registry.get_mut(due) {
            let played = alarm.ring(now, volume);
            log::info!("alarm {due} ringing at volume {volume:.2}");
            alerts.push(Alert::AlarmRinging { id: due, volume });
            if let Err(err) = played {
                log::warn!("alarm {due} is ringing without sound: {err}");
                alerts.push(Alert::PlaybackBlocked {
                    id: due,
                    reason: err.to_string(),
                });
            }
            self.ringing = Some(due);
        }
        alerts
    }

    fn preempt<R: Ringtone>(
        &self,
        registry: &mut AlarmRegistry<R>,
        id: AlarmId,
        by: AlarmId,
    ) -> Option<Alert> {
        match self.on_preempt {
            PreemptPolicy::Reschedule => registry.get_mut(id).ok()?.reschedule(),
            PreemptPolicy::Remove => {
                registry.remove(id).ok()?;
            }
        }
        log::info!("alarm {id} silenced, alarm {by} takes over");
        Some(Alert::AlarmPreempted { id, by })
    }

    /// # Errors
    /// [`AlarmError::UnknownAlarmId`], or [`AlarmError::NotRinging`] unless
    /// the alarm is ringing or snoozed
    pub(crate) fn commit_stop<R: Ringtone>(
        &mut self,
        registry: &mut AlarmRegistry<R>,
        id: AlarmId,
        on_stop: StopPolicy,
    ) -> Result<Alert> {
        let alarm = registry.get_mut(id)?;
        if !matches!(alarm.state(), AlarmState::Ringing | AlarmState::Snoozed) {
            return Err(AlarmError::NotRinging(id));
        }
        alarm.stop();
        if self.ringing == Some(id) {
            self.ringing = None;
        }
        if on_stop == StopPolicy::Remove {
            registry.remove(id)?;
        }
        log::info!("alarm {id} stopped");
        Ok(Alert::AlarmStopped(id))
    }

    /// # Errors
    /// [`AlarmError::UnknownAlarmId`], or [`AlarmError::NotRinging`] unless
    /// the alarm is ringing
    pub(crate) fn commit_snooze<R: Ringtone>(
        &mut self,
        registry: &mut AlarmRegistry<R>,
        id: AlarmId,
        until: NaiveDateTime,
    ) -> Result<Alert> {
        let alarm = registry.get_mut(id)?;
        if alarm.state() != AlarmState::Ringing {
            return Err(AlarmError::NotRinging(id));
        }
        alarm.snooze(until);
        if self.ringing == Some(id) {
            self.ringing = None;
        }
        log::info!("alarm {id} snoozed until {until}");
        Ok(Alert::AlarmSnoozed { id, until })
    }

    pub(crate) fn forget(&mut self, id: AlarmId) {
        if self.ringing == Some(id) {
            self.ringing = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::*;
    use crate::{alarm::AlarmBuilder, ringtone::MemoryRingtone};

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn registry_with(times: &[(u32, u32)]) -> AlarmRegistry<MemoryRingtone> {
        let mut registry = AlarmRegistry::new();
        for &(h, m) in times {
            registry
                .add(
                    AlarmBuilder::new()
                        .time(NaiveTime::from_hms_opt(h, m, 0).unwrap())
                        .ringtone(MemoryRingtone::new(format!("{h}:{m}.mp3"))),
                )
                .unwrap();
        }
        registry
    }

    #[test]
    fn volume_grows_with_snoozes_and_caps_at_one() {
        let curve = VolumeCurve::default();
        assert!((curve.at(0) - 0.5).abs() < 1e-6);
        assert!((curve.at(1) - 0.7).abs() < 1e-6);
        assert!((curve.at(2) - 0.9).abs() < 1e-6);
        assert!((curve.at(3) - 1.0).abs() < 1e-6);
        assert!((curve.at(40) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn nothing_happens_before_the_alarm_time() {
        let mut registry = registry_with(&[(7, 0)]);
        let mut scheduler = Scheduler::default();
        assert!(scheduler.tick(&mut registry, at(6, 59, 59), 0).is_empty());
        assert_eq!(scheduler.ringing(), None);
    }

    #[test]
    fn ringing_alarm_keeps_ringing_across_ticks() {
        let mut registry = registry_with(&[(7, 0)]);
        let mut scheduler = Scheduler::default();
        let alerts = scheduler.tick(&mut registry, at(7, 0, 0), 0);
        assert_eq!(alerts, vec![Alert::AlarmRinging { id: 1, volume: 0.5 }]);

        for s in 1..=59 {
            assert!(scheduler.tick(&mut registry, at(7, 0, s), 0).is_empty());
        }
        assert!(scheduler.tick(&mut registry, at(7, 5, 0), 0).is_empty());
        assert_eq!(scheduler.ringing(), Some(1));
        assert_eq!(registry.get(1).unwrap().state(), AlarmState::Ringing);
    }

    #[test]
    fn later_alarm_preempts_the_ringing_one() {
        let mut registry = registry_with(&[(7, 0), (7, 1)]);
        let first = registry.get(1).unwrap().ringtone().probe();
        let mut scheduler = Scheduler::default();
        scheduler.tick(&mut registry, at(7, 0, 0), 0);

        let alerts = scheduler.tick(&mut registry, at(7, 1, 0), 0);
        assert_eq!(
            alerts,
            vec![
                Alert::AlarmPreempted { id: 1, by: 2 },
                Alert::AlarmRinging { id: 2, volume: 0.5 },
            ]
        );
        assert_eq!(scheduler.ringing(), Some(2));
        assert_eq!(registry.get(1).unwrap().state(), AlarmState::Scheduled);
        assert_eq!(first.playing(), 0);
        assert_eq!(first.latest().unwrap().position, std::time::Duration::ZERO);
    }

    #[test]
    fn preempted_alarm_can_be_removed_instead() {
        let mut registry = registry_with(&[(7, 0), (7, 1)]);
        let mut scheduler = Scheduler::new(VolumeCurve::default(), PreemptPolicy::Remove);
        scheduler.tick(&mut registry, at(7, 0, 0), 0);
        scheduler.tick(&mut registry, at(7, 1, 0), 0);

        assert!(registry.get(1).is_err());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn preempted_alarm_does_not_take_its_minute_back() {
        let mut registry = registry_with(&[(7, 0)]);
        let mut scheduler = Scheduler::default();
        scheduler.tick(&mut registry, at(6, 59, 0), 0);
        registry
            .add(
                AlarmBuilder::new()
                    .time(NaiveTime::from_hms_opt(6, 59, 0).unwrap())
                    .ringtone(MemoryRingtone::new("early.mp3")),
            )
            .unwrap();
        // 06:59 alarm rings, is snoozed into 07:00 where both are due
        scheduler.tick(&mut registry, at(6, 59, 30), 0);
        scheduler
            .commit_snooze(&mut registry, 2, at(7, 0, 10))
            .unwrap();
        scheduler.tick(&mut registry, at(7, 0, 0), 1);
        assert_eq!(scheduler.ringing(), Some(1));

        let alerts = scheduler.tick(&mut registry, at(7, 0, 10), 1);
        assert_eq!(alerts[0], Alert::AlarmPreempted { id: 1, by: 2 });
        for s in 11..60 {
            assert!(scheduler.tick(&mut registry, at(7, 0, s), 1).is_empty());
        }
        assert_eq!(scheduler.ringing(), Some(2));
    }

    #[test]
    fn stop_needs_a_ringing_or_snoozed_alarm() {
        let mut registry = registry_with(&[(7, 0)]);
        let mut scheduler = Scheduler::default();
        assert_eq!(
            scheduler.commit_stop(&mut registry, 1, StopPolicy::Retain),
            Err(AlarmError::NotRinging(1))
        );
        assert_eq!(
            scheduler.commit_stop(&mut registry, 9, StopPolicy::Retain),
            Err(AlarmError::UnknownAlarmId(9))
        );
    }

    #[test]
    fn retained_stopped_alarm_never_rings_again() {
        let mut registry = registry_with(&[(7, 0)]);
        let mut scheduler = Scheduler::default();
        scheduler.tick(&mut registry, at(7, 0, 0), 0);
        scheduler
            .commit_stop(&mut registry, 1, StopPolicy::Retain)
            .unwrap();

        let next_day = at(7, 0, 0) + chrono::TimeDelta::days(1);
        assert!(scheduler.tick(&mut registry, next_day, 0).is_empty());
        assert_eq!(registry.get(1).unwrap().state(), AlarmState::Stopped);
    }

    #[test]
    fn removed_ringing_alarm_is_forgotten_on_next_tick() {
        let mut registry = registry_with(&[(7, 0)]);
        let mut scheduler = Scheduler::default();
        scheduler.tick(&mut registry, at(7, 0, 0), 0);
        registry.remove(1).unwrap();
        scheduler.tick(&mut registry, at(7, 0, 1), 0);
        assert_eq!(scheduler.ringing(), None);
    }
}
