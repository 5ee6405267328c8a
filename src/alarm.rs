use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AlarmError, MissingPart, PlaybackError},
    ringtone::Ringtone,
};

pub type AlarmId = u64;

/// Where an alarm is in its ring cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmState {
    Scheduled,
    Ringing,
    Snoozed,
    /// terminal, a stopped alarm has to be removed and set again to ring
    Stopped,
}

impl fmt::Display for AlarmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self {
            Self::Scheduled => "scheduled",
            Self::Ringing => "ringing",
            Self::Snoozed => "snoozed",
            Self::Stopped => "stopped",
        };
        write!(f, "{state}")
    }
}

/// drops seconds and below, alarms go off at minute granularity
#[must_use]
pub fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    time.with_second(0)
        .and_then(|time| time.with_nanosecond(0))
        .unwrap_or(time)
}

/// represents one scheduled wake up
/// contains the time that the alarm should go off at,
/// the ringtone it owns and where it is in its ring cycle
#[derive(Debug)]
pub struct Alarm<R: Ringtone> {
    id: AlarmId,
    time: NaiveTime,
    name: Option<String>,
    sound: String,
    state: AlarmState,
    snoozed_until: Option<NaiveDateTime>,
    /// the day this alarm last went off from `Scheduled`
    rang_on: Option<NaiveDate>,
    /// never played itself, each ring cycle plays a fresh copy
    ringtone: R,
    playback: Option<R>,
}

impl<R: Ringtone> Alarm<R> {
    #[must_use]
    pub const fn id(&self) -> AlarmId {
        self.id
    }

    #[must_use]
    pub const fn time(&self) -> NaiveTime {
        self.time
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn sound(&self) -> &str {
        &self.sound
    }

    #[must_use]
    pub const fn state(&self) -> AlarmState {
        self.state
    }

    /// only set while snoozed
    #[must_use]
    pub const fn snoozed_until(&self) -> Option<NaiveDateTime> {
        self.snoozed_until
    }

    #[must_use]
    pub const fn ringtone(&self) -> &R {
        &self.ringtone
    }

    /// the copy playing during the current ring cycle
    #[must_use]
    pub const fn playback(&self) -> Option<&R> {
        self.playback.as_ref()
    }

    /// should this alarm start ringing at `now`
    #[must_use]
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        match self.state {
            AlarmState::Scheduled => {
                truncate_to_minute(now.time()) == self.time && self.rang_on != Some(now.date())
            }
            AlarmState::Snoozed => self.snoozed_until.is_some_and(|until| now >= until),
            AlarmState::Ringing | AlarmState::Stopped => false,
        }
    }

    /// Enters `Ringing` and starts a looped fresh copy of the ringtone.
    ///
    /// The state changes even when playback fails, so the alarm is still
    /// shown as ringing and can be dismissed.
    pub(crate) fn ring(&mut self, now: NaiveDateTime, volume: f32) -> Result<(), PlaybackError> {
        self.release();
        if self.state == AlarmState::Scheduled {
            self.rang_on = Some(now.date());
        }
        self.state = AlarmState::Ringing;
        self.snoozed_until = None;

        let mut copy = self.ringtone.fresh_copy()?;
        copy.set_looping(true);
        copy.set_volume(volume);
        let played = copy.play();
        self.playback = Some(copy);
        played
    }

    pub(crate) fn snooze(&mut self, until: NaiveDateTime) {
        self.release();
        self.state = AlarmState::Snoozed;
        self.snoozed_until = Some(until);
    }

    pub(crate) fn stop(&mut self) {
        self.release();
        self.state = AlarmState::Stopped;
        self.snoozed_until = None;
    }

    /// back to waiting for its time, used when another alarm takes over
    pub(crate) fn reschedule(&mut self) {
        self.release();
        self.state = AlarmState::Scheduled;
        self.snoozed_until = None;
    }

    /// pauses and rewinds the current ring cycle's copy, if any
    pub(crate) fn release(&mut self) {
        if let Some(mut playback) = self.playback.take() {
            playback.pause();
            playback.rewind();
        }
    }
}

impl<R: Ringtone> Drop for Alarm<R> {
    fn drop(&mut self) {
        self.release();
    }
}

/// collects the parts of a new alarm, a time and a ringtone are required
#[derive(Debug)]
pub struct AlarmBuilder<R> {
    time: Option<NaiveTime>,
    ringtone: Option<R>,
    name: Option<String>,
    sound: Option<String>,
}

impl<R: Ringtone> Default for AlarmBuilder<R> {
    fn default() -> Self {
        Self {
            time: None,
            ringtone: None,
            name: None,
            sound: None,
        }
    }
}

impl<R: Ringtone> AlarmBuilder<R> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn time(mut self, time: NaiveTime) -> Self {
        self.time = Some(time);
        self
    }

    #[must_use]
    pub fn ringtone(mut self, ringtone: R) -> Self {
        self.ringtone = Some(ringtone);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// label shown for the ringtone, defaults to "custom"
    #[must_use]
    pub fn sound(mut self, sound: impl Into<String>) -> Self {
        self.sound = Some(sound.into());
        self
    }

    /// # Errors
    /// [`AlarmError::IncompleteAlarmSpec`] if the time or ringtone is missing
    pub(crate) fn build(self, id: AlarmId) -> Result<Alarm<R>, AlarmError> {
        let time = self
            .time
            .ok_or(AlarmError::IncompleteAlarmSpec(MissingPart::Time))?;
        let ringtone = self
            .ringtone
            .ok_or(AlarmError::IncompleteAlarmSpec(MissingPart::Ringtone))?;
        Ok(Alarm {
            id,
            time: truncate_to_minute(time),
            name: self.name.filter(|name| !name.trim().is_empty()),
            sound: self.sound.unwrap_or_else(|| "custom".to_string()),
            state: AlarmState::Scheduled,
            snoozed_until: None,
            rang_on: None,
            ringtone,
            playback: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::ringtone::MemoryRingtone;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn seven_am() -> Alarm<MemoryRingtone> {
        AlarmBuilder::new()
            .time(NaiveTime::from_hms_opt(7, 0, 42).unwrap())
            .ringtone(MemoryRingtone::new("alarm.mp3"))
            .build(1)
            .unwrap()
    }

    #[test]
    fn builder_requires_time_and_ringtone() {
        let no_time = AlarmBuilder::new()
            .ringtone(MemoryRingtone::new("alarm.mp3"))
            .build(1);
        assert_eq!(
            no_time.unwrap_err(),
            AlarmError::IncompleteAlarmSpec(MissingPart::Time)
        );

        let no_ringtone = AlarmBuilder::<MemoryRingtone>::new()
            .time(NaiveTime::from_hms_opt(7, 0, 0).unwrap())
            .build(1);
        assert_eq!(
            no_ringtone.unwrap_err(),
            AlarmError::IncompleteAlarmSpec(MissingPart::Ringtone)
        );
    }

    #[test]
    fn time_is_truncated_to_the_minute() {
        let alarm = seven_am();
        assert_eq!(alarm.time(), NaiveTime::from_hms_opt(7, 0, 0).unwrap());
        assert_eq!(alarm.sound(), "custom");
    }

    #[test]
    fn scheduled_alarm_is_due_for_its_whole_minute() {
        let alarm = seven_am();
        assert!(!alarm.is_due(at(6, 59, 59)));
        assert!(alarm.is_due(at(7, 0, 0)));
        assert!(alarm.is_due(at(7, 0, 59)));
        assert!(!alarm.is_due(at(7, 1, 0)));
    }

    #[test]
    fn scheduled_alarm_goes_off_once_a_day() {
        let mut alarm = seven_am();
        alarm.ring(at(7, 0, 0), 0.5).unwrap();
        alarm.reschedule();
        assert!(!alarm.is_due(at(7, 0, 30)));

        let tomorrow = at(7, 0, 0) + chrono::TimeDelta::days(1);
        assert!(alarm.is_due(tomorrow));
    }

    #[test]
    fn snoozed_alarm_is_due_once_snooze_runs_out() {
        let mut alarm = seven_am();
        alarm.ring(at(7, 0, 0), 0.5).unwrap();
        alarm.snooze(at(7, 0, 5));
        assert!(!alarm.is_due(at(7, 0, 4)));
        assert!(alarm.is_due(at(7, 0, 5)));
        assert!(alarm.is_due(at(7, 3, 0)));
    }

    #[test]
    fn stopped_alarm_is_never_due() {
        let mut alarm = seven_am();
        alarm.ring(at(7, 0, 0), 0.5).unwrap();
        alarm.stop();
        assert!(!alarm.is_due(at(7, 0, 1)));
        assert!(!alarm.is_due(at(7, 0, 0) + chrono::TimeDelta::days(1)));
    }

    #[test]
    fn each_ring_plays_a_fresh_copy() {
        let mut alarm = seven_am();
        let probe = alarm.ringtone().probe();
        alarm.ring(at(7, 0, 0), 0.5).unwrap();
        probe.advance(std::time::Duration::from_secs(20));
        alarm.snooze(at(7, 0, 5));
        alarm.ring(at(7, 0, 5), 0.7).unwrap();

        let copies = probe.copies();
        assert_eq!(copies.len(), 2);
        assert!(!copies[0].playing);
        assert_eq!(copies[0].position, std::time::Duration::ZERO);
        assert!(copies[1].playing && copies[1].looping);
        assert_eq!(copies[1].position, std::time::Duration::ZERO);
        assert!(!alarm.ringtone().is_playing());
    }

    #[test]
    fn blocked_playback_still_rings() {
        let mut alarm = seven_am();
        alarm.ringtone().probe().block_playback(true);
        assert!(alarm.ring(at(7, 0, 0), 0.5).is_err());
        assert_eq!(alarm.state(), AlarmState::Ringing);
        assert!(alarm.playback().is_some());
    }

    #[test]
    fn dropping_an_alarm_releases_its_audio() {
        let mut alarm = seven_am();
        let probe = alarm.ringtone().probe();
        alarm.ring(at(7, 0, 0), 0.5).unwrap();
        assert_eq!(probe.playing(), 1);
        drop(alarm);
        assert_eq!(probe.playing(), 0);
    }
}
