//! The ordered collection of alarms.

use chrono::NaiveTime;

use crate::{
    alarm::{Alarm, AlarmBuilder, AlarmId},
    error::{AlarmError, Result},
    ringtone::Ringtone,
};

/// Alarms ordered by time of day, at most one per minute.
#[derive(Debug)]
pub struct AlarmRegistry<R: Ringtone> {
    alarms: Vec<Alarm<R>>,
    /// ids are handed out once and never reused
    last_id: AlarmId,
}

impl<R: Ringtone> Default for AlarmRegistry<R> {
    fn default() -> Self {
        Self {
            alarms: Vec::new(),
            last_id: 0,
        }
    }
}

impl<R: Ringtone> AlarmRegistry<R> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// [`AlarmError::IncompleteAlarmSpec`] when the builder lacks a time or
    /// ringtone, [`AlarmError::DuplicateTime`] when that minute is taken.
    /// The registry is unchanged on error.
    pub fn add(&mut self, builder: AlarmBuilder<R>) -> Result<AlarmId> {
        let alarm = builder.build(self.last_id + 1)?;
        if self.contains_time(alarm.time()) {
            return Err(AlarmError::DuplicateTime(alarm.time()));
        }
        self.last_id += 1;
        let at = self.alarms.partition_point(|other| other.time() < alarm.time());
        self.alarms.insert(at, alarm);
        Ok(self.last_id)
    }

    /// Removes an alarm, its audio is paused and rewound first.
    ///
    /// # Errors
    /// [`AlarmError::UnknownAlarmId`] if there is no such alarm
    pub fn remove(&mut self, id: AlarmId) -> Result<Alarm<R>> {
        let index = self
            .alarms
            .iter()
            .position(|alarm| alarm.id() == id)
            .ok_or(AlarmError::UnknownAlarmId(id))?;
        let mut alarm = self.alarms.remove(index);
        alarm.release();
        Ok(alarm)
    }

    /// # Errors
    /// [`AlarmError::UnknownAlarmId`] if there is no such alarm
    pub fn get(&self, id: AlarmId) -> Result<&Alarm<R>> {
        self.alarms
            .iter()
            .find(|alarm| alarm.id() == id)
            .ok_or(AlarmError::UnknownAlarmId(id))
    }

    /// # Errors
    /// [`AlarmError::UnknownAlarmId`] if there is no such alarm
    pub fn get_mut(&mut self, id: AlarmId) -> Result<&mut Alarm<R>> {
        self.alarms
            .iter_mut()
            .find(|alarm| alarm.id() == id)
            .ok_or(AlarmError::UnknownAlarmId(id))
    }

    #[must_use]
    pub fn contains_time(&self, time: NaiveTime) -> bool {
        self.alarms.iter().any(|alarm| alarm.time() == time)
    }

    /// in order of time of day
    pub fn iter(&self) -> impl Iterator<Item = &Alarm<R>> {
        self.alarms.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.alarms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alarms.is_empty()
    }

    /// silences every alarm without changing its state
    pub(crate) fn release_all(&mut self) {
        self.alarms.iter_mut().for_each(Alarm::release);
    }

    pub(crate) fn clear(&mut self) {
        self.release_all();
        self.alarms.clear();
    }
}
