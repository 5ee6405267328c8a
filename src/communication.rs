//! Messages between the presentation layer, the clock poller and the alarm
//! service.

use std::path::PathBuf;

use chrono::{NaiveDateTime, NaiveTime};

use crate::{
    alarm::{Alarm, AlarmId, AlarmState},
    alert::Alert,
    clock::Settings,
    gate::{ChallengeRequest, ChallengeTicket},
    ringtone::Ringtone,
    stats::Statistics,
};

/// Everything the service can be asked to do, handled strictly in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// from the clock poller
    Tick(NaiveDateTime),
    SetAlarm {
        time: Option<NaiveTime>,
        sound: Option<PathBuf>,
        name: Option<String>,
    },
    RemoveAlarm(AlarmId),
    RequestStop(AlarmId),
    RequestSnooze(AlarmId),
    ChallengeWon(ChallengeTicket),
    CancelChallenge(ChallengeTicket),
    Configure(Settings),
    Shutdown,
}

/// What the service tells the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    Snapshot(Snapshot),
    Alert(Alert),
    /// a command was refused, the reason is meant for the user
    Rejected(String),
}

/// A display copy of one alarm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmView {
    pub id: AlarmId,
    pub time: NaiveTime,
    pub name: Option<String>,
    pub sound: String,
    pub state: AlarmState,
    pub snoozed_until: Option<NaiveDateTime>,
}

impl<R: Ringtone> From<&Alarm<R>> for AlarmView {
    fn from(alarm: &Alarm<R>) -> Self {
        Self {
            id: alarm.id(),
            time: alarm.time(),
            name: alarm.name().map(str::to_string),
            sound: alarm.sound().to_string(),
            state: alarm.state(),
            snoozed_until: alarm.snoozed_until(),
        }
    }
}

/// The state of the clock as of the last handled command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub alarms: Vec<AlarmView>,
    pub ringing: Option<AlarmId>,
    pub stats: Statistics,
    pub challenges: Vec<ChallengeRequest>,
}

impl Snapshot {
    #[must_use]
    pub fn alarm(&self, id: AlarmId) -> Option<&AlarmView> {
        self.alarms.iter().find(|alarm| alarm.id == id)
    }
}
