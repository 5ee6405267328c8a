use std::fmt;

use chrono::NaiveDateTime;

use crate::{
    alarm::AlarmId,
    gate::{ChallengeRequest, ChallengeTicket, DismissMode},
};

/// Something the presentation layer should know happened.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    AlarmAdded(AlarmId),
    AlarmRemoved(AlarmId),
    AlarmRinging { id: AlarmId, volume: f32 },
    /// the alarm is ringing but its audio couldn't start
    PlaybackBlocked { id: AlarmId, reason: String },
    /// `id` was silenced because `by` started ringing
    AlarmPreempted { id: AlarmId, by: AlarmId },
    AlarmSnoozed { id: AlarmId, until: NaiveDateTime },
    AlarmStopped(AlarmId),
    ChallengeIssued(ChallengeRequest),
    ChallengeCancelled(ChallengeTicket),
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlarmAdded(id) => write!(f, "alarm {id} set"),
            Self::AlarmRemoved(id) => write!(f, "alarm {id} removed"),
            Self::AlarmRinging { id, volume } => {
                write!(f, "alarm {id} is ringing at {:.0}%", volume * 100.0)
            }
            Self::PlaybackBlocked { id, reason } => {
                write!(f, "alarm {id} is ringing but can't play sound: {reason}")
            }
            Self::AlarmPreempted { id, by } => write!(f, "alarm {id} was silenced by alarm {by}"),
            Self::AlarmSnoozed { id, until } => {
                write!(f, "alarm {id} snoozed until {}", until.format("%H:%M:%S"))
            }
            Self::AlarmStopped(id) => write!(f, "alarm {id} stopped, good morning"),
            Self::ChallengeIssued(request) => {
                let action = match request.mode {
                    DismissMode::Stop => "stop",
                    DismissMode::Snooze => "snooze",
                };
                write!(f, "solve a challenge to {action} alarm {}", request.alarm)
            }
            Self::ChallengeCancelled(ticket) => write!(f, "challenge {ticket} cancelled"),
        }
    }
}
