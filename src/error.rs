//! Error types for the alarm clock.
//!
//! Every error here is recovered at the boundary where it happens and
//! reported to the presentation layer; none of them stop the clock from
//! ticking.

use std::{fmt, io, path::PathBuf};

use chrono::NaiveTime;
use thiserror::Error;

use crate::{alarm::AlarmId, gate::ChallengeTicket};

/// Errors from operating on the alarm collection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlarmError {
    /// Another alarm is already set for this minute
    #[error("an alarm is already set for {}", .0.format("%H:%M"))]
    DuplicateTime(NaiveTime),

    /// The alarm is missing its time or its ringtone
    #[error("an alarm needs a {0}")]
    IncompleteAlarmSpec(MissingPart),

    /// The alarm was removed (or never existed)
    #[error("no alarm with id {0}")]
    UnknownAlarmId(AlarmId),

    /// Stop or snooze was requested for an alarm that isn't ringing
    #[error("alarm {0} is not ringing")]
    NotRinging(AlarmId),

    /// A challenge result arrived for a challenge that is no longer pending
    #[error("no challenge is pending under ticket {0}")]
    UnknownChallenge(ChallengeTicket),
}

/// The part of an alarm that was left out when setting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingPart {
    Time,
    Ringtone,
}

impl fmt::Display for MissingPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Time => write!(f, "time"),
            Self::Ringtone => write!(f, "ringtone"),
        }
    }
}

/// Errors from the audio side of a ringtone.
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// The host refused to start playback
    #[error("playback was blocked: {0}")]
    Blocked(String),

    #[error("couldn't open sound file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("couldn't decode sound file {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: rodio::decoder::DecoderError,
    },

    /// No audio output device could be opened
    #[error("no audio output: {0}")]
    Output(String),
}

/// Configuration file errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("couldn't find a config directory for this user")]
    NoProjectDirs,

    #[error("couldn't read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("couldn't parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("couldn't serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("couldn't write config file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Errors from handling a command in the alarm service.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Alarm(#[from] AlarmError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),
}

/// Result type alias for [`AlarmError`]
pub type Result<T, E = AlarmError> = std::result::Result<T, E>;
