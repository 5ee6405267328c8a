#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![deny(clippy::use_self, rust_2018_idioms)]
#![allow(clippy::multiple_crate_versions, clippy::module_name_repetitions)]

//! An alarm clock that gets louder every time it is snoozed, and can make
//! you solve a puzzle before it lets you go back to sleep.

pub mod alarm;
pub mod alert;
pub mod challenge;
pub mod clock;
pub mod communication;
pub mod config;
pub mod error;
pub mod gate;
pub mod poller;
pub mod registry;
pub mod ringtone;
pub mod scheduler;
pub mod service;
pub mod stats;

/// egui front end
pub mod editor;
pub mod gui;
pub mod widgets;

pub use alarm::{Alarm, AlarmBuilder, AlarmId, AlarmState};
pub use alert::Alert;
pub use clock::{AlarmClock, Settings};
pub use error::{AlarmError, ConfigError, PlaybackError, ServiceError};
pub use gate::{ChallengeRequest, ChallengeTicket, DismissMode, Dismissal};
pub use ringtone::{Ringtone, RingtoneProvider};
pub use service::{Service, ServiceHandle};
pub use stats::Statistics;
