//! Playable ringtone handles.
//!
//! An alarm owns one [`Ringtone`] as its source and never plays it directly:
//! every ring cycle plays a [`Ringtone::fresh_copy`] so a new cycle never
//! inherits a stale position or volume from the last one.

use std::{fmt, path::Path, time::Duration};

use crate::error::PlaybackError;

pub mod memory;
pub mod speaker;

pub use memory::{MemoryProvider, MemoryRingtone, RingtoneProbe, Track};
pub use speaker::{SpeakerProvider, SpeakerRingtone};

/// A playable audio handle.
pub trait Ringtone: fmt::Debug + Sized {
    /// Starts (or resumes) playback.
    ///
    /// # Errors
    /// Fails when the host refuses playback or the source can't be read.
    /// Callers log this and carry on; the alarm still counts as ringing.
    fn play(&mut self) -> Result<(), PlaybackError>;

    fn pause(&mut self);

    /// Moves playback back to the start.
    fn rewind(&mut self);

    /// `volume` is clamped to `0.0..=1.0`.
    fn set_volume(&mut self, volume: f32);

    fn set_looping(&mut self, looping: bool);

    /// Returns a new, independent handle to the same source.
    ///
    /// # Errors
    /// Fails if the backend can't create another handle.
    fn fresh_copy(&self) -> Result<Self, PlaybackError>;

    fn is_playing(&self) -> bool;

    fn position(&self) -> Duration;
}

/// Turns a sound file reference into a [`Ringtone`].
pub trait RingtoneProvider {
    type Ringtone: Ringtone;

    /// # Errors
    /// Fails if the source can't be opened as audio.
    fn open(&self, path: &Path) -> Result<Self::Ringtone, PlaybackError>;
}
