//! A ringtone backend that keeps everything in memory.
//!
//! Used when no audio device is available and in tests, where a
//! [`RingtoneProbe`] shows what happened to every copy of a ringtone.

use std::{
    path::Path,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use super::{Ringtone, RingtoneProvider};
use crate::error::PlaybackError;

/// What a single copy of a ringtone is doing.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub playing: bool,
    pub position: Duration,
    pub volume: f32,
    pub looping: bool,
    /// how many times `play` succeeded
    pub plays: u32,
}

impl Default for Track {
    fn default() -> Self {
        Self {
            playing: false,
            position: Duration::ZERO,
            volume: 1.0,
            looping: false,
            plays: 0,
        }
    }
}

#[derive(Debug, Default)]
struct Shared {
    copies: Vec<Arc<Mutex<Track>>>,
    blocked: bool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
pub struct MemoryRingtone {
    source: String,
    track: Arc<Mutex<Track>>,
    shared: Arc<Mutex<Shared>>,
}

impl MemoryRingtone {
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            track: Arc::default(),
            shared: Arc::default(),
        }
    }

    /// A view of every copy made from this ringtone (and from its copies).
    #[must_use]
    pub fn probe(&self) -> RingtoneProbe {
        RingtoneProbe {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Ringtone for MemoryRingtone {
    fn play(&mut self) -> Result<(), PlaybackError> {
        if lock(&self.shared).blocked {
            return Err(PlaybackError::Blocked(format!(
                "{} is not allowed to play",
                self.source
            )));
        }
        let mut track = lock(&self.track);
        track.playing = true;
        track.plays += 1;
        Ok(())
    }

    fn pause(&mut self) {
        lock(&self.track).playing = false;
    }

    fn rewind(&mut self) {
        lock(&self.track).position = Duration::ZERO;
    }

    fn set_volume(&mut self, volume: f32) {
        lock(&self.track).volume = volume.clamp(0.0, 1.0);
    }

    fn set_looping(&mut self, looping: bool) {
        lock(&self.track).looping = looping;
    }

    fn fresh_copy(&self) -> Result<Self, PlaybackError> {
        let track = Arc::new(Mutex::new(Track::default()));
        lock(&self.shared).copies.push(Arc::clone(&track));
        Ok(Self {
            source: self.source.clone(),
            track,
            shared: Arc::clone(&self.shared),
        })
    }

    fn is_playing(&self) -> bool {
        lock(&self.track).playing
    }

    fn position(&self) -> Duration {
        lock(&self.track).position
    }
}

/// Read access to the copies of a [`MemoryRingtone`], plus knobs to
/// simulate the host environment.
#[derive(Debug, Clone)]
pub struct RingtoneProbe {
    shared: Arc<Mutex<Shared>>,
}

impl RingtoneProbe {
    #[must_use]
    pub fn copies(&self) -> Vec<Track> {
        lock(&self.shared)
            .copies
            .iter()
            .map(|track| lock(track).clone())
            .collect()
    }

    #[must_use]
    pub fn latest(&self) -> Option<Track> {
        lock(&self.shared).copies.last().map(|track| lock(track).clone())
    }

    /// Number of copies currently playing.
    #[must_use]
    pub fn playing(&self) -> usize {
        lock(&self.shared)
            .copies
            .iter()
            .filter(|track| lock(track).playing)
            .count()
    }

    /// Makes every following `play` fail, like a browser's autoplay policy.
    pub fn block_playback(&self, blocked: bool) {
        lock(&self.shared).blocked = blocked;
    }

    /// Moves every playing copy forward by `by`.
    pub fn advance(&self, by: Duration) {
        for track in &lock(&self.shared).copies {
            let mut track = lock(track);
            if track.playing {
                track.position += by;
            }
        }
    }
}

/// Opens every path as a [`MemoryRingtone`] without touching the file.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    opened: Arc<Mutex<Vec<RingtoneProbe>>>,
}

impl MemoryProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Probes for every ringtone opened so far, in order.
    #[must_use]
    pub fn probes(&self) -> Vec<RingtoneProbe> {
        lock(&self.opened).clone()
    }
}

impl RingtoneProvider for MemoryProvider {
    type Ringtone = MemoryRingtone;

    fn open(&self, path: &Path) -> Result<MemoryRingtone, PlaybackError> {
        let ringtone = MemoryRingtone::new(path.display().to_string());
        lock(&self.opened).push(ringtone.probe());
        Ok(ringtone)
    }
}
