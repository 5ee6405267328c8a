//! Ringtones played through the default audio output with rodio.

use std::{
    fmt,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    time::Duration,
};

use rodio::{mixer::Mixer, Decoder, OutputStream, OutputStreamBuilder, Sink, Source};

use super::{Ringtone, RingtoneProvider};
use crate::error::PlaybackError;

fn decode(path: &Path) -> Result<Decoder<BufReader<File>>, PlaybackError> {
    let file = File::open(path).map_err(|source| PlaybackError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Decoder::new(BufReader::new(file)).map_err(|source| PlaybackError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Owns the output stream; it has to outlive every ringtone it hands out.
pub struct SpeakerProvider {
    stream: OutputStream,
}

impl fmt::Debug for SpeakerProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeakerProvider").finish_non_exhaustive()
    }
}

impl SpeakerProvider {
    /// # Errors
    /// Fails when there is no usable output device.
    pub fn open_default() -> Result<Self, PlaybackError> {
        let stream = OutputStreamBuilder::open_default_stream()
            .map_err(|err| PlaybackError::Output(err.to_string()))?;
        Ok(Self { stream })
    }
}

impl RingtoneProvider for SpeakerProvider {
    type Ringtone = SpeakerRingtone;

    fn open(&self, path: &Path) -> Result<SpeakerRingtone, PlaybackError> {
        // decode once so a bad file is rejected when the alarm is set, not when it rings
        decode(path)?;
        Ok(SpeakerRingtone {
            path: path.to_path_buf(),
            mixer: self.stream.mixer().clone(),
            sink: None,
            volume: 1.0,
            looping: false,
        })
    }
}

/// a sound file and, while it plays, the sink playing it
pub struct SpeakerRingtone {
    path: PathBuf,
    mixer: Mixer,
    sink: Option<Sink>,
    volume: f32,
    looping: bool,
}

impl fmt::Debug for SpeakerRingtone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeakerRingtone")
            .field("path", &self.path)
            .field("volume", &self.volume)
            .field("looping", &self.looping)
            .field("active", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

impl Ringtone for SpeakerRingtone {
    fn play(&mut self) -> Result<(), PlaybackError> {
        if let Some(sink) = &self.sink {
            sink.play();
            return Ok(());
        }
        let input = decode(&self.path)?;
        let sink = Sink::connect_new(&self.mixer);
        sink.set_volume(self.volume);
        if self.looping {
            sink.append(input.repeat_infinite());
        } else {
            sink.append(input);
        }
        sink.play();
        self.sink = Some(sink);
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    fn rewind(&mut self) {
        // the next play decodes from the start of the file
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(sink) = &self.sink {
            sink.set_volume(self.volume);
        }
    }

    fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    fn fresh_copy(&self) -> Result<Self, PlaybackError> {
        Ok(Self {
            path: self.path.clone(),
            mixer: self.mixer.clone(),
            sink: None,
            volume: 1.0,
            looping: false,
        })
    }

    fn is_playing(&self) -> bool {
        self.sink
            .as_ref()
            .is_some_and(|sink| !sink.is_paused() && !sink.empty())
    }

    fn position(&self) -> Duration {
        self.sink.as_ref().map_or(Duration::ZERO, Sink::get_pos)
    }
}
