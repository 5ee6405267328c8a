use std::{
    collections::HashMap,
    fmt::{self, Write as _},
    ops::Not,
    path::{Path, PathBuf},
};

use chrono::NaiveTime;
use eframe::egui;
use serde::{Deserialize, Serialize};

use crate::{
    challenge::PuzzleBook, clock::Settings, error::ConfigError, scheduler::VolumeCurve,
};

pub const DEFAULT_TIME_FORMAT: &str = "%l:%M %p";

#[derive(Debug, Serialize, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Not for Theme {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

impl From<Theme> for egui::Visuals {
    fn from(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self::dark(),
            Theme::Light => Self::light(),
        }
    }
}

// plain values first, toml wants tables last
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub time_format: String,
    pub theme: Theme,
    /// name of the sound picked for new alarms
    pub default_sound: String,
    pub alarm: Settings,
    pub sounds: HashMap<String, Sound>,
    pub puzzles: PuzzleBook,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            theme: Theme::Dark,
            default_sound: Sound::default().name,
            alarm: Settings::default(),
            sounds: [Sound::default()]
                .into_iter()
                .map(|sound| (sound.name.clone(), sound))
                .collect(),
            puzzles: PuzzleBook::default(),
        }
    }
}

/// `false` if chrono can't format an alarm time with it. Date specifiers
/// parse fine but fail once there's only a time to format.
#[must_use]
pub fn is_valid_time_format(format: &str) -> bool {
    let mut out = String::new();
    write!(out, "{}", NaiveTime::MIN.format(format)).is_ok()
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// Fails if the file can't be read or isn't a valid config.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&config).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config.sanitized())
    }

    /// Like [`Self::load`] but falls back to the defaults, a broken config
    /// file shouldn't keep anyone from setting an alarm.
    #[must_use]
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::info!("no config at {}, using defaults", path.display());
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|err| {
            log::warn!("{err}, using defaults");
            Self::default()
        })
    }

    /// # Errors
    /// Fails if the config can't be serialized or written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let config = toml::to_string(self)?;
        let write_error = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(write_error)?;
        }
        std::fs::write(path, config).map_err(write_error)
    }

    /// # Errors
    /// Fails if there is no home directory to put the config in.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let mut path = directories::ProjectDirs::from("", "", "smart_alarm")
            .ok_or(ConfigError::NoProjectDirs)?
            .config_dir()
            .to_path_buf();
        path.push("config.toml");
        Ok(path)
    }

    /// # Errors
    /// Fails if there is no home directory to put the sounds in.
    pub fn sounds_path() -> Result<PathBuf, ConfigError> {
        let mut path = directories::ProjectDirs::from("", "", "smart_alarm")
            .ok_or(ConfigError::NoProjectDirs)?
            .data_dir()
            .to_path_buf();
        path.push("sounds");
        Ok(path)
    }

    fn sanitized(mut self) -> Self {
        if !is_valid_time_format(&self.time_format) {
            log::warn!(
                "invalid time format {:?}, using {DEFAULT_TIME_FORMAT:?}",
                self.time_format
            );
            self.time_format = DEFAULT_TIME_FORMAT.to_string();
        }
        if self.alarm.snooze_secs == 0 {
            log::warn!("snooze_secs must be at least 1");
            self.alarm.snooze_secs = 1;
        }
        let volume = &mut self.alarm.volume;
        if volume.base.is_finite() && volume.step.is_finite() {
            volume.base = volume.base.clamp(0.0, 1.0);
            volume.step = volume.step.max(0.0);
        } else {
            log::warn!("volume base and step must be finite numbers, using the defaults");
            *volume = VolumeCurve::default();
        }
        if self.puzzles.is_empty() {
            log::warn!("no puzzles configured, using the default ones");
            self.puzzles = PuzzleBook::default();
        }
        self
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Sound {
    pub name: String,
    pub path: PathBuf,
}

impl fmt::Display for Sound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.path.file_name() {
            Some(file) => write!(f, "{}:{}", self.name, file.to_string_lossy()),
            None => write!(f, "{}", self.name),
        }
    }
}

impl Default for Sound {
    fn default() -> Self {
        Self::alarm()
    }
}

impl Sound {
    #[must_use]
    pub const fn new(name: String, path: PathBuf) -> Self {
        Self { name, path }
    }

    /// the stock ringtone in the sounds directory
    #[must_use]
    pub fn alarm() -> Self {
        Self {
            name: "alarm".to_string(),
            path: Config::sounds_path()
                .unwrap_or_else(|_| PathBuf::from("sounds"))
                .join("alarm.mp3"),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_ref()
    }
}
