use crate::render::{DEFAULT_BAR_WIDTH, DEFAULT_SPACE_WIDTH};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
    #[error("Could not determine config directory")]
    NoConfigDir,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Audio sample rate in Hz, used to size the auto-gain window
    pub sample_rate: u32,

    /// Samples per analysis frame
    pub sample_size: usize,

    /// Channels produced per analysis frame
    pub channels: usize,

    /// Bar width in pixels
    pub bar_width: f32,

    /// Gap between bars in pixels
    pub space_width: f32,

    /// Surface size requested on every render
    pub width: u32,
    pub height: u32,

    /// Presentation refresh rate
    pub fps: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            sample_size: 1024,
            channels: 2,
            bar_width: DEFAULT_BAR_WIDTH,
            space_width: DEFAULT_SPACE_WIDTH,
            width: 800,
            height: 600,
            fps: 60,
        }
    }
}

impl Config {
    /// Load config from an explicit path, or from the default location
    ///
    /// A missing default file yields the defaults; a missing explicit file is
    /// an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => match config_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                Some(path) => {
                    tracing::debug!("no config file at {}, using defaults", path.display());
                    Ok(Self::default())
                }
                None => {
                    tracing::debug!("could not determine config directory, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;

        tracing::info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Write the config as TOML, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let toml = toml::to_string_pretty(self)?;
        fs::write(path, toml).map_err(io_err)?;

        tracing::info!("saved config to {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::Invalid("sample_rate must be positive".into()));
        }
        if self.sample_size == 0 {
            return Err(ConfigError::Invalid("sample_size must be positive".into()));
        }
        if self.channels == 0 {
            return Err(ConfigError::Invalid("channels must be positive".into()));
        }
        if self.fps == 0 {
            return Err(ConfigError::Invalid("fps must be positive".into()));
        }
        Ok(())
    }

    /// Analysis frames produced per second
    pub fn frame_rate(&self) -> f32 {
        self.sample_rate as f32 / self.sample_size.max(1) as f32
    }
}

/// Get the path to the config file: ~/.config/spectrum-bars/config.toml
pub fn config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "spectrum-bars").map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Directory where rendered frames are saved by default
pub fn frames_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "spectrum-bars").map(|dirs| dirs.data_local_dir().join("frames"))
}
