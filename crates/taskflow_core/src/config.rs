//! Core configuration.
//!
//! # Responsibility
//! - Describe tunables for cascade limits, persistence and logging.
//! - Parse TOML with per-field defaults so partial files stay valid.
//!
//! # Invariants
//! - A loaded config has passed `validate()`.

use crate::automation::engine::{
    CascadeLimits, DEFAULT_MAX_CASCADE_ACTIONS, DEFAULT_MAX_CASCADE_DEPTH,
};
use crate::logging::default_log_level;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DEFAULT_SNAPSHOT_KEY: &str = "taskflow-storage";

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreConfig {
    #[serde(default = "default_max_cascade_depth")]
    pub max_cascade_depth: u32,
    #[serde(default = "default_max_cascade_actions")]
    pub max_cascade_actions: u32,
    #[serde(default = "default_snapshot_key")]
    pub snapshot_key: String,
    #[serde(default = "default_seed_tags")]
    pub seed_default_tags: bool,
    #[serde(default)]
    pub log_level: Option<String>,
    /// Absolute log directory; callers supply a fallback when unset.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_max_cascade_depth() -> u32 {
    DEFAULT_MAX_CASCADE_DEPTH
}

fn default_max_cascade_actions() -> u32 {
    DEFAULT_MAX_CASCADE_ACTIONS
}

fn default_snapshot_key() -> String {
    DEFAULT_SNAPSHOT_KEY.to_string()
}

fn default_seed_tags() -> bool {
    true
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            max_cascade_depth: default_max_cascade_depth(),
            max_cascade_actions: default_max_cascade_actions(),
            snapshot_key: default_snapshot_key(),
            seed_default_tags: default_seed_tags(),
            log_level: None,
            log_dir: None,
        }
    }
}

impl CoreConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a TOML file. A missing file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_cascade_depth == 0 {
            return Err(ConfigError::Invalid(
                "max_cascade_depth must be at least 1".to_string(),
            ));
        }
        if self.max_cascade_actions == 0 {
            return Err(ConfigError::Invalid(
                "max_cascade_actions must be at least 1".to_string(),
            ));
        }
        if self.snapshot_key.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "snapshot_key must not be blank".to_string(),
            ));
        }
        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log_dir must be absolute, got `{}`",
                    dir.display()
                )));
            }
        }
        Ok(())
    }

    pub fn cascade_limits(&self) -> CascadeLimits {
        CascadeLimits {
            max_depth: self.max_cascade_depth,
            max_actions: self.max_cascade_actions,
        }
    }

    /// Configured log level, falling back to the build-mode default.
    pub fn effective_log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(default_log_level())
    }
}
