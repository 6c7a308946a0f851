//! Session configuration.
//!
//! # Responsibility
//! - Provide defaults matching the original annotation tool.
//! - Load overrides from TOML and reject values the session cannot honor.

use crate::model::palette::{Color, DEFAULT_PALETTE, MIN_PALETTE_SIZE};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SETTLE_DELAY_MS: u64 = 100;
pub const DEFAULT_MIN_REGION_LENGTH: f64 = 0.1;
pub const DEFAULT_NUMBER_STEP: f64 = 0.01;
pub const DEFAULT_EXPORT_FILE_NAME: &str = "regions.json";

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

/// Tunables for one annotation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Region colors, assigned cyclically in creation order.
    pub palette: Vec<String>,
    /// Quiet period after a drag release before labeling opens.
    pub settle_delay_ms: u64,
    /// Shortest region a drag may produce, in seconds.
    pub min_region_length: f64,
    /// Step hint for the start/end number inputs.
    pub number_step: f64,
    pub export_file_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            palette: DEFAULT_PALETTE.iter().map(|value| value.to_string()).collect(),
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            min_region_length: DEFAULT_MIN_REGION_LENGTH,
            number_step: DEFAULT_NUMBER_STEP,
            export_file_name: DEFAULT_EXPORT_FILE_NAME.to_string(),
        }
    }
}

impl SessionConfig {
    /// Parses and validates a TOML document. Missing keys keep defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.palette.len() < MIN_PALETTE_SIZE {
            return Err(ConfigError::Invalid(format!(
                "palette needs at least {MIN_PALETTE_SIZE} colors, got {}",
                self.palette.len()
            )));
        }
        if self.palette.iter().any(|value| value.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "palette entries must not be empty".to_string(),
            ));
        }
        if self.settle_delay_ms == 0 {
            return Err(ConfigError::Invalid(
                "settle_delay_ms must be positive".to_string(),
            ));
        }
        if !self.min_region_length.is_finite() || self.min_region_length < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "min_region_length must be a non-negative number, got {}",
                self.min_region_length
            )));
        }
        if !self.number_step.is_finite() || self.number_step <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "number_step must be positive, got {}",
                self.number_step
            )));
        }
        if self.export_file_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "export_file_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn palette_colors(&self) -> Vec<Color> {
        self.palette.iter().map(Color::new).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, SessionConfig, DEFAULT_EXPORT_FILE_NAME};
    use std::time::Duration;

    #[test]
    fn defaults_are_valid() {
        let config = SessionConfig::default();
        config.validate().expect("defaults should validate");
        assert_eq!(config.settle_delay(), Duration::from_millis(100));
        assert_eq!(config.export_file_name, DEFAULT_EXPORT_FILE_NAME);
        assert_eq!(config.palette_colors().len(), 8);
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let config = SessionConfig::from_toml_str("settle_delay_ms = 250\n")
            .expect("partial config should parse");
        assert_eq!(config.settle_delay_ms, 250);
        assert_eq!(config.min_region_length, 0.1);
    }

    #[test]
    fn short_palette_is_rejected() {
        let err = SessionConfig::from_toml_str("palette = [\"red\", \"blue\"]\n")
            .expect_err("two colors are not enough");
        assert!(matches!(err, ConfigError::Invalid(message) if message.contains("palette")));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = SessionConfig::from_toml_str("settle_delay_ms = \"soon\"")
            .expect_err("wrong type must fail");
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
