//! Configuration types for the player.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::playback::PlaybackOptions;
use crate::protocol::{DecodeLimits, FloatOrder};

/// Top-level player configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Person sprite resource.
    pub sprite_path: PathBuf,
    /// Pixels per simulation unit the sprite artwork was drawn at.
    pub sprite_scale: f64,
    /// Byte order of doubles in the incoming stream.
    pub float_order: FloatOrder,
    /// Largest `Locations`/`DensityMap` block accepted.
    pub max_elements_per_block: u32,
    /// Dismiss-signal poll interval while the summary is shown.
    pub summary_poll_interval_ms: u64,
    /// Pace frames to simulation time. Disable to play as fast as decoded.
    pub pace: bool,
    /// Title of the player window.
    pub window_title: String,
    /// Headless renderer only: polls until the summary counts as dismissed.
    pub headless_dismiss_after_polls: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            sprite_path: PathBuf::from("person.svg"),
            sprite_scale: 1.0,
            float_order: FloatOrder::Native,
            max_elements_per_block: DecodeLimits::default().max_elements,
            summary_poll_interval_ms: 10,
            pace: true,
            window_title: "Crowd Simulator: Animator".to_string(),
            headless_dismiss_after_polls: 1,
        }
    }
}

impl PlayerConfig {
    /// Read and validate a JSON configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.sprite_scale.is_finite() || self.sprite_scale <= 0.0 {
            return Err(ConfigError::InvalidSpriteScale(self.sprite_scale));
        }
        if self.max_elements_per_block == 0 {
            return Err(ConfigError::InvalidBlockLimit);
        }
        if self.summary_poll_interval_ms == 0 {
            return Err(ConfigError::InvalidPollInterval);
        }
        if self.headless_dismiss_after_polls == 0 {
            return Err(ConfigError::InvalidDismissPolls);
        }
        Ok(())
    }

    pub fn decode_limits(&self) -> DecodeLimits {
        DecodeLimits {
            max_elements: self.max_elements_per_block,
        }
    }

    pub fn playback_options(&self) -> PlaybackOptions {
        PlaybackOptions {
            pace: self.pace,
            poll_interval: Duration::from_millis(self.summary_poll_interval_ms),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Sprite scale must be positive, got {0}")]
    InvalidSpriteScale(f64),
    #[error("Block element limit must be non-zero")]
    InvalidBlockLimit,
    #[error("Summary poll interval must be non-zero")]
    InvalidPollInterval,
    #[error("Dismiss poll count must be non-zero")]
    InvalidDismissPolls,
    #[error("{0}")]
    Usage(String),
}
