//! Source and network settings loaded from an optional YAML file.
//!
//! Every key has a default, so the file only needs the values that differ:
//!
//! ```yaml
//! listing_url: https://g1.globo.com/fato-ou-fake/
//! rss_url: https://g1.globo.com/rss/g1/fato-ou-fake/
//! api_url: https://api.globo.com/fato-ou-fake
//! user_agent: "Mozilla/5.0 (compatible; fato_ou_fake)"
//! timeout_secs: 20
//! max_retries: 3
//! pause_ms: { min: 1000, max: 3000 }
//! ```

use serde::Deserialize;
use std::ops::RangeInclusive;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("pause_ms.min ({min}) is greater than pause_ms.max ({max})")]
    PauseRange { min: u64, max: u64 },
}

/// Random pause between two article requests, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PauseMs {
    pub min: u64,
    pub max: u64,
}

impl PauseMs {
    pub fn range(&self) -> RangeInclusive<u64> {
        self.min..=self.max
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// First listing page of the fact-check section; page N appends `?page=N`.
    pub listing_url: String,
    /// RSS feed of the section.
    pub rss_url: String,
    /// JSON API tried before the RSS feed.
    pub api_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub max_retries: usize,
    pub pause_ms: PauseMs,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listing_url: "https://g1.globo.com/fato-ou-fake/".to_string(),
            rss_url: "https://g1.globo.com/rss/g1/fato-ou-fake/".to_string(),
            api_url: "https://api.globo.com/fato-ou-fake".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
                .to_string(),
            timeout_secs: 20,
            max_retries: 3,
            pause_ms: PauseMs { min: 1000, max: 3000 },
        }
    }
}

impl Config {
    /// Load the YAML file at `path`, or the defaults when no path is given.
    #[instrument(level = "info")]
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(Path::new(path)).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        let config = Self::from_yaml(&text).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_string(),
                source,
            },
            other => other,
        })?;
        info!(path, "Loaded configuration");
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
            path: String::new(),
            source,
        })?;
        if config.pause_ms.min > config.pause_ms.max {
            return Err(ConfigError::PauseRange {
                min: config.pause_ms.min,
                max: config.pause_ms.max,
            });
        }
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
