//! Configuration module for jarcast-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables, and persisting the chosen jar id.

pub mod file;

use crate::config::file::{FileConfig, MediaRuleConfig, PLACEHOLDER_TOKEN};
use jarcast_core::config::{
    FeedConfig, LedgerConfig, MediaConfig, MediaRule, MusicQueueConfig, PollerConfig,
};
use jarcast_core::ledger::MonobankClient;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Longest statement window Monobank serves: 31 days and 1 hour.
pub const MAX_LOOKBACK_SECS: u64 = 31 * 24 * 60 * 60 + 60 * 60;

/// Validated configuration, converted to core runtime types.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub listen: SocketAddr,
    pub ledger: LedgerConfig,
    /// `None` when no jar has been chosen yet.
    pub jar_id: Option<String>,
    pub poll_interval: Duration,
    pub lookback: time::Duration,
    pub media: MediaConfig,
    pub feed: FeedConfig,
    pub music: MusicQueueConfig,
}

impl LoadedConfig {
    /// Poller settings for watching `account`.
    pub fn poller_config(&self, account: impl Into<String>) -> PollerConfig {
        PollerConfig {
            account: account.into(),
            poll_interval: self.poll_interval,
            lookback: self.lookback,
        }
    }
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    listen_override: Option<SocketAddr>,
    token_override: Option<String>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
            token_override: None,
        }
    }

    /// Use `token` instead of the file's `ledger.token` when set.
    pub fn with_token_override(mut self, token: Option<String>) -> Self {
        self.token_override = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI and environment overrides
    /// 3. Validate the configuration
    /// 4. Build the loaded configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let mut file_config = self.read_file()?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }
        if let Some(token) = &self.token_override {
            file_config.ledger.token = token.clone();
        }

        self.validate(&file_config)?;
        self.build_loaded_config(file_config)
    }

    /// Write `jar_id` into the config file, leaving everything else as it
    /// is on disk (overrides are not persisted).
    pub fn persist_jar_id(&self, jar_id: &str) -> Result<(), ConfigError> {
        let mut file_config = self.read_file()?;
        file_config.ledger.jar_id = jar_id.to_owned();
        self.rewrite_config(&file_config)?;
        tracing::info!(path = %self.config_path.display(), "Saved jar id to config file");
        Ok(())
    }

    fn read_file(&self) -> Result<FileConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        Ok(toml::from_str(&config_content)?)
    }

    fn validate(&self, config: &FileConfig) -> Result<(), ConfigError> {
        let token = config.ledger.token.trim();
        if token.is_empty() || token == PLACEHOLDER_TOKEN {
            return Err(ConfigError::ValidationError(
                "ledger.token is not configured (get one at https://api.monobank.ua/)".into(),
            ));
        }

        if config.ledger.poll_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "ledger.poll_interval_secs must be greater than zero".into(),
            ));
        }

        if config.ledger.lookback_secs > MAX_LOOKBACK_SECS {
            return Err(ConfigError::ValidationError(format!(
                "ledger.lookback_secs must be at most {MAX_LOOKBACK_SECS} (31 days and 1 hour)"
            )));
        }

        for (index, rule) in config.media.rules.iter().enumerate() {
            let Some(max) = rule.max else {
                continue;
            };
            if rule.min > max {
                return Err(ConfigError::ValidationError(format!(
                    "media rule #{} has min {} greater than max {}",
                    index + 1,
                    rule.min,
                    max
                )));
            }
        }
        Ok(())
    }

    fn rewrite_config(&self, config: &FileConfig) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(config)?;

        // Write atomically: write to temp file, then rename
        let temp_path = self.config_path.with_extension("toml.tmp");
        std::fs::write(&temp_path, toml_string)?;
        std::fs::rename(&temp_path, &self.config_path)?;

        Ok(())
    }

    fn build_loaded_config(&self, file_config: FileConfig) -> Result<LoadedConfig, ConfigError> {
        let base_url = match file_config.ledger.base_url.clone() {
            Some(url) => url,
            None => Url::parse(MonobankClient::DEFAULT_BASE_URL)?,
        };
        let jar_id = file_config
            .ledger
            .has_jar_id()
            .then(|| file_config.ledger.jar_id.trim().to_owned());

        Ok(LoadedConfig {
            listen: file_config.server.listen,
            ledger: LedgerConfig {
                token: file_config.ledger.token.trim().to_owned(),
                base_url,
            },
            jar_id,
            poll_interval: Duration::from_secs(file_config.ledger.poll_interval_secs),
            lookback: time::Duration::seconds(
                file_config.ledger.lookback_secs.min(MAX_LOOKBACK_SECS) as i64,
            ),
            media: MediaConfig {
                root: file_config.media.path,
                display_duration: Duration::from_millis(file_config.media.display_duration_ms),
                display_buffer: Duration::from_millis(file_config.media.display_buffer_ms),
                rules: file_config
                    .media
                    .rules
                    .into_iter()
                    .map(convert_rule)
                    .collect(),
            },
            feed: FeedConfig {
                capacity: file_config.feed.capacity,
            },
            music: MusicQueueConfig {
                enabled: file_config.music.enabled,
                queue_file: file_config.music.queue_file,
            },
        })
    }
}

fn convert_rule(rule: MediaRuleConfig) -> MediaRule {
    MediaRule::new(rule.min, rule.max)
        .with_images(rule.images)
        .with_sounds(rule.sounds)
}
