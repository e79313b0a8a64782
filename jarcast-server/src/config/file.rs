//! TOML file configuration structures.
//!
//! These structs directly map to the `jarcast.toml` file format.

use jarcast_core::config::{MediaConfig as CoreMediaConfig, PollerConfig};
use jarcast_core::processors::DonationFeed;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use url::Url;

/// Token value shipped in the example config.
pub const PLACEHOLDER_TOKEN: &str = "YOUR_MONOBANK_TOKEN";
/// Jar id value shipped in the example config.
pub const PLACEHOLDER_JAR_ID: &str = "YOUR_JAR_ID";

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub music: MusicConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "127.0.0.1:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, 8080))
}

/// Monobank section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Personal API token. `MONOBANK_TOKEN` takes precedence.
    #[serde(default)]
    pub token: String,
    /// Jar to watch. Empty means "ask on startup".
    #[serde(default)]
    pub jar_id: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_lookback_secs")]
    pub lookback_secs: u64,
    /// Overrides the Monobank API root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<Url>,
}

fn default_poll_interval_secs() -> u64 {
    PollerConfig::DEFAULT_POLL_INTERVAL.as_secs()
}

fn default_lookback_secs() -> u64 {
    PollerConfig::DEFAULT_LOOKBACK.whole_seconds().unsigned_abs()
}

/// Media section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    #[serde(default = "default_media_path")]
    pub path: PathBuf,
    #[serde(default = "default_display_duration_ms")]
    pub display_duration_ms: u64,
    #[serde(default = "default_display_buffer_ms")]
    pub display_buffer_ms: u64,
    #[serde(default)]
    pub rules: Vec<MediaRuleConfig>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            path: default_media_path(),
            display_duration_ms: default_display_duration_ms(),
            display_buffer_ms: default_display_buffer_ms(),
            rules: Vec::new(),
        }
    }
}

fn default_media_path() -> PathBuf {
    PathBuf::from("./media")
}

fn default_display_duration_ms() -> u64 {
    CoreMediaConfig::DEFAULT_DISPLAY_DURATION.as_millis() as u64
}

fn default_display_buffer_ms() -> u64 {
    CoreMediaConfig::DEFAULT_DISPLAY_BUFFER.as_millis() as u64
}

/// One `[[media.rules]]` entry. Bounds are inclusive, in minor units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaRuleConfig {
    #[serde(default)]
    pub min: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub sounds: Vec<String>,
}

/// Donation feed section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_feed_capacity")]
    pub capacity: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            capacity: default_feed_capacity(),
        }
    }
}

fn default_feed_capacity() -> usize {
    DonationFeed::DEFAULT_CAPACITY
}

/// Music request queue section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_queue_file")]
    pub queue_file: PathBuf,
}

impl Default for MusicConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            queue_file: default_queue_file(),
        }
    }
}

fn default_queue_file() -> PathBuf {
    PathBuf::from("./youtube_queue.json")
}

impl LedgerConfig {
    /// Whether a jar has been chosen.
    pub fn has_jar_id(&self) -> bool {
        let jar_id = self.jar_id.trim();
        !jar_id.is_empty() && jar_id != PLACEHOLDER_JAR_ID
    }
}
