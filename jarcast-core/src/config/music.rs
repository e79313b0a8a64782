//! Music queue hook configuration.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MusicQueueConfig {
    pub enabled: bool,
    /// JSON file the queue is persisted to.
    pub queue_file: PathBuf,
}
