use std::sync::Arc;

use klog_store::{CommitLog, InMemoryCommitLog, PartitionedCommitLog};
use serde::Deserialize;

/// Default number of store partitions (one lock over every key)
pub const DEFAULT_PARTITIONS: usize = 1;

/// Default capacity of the reply queue
pub const DEFAULT_REPLY_BUFFER: usize = 1024;

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawKlogConfig {
    #[serde(default)]
    pub store: RawStoreConfig,

    #[serde(default)]
    pub node: RawNodeConfig,
}

/// Store config as stored in TOML
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawStoreConfig {
    pub partitions: Option<usize>,
}

/// Node config as stored in TOML
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawNodeConfig {
    pub reply_buffer: Option<usize>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KlogConfig {
    pub store: StoreConfig,
    pub node: NodeConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Number of partitions keys are hashed over; 1 uses a single lock
    pub partitions: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            partitions: DEFAULT_PARTITIONS,
        }
    }
}

impl StoreConfig {
    /// Build the commit log this config describes.
    pub fn open(&self) -> Arc<dyn CommitLog> {
        if self.partitions <= 1 {
            Arc::new(InMemoryCommitLog::new())
        } else {
            Arc::new(PartitionedCommitLog::new(self.partitions))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    /// Replies queued for the writer before request handling waits
    pub reply_buffer: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            reply_buffer: DEFAULT_REPLY_BUFFER,
        }
    }
}
