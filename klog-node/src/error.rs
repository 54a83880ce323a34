//! Error types for klog-node

use std::path::PathBuf;

use thiserror::Error;

/// Error code for request types the node does not handle.
pub const NOT_SUPPORTED: u32 = 10;

/// Error code for requests whose body could not be decoded.
pub const MALFORMED_REQUEST: u32 = 12;

/// Errors raised while decoding a request body
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Unsupported request type: {0}")]
    Unsupported(String),

    #[error("Malformed request: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ProtocolError {
    /// Wire error code reported back to the sender.
    #[must_use]
    pub fn code(&self) -> u32 {
        match self {
            Self::Unsupported(_) => NOT_SUPPORTED,
            Self::Malformed(_) => MALFORMED_REQUEST,
        }
    }
}

/// Errors loading node configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}
