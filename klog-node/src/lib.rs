//! Node serving the klog commit log over line-delimited JSON.
//!
//! Requests arrive one JSON message per line, are decoded at the protocol
//! boundary, and are answered from a shared [`klog_store::CommitLog`].
//!
//! # Key Types
//!
//! - [`Handler`] - Translates requests into store calls and builds replies
//! - [`Request`] / [`Response`] - Wire message bodies
//! - [`KlogConfig`] - Layered node configuration

pub mod config;
pub mod error;
pub mod handler;
pub mod node;
pub mod protocol;

// Re-exports
pub use config::{ConfigLoader, KlogConfig};
pub use error::{ConfigError, ProtocolError};
pub use handler::Handler;
pub use protocol::{Message, ReplyBody, Request, Response};
