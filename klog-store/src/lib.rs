//! In-memory commit log for klog.
//!
//! This crate provides the log store behind the klog node: one append-only
//! log per key, range polls from an arbitrary starting offset, and a
//! committed-offset marker per key.
//!
//! # Key Types
//!
//! - [`CommitLog`] - Trait for appending, polling and committing offsets
//! - [`InMemoryCommitLog`] - Single-lock implementation
//! - [`PartitionedCommitLog`] - Implementation sharding keys over partitions
//! - [`Entry`] - An `(offset, value)` pair stored in a log

pub mod memory;
pub mod partitioned_memory;
mod state;
pub mod traits;

// Re-exports
pub use memory::InMemoryCommitLog;
pub use partitioned_memory::PartitionedCommitLog;
pub use traits::{
    CommitLog, CommittedOffsets, Entry, OFFSET_BASE, Offset, PollRequest, PollResult,
};
