//! Core types and the commit log trait.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Offset of an entry within a single key's log.
pub type Offset = i64;

/// Offset assigned to the first entry of every log.
///
/// Keeps real offsets clear of small sentinel values clients send, such as
/// `0` meaning "from the start".
pub const OFFSET_BASE: Offset = 1000;

/// A single value stored in a key's log.
///
/// Serializes as a two-element array `[offset, value]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(Offset, i64)", into = "(Offset, i64)")]
pub struct Entry {
    /// Offset assigned by the store.
    pub offset: Offset,
    /// Payload supplied by the producer.
    pub value: i64,
}

impl Entry {
    #[must_use]
    pub fn new(offset: Offset, value: i64) -> Self {
        Self { offset, value }
    }
}

impl From<(Offset, i64)> for Entry {
    fn from((offset, value): (Offset, i64)) -> Self {
        Self { offset, value }
    }
}

impl From<Entry> for (Offset, i64) {
    fn from(entry: Entry) -> Self {
        (entry.offset, entry.value)
    }
}

/// Which keys a poll reads, and where each one starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollRequest {
    /// Read the listed keys, each from its own starting offset.
    Keys(HashMap<String, Offset>),
    /// Read every key from the beginning of its log.
    All,
}

impl PollRequest {
    /// Build a keyed request, or `All` when no offsets were supplied.
    #[must_use]
    pub fn from_offsets(offsets: Option<HashMap<String, Offset>>) -> Self {
        match offsets {
            Some(offsets) => Self::Keys(offsets),
            None => Self::All,
        }
    }
}

/// Entries returned by a poll, per key, ascending by offset.
pub type PollResult = HashMap<String, Vec<Entry>>;

/// Committed offset per key.
pub type CommittedOffsets = HashMap<String, Offset>;

/// Trait for appending to, polling and committing offsets on keyed logs.
///
/// Every operation is total: none of them fail. Results are owned copies,
/// so callers never hold references into live storage.
pub trait CommitLog: Send + Sync {
    /// Append a value to `key`'s log and return its offset.
    ///
    /// Logs are created on first append. The first offset of every log is
    /// [`OFFSET_BASE`], and each further append adds one.
    fn append(&self, key: &str, value: i64) -> Offset;

    /// Read entries from one consistent snapshot of the store.
    ///
    /// Requested keys without a log are absent from the result. A starting
    /// offset at or below [`OFFSET_BASE`] reads the whole log, and one past
    /// the end yields an empty sequence.
    fn poll(&self, request: &PollRequest) -> PollResult;

    /// Record committed offsets.
    ///
    /// A key's marker is written only while it is unset (absent or zero).
    /// Once set, further commits for that key are ignored.
    fn commit_offsets(&self, offsets: &CommittedOffsets);

    /// Committed offsets for `keys`, omitting keys with nothing committed.
    fn list_committed_offsets(&self, keys: &[String]) -> CommittedOffsets;

    /// Offset the next append to `key` would receive, if the key has a log.
    fn high_water_mark(&self, key: &str) -> Option<Offset>;

    /// Number of keys with a log.
    fn key_count(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_serializes_as_pair() {
        let entry = Entry::new(1001, 6);
        assert_eq!(serde_json::to_string(&entry).unwrap(), "[1001,6]");

        let parsed: Entry = serde_json::from_str("[1000,5]").unwrap();
        assert_eq!(parsed, Entry::new(1000, 5));
    }

    #[test]
    fn poll_request_without_offsets_is_all() {
        assert_eq!(PollRequest::from_offsets(None), PollRequest::All);

        let offsets = HashMap::from([("x".to_string(), 1001)]);
        assert_eq!(
            PollRequest::from_offsets(Some(offsets.clone())),
            PollRequest::Keys(offsets)
        );
    }
}
