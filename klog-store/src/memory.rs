//! Single-lock CommitLog implementation.
//!
//! All keys share one reader/writer lock. Writers serialize across keys,
//! and any read sees the whole store at a single instant.

use parking_lot::RwLock;

use crate::state::LogState;
use crate::traits::{CommitLog, CommittedOffsets, Offset, PollRequest, PollResult};

/// In-memory implementation of CommitLog guarded by one lock.
#[derive(Debug, Default)]
pub struct InMemoryCommitLog {
    state: RwLock<LogState>,
}

impl InMemoryCommitLog {
    /// Create an empty commit log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CommitLog for InMemoryCommitLog {
    fn append(&self, key: &str, value: i64) -> Offset {
        self.state.write().append(key, value)
    }

    fn poll(&self, request: &PollRequest) -> PollResult {
        let state = self.state.read();
        let mut result = PollResult::new();

        match request {
            PollRequest::Keys(offsets) => {
                for (key, &from) in offsets {
                    if let Some(entries) = state.read_from(key, from) {
                        result.insert(key.clone(), entries);
                    }
                }
            }
            PollRequest::All => state.read_all_into(&mut result),
        }

        result
    }

    fn commit_offsets(&self, offsets: &CommittedOffsets) {
        let mut state = self.state.write();
        for (key, &offset) in offsets {
            state.commit(key, offset);
        }
    }

    fn list_committed_offsets(&self, keys: &[String]) -> CommittedOffsets {
        let state = self.state.read();
        keys.iter()
            .filter_map(|key| state.committed(key).map(|offset| (key.clone(), offset)))
            .collect()
    }

    fn high_water_mark(&self, key: &str) -> Option<Offset> {
        self.state.read().high_water_mark(key)
    }

    fn key_count(&self) -> usize {
        self.state.read().key_count()
    }
}
