//! Unsynchronized log state shared by the store implementations.
//!
//! Callers wrap a [`LogState`] in a lock; nothing here synchronizes.

use std::collections::HashMap;

use tracing::debug;

use crate::traits::{Entry, OFFSET_BASE, Offset, PollResult};

/// Logs and committed offsets for a set of keys.
#[derive(Debug, Default)]
pub(crate) struct LogState {
    logs: HashMap<String, Vec<Entry>>,
    committed: HashMap<String, Offset>,
}

impl LogState {
    pub(crate) fn append(&mut self, key: &str, value: i64) -> Offset {
        let log = self.logs.entry(key.to_owned()).or_default();
        let offset = OFFSET_BASE + log.len() as Offset;
        log.push(Entry::new(offset, value));
        offset
    }

    /// Entries of `key` from `from` onward, or `None` if the key has no log.
    pub(crate) fn read_from(&self, key: &str, from: Offset) -> Option<Vec<Entry>> {
        let log = self.logs.get(key)?;
        let start = usize::try_from(from.saturating_sub(OFFSET_BASE)).unwrap_or(0);
        Some(log.get(start..).map(<[Entry]>::to_vec).unwrap_or_default())
    }

    /// Copy every log into `out`.
    pub(crate) fn read_all_into(&self, out: &mut PollResult) {
        out.extend(self.logs.iter().map(|(key, log)| (key.clone(), log.clone())));
    }

    pub(crate) fn commit(&mut self, key: &str, offset: Offset) {
        // Zero reads the same as "nothing committed".
        match self.committed.get(key) {
            Some(&current) if current != 0 => {
                debug!(key, current, proposed = offset, "Commit ignored, offset already set");
            }
            _ => {
                self.committed.insert(key.to_owned(), offset);
            }
        }
    }

    /// Committed offset of `key`, `None` when unset or zero.
    pub(crate) fn committed(&self, key: &str) -> Option<Offset> {
        self.committed.get(key).copied().filter(|&offset| offset != 0)
    }

    pub(crate) fn high_water_mark(&self, key: &str) -> Option<Offset> {
        self.logs
            .get(key)
            .map(|log| OFFSET_BASE + log.len() as Offset)
    }

    pub(crate) fn key_count(&self) -> usize {
        self.logs.len()
    }
}
