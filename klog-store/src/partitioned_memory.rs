//! Partitioned CommitLog implementation.
//!
//! Keys are hashed onto a fixed number of partitions, each behind its own
//! reader/writer lock, so appends to keys in different partitions do not
//! contend. Operations that touch several partitions acquire their locks in
//! ascending partition order and hold all of them until done:
//! - a multi-key poll sees every key at the same instant
//! - a multi-key commit is applied as one step
//!
//! Appends only ever hold a single lock, which together with the fixed
//! acquisition order rules out lock cycles.

use std::collections::BTreeSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::state::LogState;
use crate::traits::{CommitLog, CommittedOffsets, Offset, PollRequest, PollResult};

/// Partitioned in-memory implementation of CommitLog.
#[derive(Debug)]
pub struct PartitionedCommitLog {
    partitions: Vec<RwLock<LogState>>,
}

impl PartitionedCommitLog {
    /// Create a commit log with `partition_count` partitions (at least one).
    #[must_use]
    pub fn new(partition_count: usize) -> Self {
        let partitions = (0..partition_count.max(1))
            .map(|_| RwLock::new(LogState::default()))
            .collect();
        Self { partitions }
    }

    /// Number of partitions keys are spread over.
    #[must_use]
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Get the partition index for a given key.
    fn partition_for_key(&self, key: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % self.partitions.len() as u64) as usize
    }

    /// Read-lock the given partitions in ascending order.
    ///
    /// The returned vector has one slot per partition; only the requested
    /// ones are `Some`.
    fn read_partitions(
        &self,
        indices: BTreeSet<usize>,
    ) -> Vec<Option<RwLockReadGuard<'_, LogState>>> {
        let mut guards: Vec<_> = self.partitions.iter().map(|_| None).collect();
        for index in indices {
            guards[index] = Some(self.partitions[index].read());
        }
        guards
    }

    /// Write-lock the given partitions in ascending order.
    fn write_partitions(
        &self,
        indices: BTreeSet<usize>,
    ) -> Vec<Option<RwLockWriteGuard<'_, LogState>>> {
        let mut guards: Vec<_> = self.partitions.iter().map(|_| None).collect();
        for index in indices {
            guards[index] = Some(self.partitions[index].write());
        }
        guards
    }

    fn partitions_of<'a>(&self, keys: impl IntoIterator<Item = &'a String>) -> BTreeSet<usize> {
        keys.into_iter().map(|key| self.partition_for_key(key)).collect()
    }
}

impl Default for PartitionedCommitLog {
    fn default() -> Self {
        Self::new(8)
    }
}

impl CommitLog for PartitionedCommitLog {
    fn append(&self, key: &str, value: i64) -> Offset {
        let partition = self.partition_for_key(key);
        self.partitions[partition].write().append(key, value)
    }

    fn poll(&self, request: &PollRequest) -> PollResult {
        let mut result = PollResult::new();

        match request {
            PollRequest::Keys(offsets) => {
                let guards = self.read_partitions(self.partitions_of(offsets.keys()));
                for (key, &from) in offsets {
                    let entries = guards[self.partition_for_key(key)]
                        .as_ref()
                        .and_then(|state| state.read_from(key, from));
                    if let Some(entries) = entries {
                        result.insert(key.clone(), entries);
                    }
                }
            }
            PollRequest::All => {
                let guards = self.read_partitions((0..self.partitions.len()).collect());
                for state in guards.iter().flatten() {
                    state.read_all_into(&mut result);
                }
            }
        }

        result
    }

    fn commit_offsets(&self, offsets: &CommittedOffsets) {
        let mut guards = self.write_partitions(self.partitions_of(offsets.keys()));
        for (key, &offset) in offsets {
            if let Some(state) = guards[self.partition_for_key(key)].as_mut() {
                state.commit(key, offset);
            }
        }
    }

    fn list_committed_offsets(&self, keys: &[String]) -> CommittedOffsets {
        let guards = self.read_partitions(self.partitions_of(keys));
        keys.iter()
            .filter_map(|key| {
                let state = guards[self.partition_for_key(key)].as_ref()?;
                state.committed(key).map(|offset| (key.clone(), offset))
            })
            .collect()
    }

    fn high_water_mark(&self, key: &str) -> Option<Offset> {
        self.partitions[self.partition_for_key(key)]
            .read()
            .high_water_mark(key)
    }

    fn key_count(&self) -> usize {
        let guards = self.read_partitions((0..self.partitions.len()).collect());
        guards.iter().flatten().map(|state| state.key_count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::traits::{Entry, OFFSET_BASE};

    #[test]
    fn zero_partitions_is_clamped_to_one() {
        let log = PartitionedCommitLog::new(0);
        assert_eq!(log.partition_count(), 1);
        assert_eq!(log.append("k", 1), OFFSET_BASE);
    }

    #[test]
    fn keys_spread_across_partitions() {
        let log = PartitionedCommitLog::new(8);

        let used: BTreeSet<usize> = (0..64)
            .map(|i| log.partition_for_key(&format!("key-{i}")))
            .collect();

        assert!(used.len() > 1, "Expected keys in several partitions, got {used:?}");
    }

    #[test]
    fn offsets_are_per_key_not_per_partition() {
        let log = PartitionedCommitLog::new(2);

        for i in 0..16 {
            let key = format!("key-{i}");
            assert_eq!(log.append(&key, i), OFFSET_BASE);
            assert_eq!(log.append(&key, i), OFFSET_BASE + 1);
        }

        assert_eq!(log.key_count(), 16);
    }

    #[test]
    fn poll_spans_partitions() {
        let log = PartitionedCommitLog::new(4);
        for i in 0..10 {
            log.append(&format!("key-{i}"), i);
        }

        let all = log.poll(&PollRequest::All);
        assert_eq!(all.len(), 10);

        let request = PollRequest::Keys(HashMap::from([
            ("key-3".to_string(), 0),
            ("key-7".to_string(), OFFSET_BASE + 1),
            ("missing".to_string(), 0),
        ]));
        let some = log.poll(&request);

        assert_eq!(some.len(), 2);
        assert_eq!(some["key-3"], vec![Entry::new(OFFSET_BASE, 3)]);
        assert!(some["key-7"].is_empty());
    }

    #[test]
    fn commit_spans_partitions() {
        let log = PartitionedCommitLog::new(4);
        let offsets: CommittedOffsets = (0..10)
            .map(|i| (format!("key-{i}"), OFFSET_BASE + i))
            .collect();

        log.commit_offsets(&offsets);

        let keys: Vec<String> = offsets.keys().cloned().collect();
        assert_eq!(log.list_committed_offsets(&keys), offsets);
    }
}
