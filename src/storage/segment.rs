//! Segment
//!
//! One append log plus the index over it.

use parking_lot::RwLock;

use crate::config::RecoveryMode;
use crate::engine::KvStore;
use crate::error::{KvError, Result};
use crate::log::{self, AppendLog};

use super::{replay, Index, RecoveryReport};

/// A log and its index, served as a key-value store
///
/// ## Concurrency
/// Log, index and head live behind a single `RwLock`:
/// - `set` holds the write lock over append → index update → head advance,
///   so a write is atomic with respect to every other caller.
/// - `get` holds the read lock over index lookup → decode.
///
/// All writes to a segment are therefore serialized.
pub struct Segment {
    state: RwLock<SegmentState>,

    /// What replay found when the segment was opened
    recovery: RecoveryReport,
}

struct SegmentState {
    log: AppendLog,
    index: Index,
    /// Offset of the next append; always equals `log.len()`
    head: u64,
}

impl Segment {
    /// Open a segment over `log`, replaying it to rebuild the index
    pub fn open(mut log: AppendLog, mode: RecoveryMode) -> Result<Self> {
        let (index, recovery) = replay(&mut log, mode)?;

        tracing::info!(
            "Recovered segment {}: {} records, {} keys, head={}",
            log.path().display(),
            recovery.records_replayed,
            recovery.keys_indexed,
            recovery.head
        );

        Ok(Self {
            state: RwLock::new(SegmentState {
                head: recovery.head,
                log,
                index,
            }),
            recovery,
        })
    }

    /// Get the latest value written for `key`
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        let state = self.state.read();

        let offset = state.index.get(key).ok_or(KvError::NotFound)?;

        let record = state
            .log
            .decode_at(offset)?
            .ok_or_else(|| KvError::CorruptLog {
                offset,
                reason: "indexed record lies past the end of the log".to_string(),
            })?;

        if record.key != key {
            return Err(KvError::KeyMismatch { offset });
        }

        Ok(record.value)
    }

    /// Append a record for `key` and point the index at it
    ///
    /// Oversized keys and values are rejected before the log is touched.
    /// If the append fails, neither the index nor the head moves.
    pub fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let record = log::encode(key, value)?;

        let mut guard = self.state.write();
        let state = &mut *guard;

        let offset = state.log.append(&record)?;
        debug_assert_eq!(offset, state.head);

        state.index.insert(key, state.head);
        state.head += record.len() as u64;

        tracing::trace!("Set {} byte key at offset {}", key.len(), offset);

        Ok(())
    }

    /// Offset at which the next record will be appended
    pub fn head(&self) -> u64 {
        self.state.read().head
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.state.read().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().index.is_empty()
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.state.read().index.contains_key(key)
    }

    /// Replay statistics from when the segment was opened
    pub fn recovery_report(&self) -> &RecoveryReport {
        &self.recovery
    }

    /// Force the log to disk
    pub fn sync(&self) -> Result<()> {
        self.state.read().log.sync()
    }
}

impl KvStore for Segment {
    fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        Segment::get(self, key)
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        Segment::set(self, key, value)
    }
}
