//! Log replay
//!
//! Rebuilds a segment's index by decoding every record from offset 0.

use crate::config::RecoveryMode;
use crate::error::{KvError, Result};
use crate::log::AppendLog;

use super::Index;

/// Result of a replay
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Number of complete records decoded
    pub records_replayed: u64,

    /// Number of distinct keys in the rebuilt index
    pub keys_indexed: usize,

    /// Offset at which the next record will be appended
    pub head: u64,

    /// Bytes cut from a torn tail (always 0 in strict mode)
    pub bytes_truncated: u64,
}

impl RecoveryReport {
    /// Whether a torn tail was dropped
    pub fn was_truncated(&self) -> bool {
        self.bytes_truncated > 0
    }
}

enum ReplayState {
    Replaying { offset: u64 },
    Ready { head: u64 },
}

/// Replay `log` from the start and rebuild its index
///
/// Records are applied in file order, so a later record for a key replaces
/// an earlier one. A torn record is fatal in `Strict` mode; in
/// `TruncateTail` mode the log is cut back to the start of that record.
pub fn replay(log: &mut AppendLog, mode: RecoveryMode) -> Result<(Index, RecoveryReport)> {
    let mut index = Index::new();
    let mut report = RecoveryReport::default();
    let mut state = ReplayState::Replaying { offset: 0 };

    let head = loop {
        let offset = match state {
            ReplayState::Ready { head } => break head,
            ReplayState::Replaying { offset } => offset,
        };

        state = match log.decode_at(offset) {
            Ok(Some(record)) => {
                index.insert(&record.key, offset);
                report.records_replayed += 1;
                ReplayState::Replaying {
                    offset: record.next_offset,
                }
            }
            Ok(None) => ReplayState::Ready { head: offset },
            Err(KvError::CorruptLog { reason, .. }) if mode == RecoveryMode::TruncateTail => {
                let dropped = log.len().saturating_sub(offset);
                tracing::warn!(
                    "Truncating {} bytes from {} at offset {}: {}",
                    dropped,
                    log.path().display(),
                    offset,
                    reason
                );
                log.truncate(offset)?;
                report.bytes_truncated = dropped;
                ReplayState::Ready { head: offset }
            }
            Err(e) => return Err(e),
        };
    };

    debug_assert_eq!(head, log.len());

    report.head = head;
    report.keys_indexed = index.len();

    Ok((index, report))
}
