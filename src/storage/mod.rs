//! Storage Module
//!
//! Segments: an append log paired with the in-memory index over it.
//!
//! ## Responsibilities
//! - Map each key to the offset of its latest record
//! - Rebuild that map by replaying the log on startup
//! - Serve point reads and writes against one log
//!
//! ## Recovery
//! ```text
//!   offset = 0, index = {}
//!        │
//!        ▼
//!   ┌───────────┐  record   ┌────────────────────────────┐
//!   │ Replaying │──────────▶│ index[key] = offset        │
//!   │           │◀──────────│ offset = next_offset       │
//!   └─────┬─────┘           └────────────────────────────┘
//!         │ end of log                 │ torn record
//!         ▼                            ▼
//!   ┌───────────┐              Strict: CorruptLog
//!   │   Ready   │◀──────────── TruncateTail: cut log to offset
//!   │ head=off  │
//!   └───────────┘
//! ```

mod index;
mod recovery;
mod segment;

pub use index::Index;
pub use recovery::{replay, RecoveryReport};
pub use segment::Segment;
