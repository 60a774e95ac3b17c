//! # logkv
//!
//! A minimal key-value store with:
//! - An append-only record log as the only persistent state
//! - An in-memory index from key to the offset of its latest record
//! - Index recovery by replaying the log on startup
//! - A line-based TCP protocol (`GET` / `SET`)
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │               (one thread per connection)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ Get / Set
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 StorageKv (engine)                           │
//! │              routes to its segment(s)                        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Segment                                 │
//! │            RwLock { log, index, head }                       │
//! └──────────┬──────────────────────────────────┬───────────────┘
//!            │                                  │
//!            ▼                                  ▼
//!   ┌─────────────────┐                ┌─────────────────┐
//!   │   Append Log    │                │      Index      │
//!   │ (segment.log)   │                │ key → offset    │
//!   └─────────────────┘                └─────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod log;
pub mod storage;
pub mod network;
pub mod protocol;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KvError, Result};
pub use config::Config;
pub use engine::{KvStore, StorageKv};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of logkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
