//! Engine Module
//!
//! The storage engine the front-end talks to.
//!
//! ## Responsibilities
//! - Open the data directory and recover its segment on startup
//! - Route Get/Set to the owning segment
//! - Flush logs on close

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::Result;
use crate::log::AppendLog;
use crate::storage::{RecoveryReport, Segment};

/// The Get/Set contract served over the wire
///
/// The front-end holds an `Arc` of one implementor, handed over at
/// construction.
pub trait KvStore: Send + Sync {
    /// Latest value for `key`, or `KvError::NotFound`
    fn get(&self, key: &[u8]) -> Result<Vec<u8>>;

    /// Record `value` as the latest value for `key`
    fn set(&self, key: &[u8], value: &[u8]) -> Result<()>;
}

/// Storage engine owning the segments
///
/// There is exactly one segment today. The list shape is kept so that
/// sharding or rotation can slot in behind `route` without changing the
/// Get/Set contract; no routing policy exists yet.
pub struct StorageKv {
    /// Engine configuration
    config: Config,

    /// Owned segments; always exactly one
    segments: Vec<Segment>,
}

impl StorageKv {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const LOG_FILENAME: &'static str = "segment.log";

    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Create the data directory
    /// 2. Open the log file
    /// 3. Replay it to rebuild the index
    pub fn open(config: Config) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;

        let log_path = config.data_dir.join(Self::LOG_FILENAME);
        let log = AppendLog::open(&log_path, config.sync_strategy)?;
        let segment = Segment::open(log, config.recovery_mode)?;

        Ok(Self {
            config,
            segments: vec![segment],
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().data_dir(path).build();
        Self::open(config)
    }

    /// Get the latest value for a key
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        self.route(key).get(key)
    }

    /// Set a key-value pair
    pub fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.route(key).set(key, value)
    }

    /// Close the engine, syncing every log to disk
    pub fn close(self) -> Result<()> {
        for segment in &self.segments {
            segment.sync()?;
        }
        Ok(())
    }

    fn route(&self, _key: &[u8]) -> &Segment {
        &self.segments[0]
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Number of segments
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Number of distinct keys across all segments
    pub fn key_count(&self) -> usize {
        self.segments.iter().map(Segment::len).sum()
    }

    /// Total bytes across all logs
    pub fn log_len(&self) -> u64 {
        self.segments.iter().map(Segment::head).sum()
    }

    /// Replay statistics of the active segment
    pub fn recovery_report(&self) -> &RecoveryReport {
        self.segments[0].recovery_report()
    }

    /// Path of the active segment's log file
    pub fn log_path(&self) -> PathBuf {
        self.config.data_dir.join(Self::LOG_FILENAME)
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl KvStore for StorageKv {
    fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        StorageKv::get(self, key)
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        StorageKv::set(self, key, value)
    }
}
