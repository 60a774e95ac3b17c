//! Append Log
//!
//! A single file that only grows at the end and is read at arbitrary offsets.

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::config::SyncStrategy;
use crate::error::Result;

use super::record::{self, DecodedRecord};

/// Sequential writer plus random-access reader over one log file
///
/// ## Concurrency
/// - Appends take `&mut self`; the owner serializes them.
/// - Reads take `&self`. The read handle sits behind a mutex because every
///   read seeks, so concurrent readers share one handle one at a time.
pub struct AppendLog {
    /// Path of the backing file
    path: PathBuf,

    /// Handle opened in append mode
    writer: File,

    /// Separate handle for positioned reads
    reader: Mutex<BufReader<File>>,

    /// Current length of the log in bytes
    len: u64,

    sync_strategy: SyncStrategy,

    /// A failed append could not be rolled back; the file length no longer
    /// matches `len` and appends are refused until reopen
    poisoned: bool,
}

impl AppendLog {
    /// Open or create a log file
    ///
    /// The existing file length becomes the log length.
    pub fn open(path: &Path, sync_strategy: SyncStrategy) -> Result<Self> {
        let writer = OpenOptions::new().create(true).append(true).open(path)?;
        let len = writer.metadata()?.len();
        let reader = BufReader::new(File::open(path)?);

        tracing::debug!("Opened log {} ({} bytes)", path.display(), len);

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            reader: Mutex::new(reader),
            len,
            sync_strategy,
            poisoned: false,
        })
    }

    /// Append bytes at the end of the log
    ///
    /// Returns the offset the bytes start at. On failure the length is left
    /// where it was and the file is cut back to it on a best-effort basis.
    /// If that cut fails too, every later append is refused: the file is in
    /// append mode, so new bytes would land past the stray ones at an offset
    /// other than the one reported.
    pub fn append(&mut self, bytes: &[u8]) -> Result<u64> {
        if self.poisoned {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!(
                    "log {} has an unrolled partial append; reopen to recover",
                    self.path.display()
                ),
            )
            .into());
        }

        let offset = self.len;

        if let Err(e) = self.write_through(bytes) {
            self.rollback(offset);
            return Err(e);
        }

        self.len += bytes.len() as u64;
        tracing::trace!("Appended {} bytes at offset {}", bytes.len(), offset);

        Ok(offset)
    }

    /// Read exactly `len` bytes starting at `offset`
    ///
    /// Fails with an `UnexpectedEof` I/O error if fewer bytes remain.
    pub fn read_at(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let mut reader = self.reader.lock();
        reader.seek(SeekFrom::Start(offset))?;

        let mut buf = vec![0u8; len];
        reader.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Decode the record starting at `offset`
    ///
    /// `Ok(None)` means `offset` is the end of the log.
    pub fn decode_at(&self, offset: u64) -> Result<Option<DecodedRecord>> {
        let mut reader = self.reader.lock();
        record::decode_from(&mut *reader, offset)
    }

    /// Cut the log back to `len` bytes
    ///
    /// Only recovery uses this, to drop a torn tail.
    pub fn truncate(&mut self, len: u64) -> Result<()> {
        self.writer.set_len(len)?;
        self.writer.sync_all()?;
        self.len = len;
        self.poisoned = false;
        Ok(())
    }

    /// Force sync to disk
    pub fn sync(&self) -> Result<()> {
        self.writer.sync_all()?;
        Ok(())
    }

    /// Length of the log in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_through(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes)?;
        self.writer.flush()?;
        if self.sync_strategy == SyncStrategy::EveryWrite {
            self.writer.sync_data()?;
        }
        Ok(())
    }

    fn rollback(&mut self, len: u64) {
        if let Err(e) = self.writer.set_len(len) {
            // Bytes past `len` stay on disk; the next open replays or rejects them
            self.poisoned = true;
            tracing::warn!(
                "Failed to roll back partial append in {} to {} bytes: {}",
                self.path.display(),
                len,
                e
            );
        }
    }
}
