//! Tests for the Append Log
//!
//! These tests verify:
//! - Open creates the file and picks up an existing length
//! - Appends land at the end and report their offsets
//! - Positioned reads return exactly what was appended
//! - Short reads fail instead of returning partial data
//! - Tail truncation moves the append position
//! - A failed append leaves the length untouched

use std::fs;
use std::path::{Path, PathBuf};

use logkv::config::SyncStrategy;
use logkv::log::{encode, AppendLog};
use logkv::KvError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_log() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("segment.log");
    (temp_dir, path)
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_open_creates_empty_file() {
    let (_temp, path) = setup_temp_log();

    let log = AppendLog::open(&path, SyncStrategy::OsBuffered).unwrap();

    assert!(path.exists());
    assert!(log.is_empty());
    assert_eq!(log.len(), 0);
    assert_eq!(log.path(), path.as_path());
}

#[test]
fn test_open_uses_existing_length() {
    let (_temp, path) = setup_temp_log();
    fs::write(&path, b"0123456789").unwrap();

    let log = AppendLog::open(&path, SyncStrategy::OsBuffered).unwrap();

    assert_eq!(log.len(), 10);
}

// =============================================================================
// Append / Read Tests
// =============================================================================

#[test]
fn test_append_returns_offsets() {
    let (_temp, path) = setup_temp_log();
    let mut log = AppendLog::open(&path, SyncStrategy::OsBuffered).unwrap();

    assert_eq!(log.append(b"hello").unwrap(), 0);
    assert_eq!(log.append(b"world!").unwrap(), 5);
    assert_eq!(log.append(b"").unwrap(), 11);

    assert_eq!(log.len(), 11);
    assert_eq!(fs::metadata(&path).unwrap().len(), 11);
}

#[test]
fn test_read_at_returns_appended_bytes() {
    let (_temp, path) = setup_temp_log();
    let mut log = AppendLog::open(&path, SyncStrategy::EveryWrite).unwrap();

    log.append(b"first").unwrap();
    let offset = log.append(b"second").unwrap();

    assert_eq!(log.read_at(offset, 6).unwrap(), b"second");
    assert_eq!(log.read_at(0, 5).unwrap(), b"first");
    assert_eq!(log.read_at(3, 4).unwrap(), b"stse");
}

#[test]
fn test_read_at_after_interleaved_appends() {
    let (_temp, path) = setup_temp_log();
    let mut log = AppendLog::open(&path, SyncStrategy::OsBuffered).unwrap();

    log.append(b"aaaa").unwrap();
    assert_eq!(log.read_at(0, 4).unwrap(), b"aaaa");

    // A read buffered before this append must not hide it
    let offset = log.append(b"bbbb").unwrap();
    assert_eq!(log.read_at(offset, 4).unwrap(), b"bbbb");
}

#[test]
fn test_read_at_short_read_fails() {
    let (_temp, path) = setup_temp_log();
    let mut log = AppendLog::open(&path, SyncStrategy::OsBuffered).unwrap();
    log.append(b"abc").unwrap();

    let err = log.read_at(1, 10).unwrap_err();

    match err {
        KvError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof),
        other => panic!("expected Io error, got {:?}", other),
    }
}

#[test]
fn test_reopen_preserves_contents() {
    let (_temp, path) = setup_temp_log();
    {
        let mut log = AppendLog::open(&path, SyncStrategy::OsBuffered).unwrap();
        log.append(b"persisted").unwrap();
        log.sync().unwrap();
    }

    let mut log = AppendLog::open(&path, SyncStrategy::OsBuffered).unwrap();
    assert_eq!(log.len(), 9);
    assert_eq!(log.read_at(0, 9).unwrap(), b"persisted");

    assert_eq!(log.append(b"!").unwrap(), 9);
}

// =============================================================================
// Record Decoding Tests
// =============================================================================

#[test]
fn test_decode_at_walks_records() {
    let (_temp, path) = setup_temp_log();
    let mut log = AppendLog::open(&path, SyncStrategy::OsBuffered).unwrap();

    let first = log.append(&encode(b"foo", b"bar").unwrap()).unwrap();
    let second = log.append(&encode(b"foo", b"baz").unwrap()).unwrap();

    let record = log.decode_at(first).unwrap().unwrap();
    assert_eq!(record.value, b"bar");
    assert_eq!(record.next_offset, second);

    let record = log.decode_at(second).unwrap().unwrap();
    assert_eq!(record.value, b"baz");
    assert_eq!(record.next_offset, log.len());

    assert!(log.decode_at(log.len()).unwrap().is_none());
}

// =============================================================================
// Truncate Tests
// =============================================================================

#[test]
fn test_truncate_moves_append_position() {
    let (_temp, path) = setup_temp_log();
    let mut log = AppendLog::open(&path, SyncStrategy::OsBuffered).unwrap();
    log.append(b"keepdrop").unwrap();

    log.truncate(4).unwrap();

    assert_eq!(log.len(), 4);
    assert_eq!(fs::metadata(&path).unwrap().len(), 4);

    assert_eq!(log.append(b"more").unwrap(), 4);
    assert_eq!(log.read_at(0, 8).unwrap(), b"keepmore");
}

// =============================================================================
// Failed Append Tests
// =============================================================================

// Every write to /dev/full fails with ENOSPC, and it cannot be truncated.

#[cfg(target_os = "linux")]
#[test]
fn test_append_failure_leaves_len_unchanged() {
    let mut log = AppendLog::open(Path::new("/dev/full"), SyncStrategy::OsBuffered).unwrap();
    assert_eq!(log.len(), 0);

    let err = log.append(b"abc").unwrap_err();

    assert!(matches!(err, KvError::Io(_)));
    assert_eq!(log.len(), 0);
    assert!(log.is_empty());
}

#[cfg(target_os = "linux")]
#[test]
fn test_append_refused_after_failed_rollback() {
    let mut log = AppendLog::open(Path::new("/dev/full"), SyncStrategy::OsBuffered).unwrap();
    log.append(b"abc").unwrap_err();

    match log.append(b"def").unwrap_err() {
        KvError::Io(e) => assert!(e.to_string().contains("reopen"), "got {}", e),
        other => panic!("expected Io error, got {:?}", other),
    }
    assert_eq!(log.len(), 0);
}
