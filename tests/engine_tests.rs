//! Tests for the storage engine
//!
//! These tests verify:
//! - Engine lifecycle (open/close/reopen)
//! - Round-trip, last-write-wins and not-found through the engine
//! - Key/value length boundaries
//! - Replay equivalence across restarts
//! - Recovery mode is taken from config
//! - The engine works behind the `KvStore` contract

use std::fs;
use std::sync::Arc;
use std::thread;

use logkv::config::{Config, RecoveryMode, SyncStrategy};
use logkv::{KvError, KvStore, StorageKv};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn test_config(temp_dir: &TempDir) -> Config {
    Config::builder()
        .data_dir(temp_dir.path())
        .sync_strategy(SyncStrategy::EveryWrite) // Sync every write for test reliability
        .build()
}

fn setup_temp_engine() -> (TempDir, StorageKv) {
    let temp_dir = TempDir::new().unwrap();
    let engine = StorageKv::open(test_config(&temp_dir)).unwrap();
    (temp_dir, engine)
}

fn reopen(temp_dir: &TempDir) -> StorageKv {
    StorageKv::open(test_config(temp_dir)).unwrap()
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_engine_open_creates_directory_and_log() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("mydb");

    let engine = StorageKv::open(Config::builder().data_dir(&data_dir).build()).unwrap();

    assert!(data_dir.exists());
    assert!(engine.log_path().exists());
    assert_eq!(engine.log_path(), data_dir.join("segment.log"));
    assert_eq!(engine.data_dir(), data_dir.as_path());
    assert_eq!(engine.segment_count(), 1);
    assert_eq!(engine.key_count(), 0);
    assert_eq!(engine.log_len(), 0);
}

#[test]
fn test_engine_open_path() {
    let temp_dir = TempDir::new().unwrap();

    let engine = StorageKv::open_path(temp_dir.path()).unwrap();
    engine.set(b"k", b"v").unwrap();

    assert_eq!(engine.get(b"k").unwrap(), b"v");
    assert_eq!(engine.config().recovery_mode, RecoveryMode::Strict);
}

#[test]
fn test_engine_close_and_reopen() {
    let (temp_dir, engine) = setup_temp_engine();
    engine.set(b"durable", b"yes").unwrap();
    engine.close().unwrap();

    let engine = reopen(&temp_dir);

    assert_eq!(engine.get(b"durable").unwrap(), b"yes");
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_engine_scenario_with_restart() {
    let (temp_dir, engine) = setup_temp_engine();

    engine.set(b"foo", b"bar").unwrap();
    assert_eq!(engine.get(b"foo").unwrap(), b"bar");

    engine.set(b"foo", b"baz").unwrap();
    assert_eq!(engine.get(b"foo").unwrap(), b"baz");

    engine.close().unwrap();
    let engine = reopen(&temp_dir);

    assert_eq!(engine.get(b"foo").unwrap(), b"baz");
    assert!(matches!(engine.get(b"missing"), Err(KvError::NotFound)));
}

#[test]
fn test_engine_round_trip_sizes() {
    let (_temp, engine) = setup_temp_engine();

    for (key_len, value_len) in [(1, 0), (1, 1), (17, 300), (128, 4096), (255, 65535)] {
        let key: Vec<u8> = (0..key_len).map(|i| (i % 251) as u8 + 1).collect();
        let value: Vec<u8> = (0..value_len).map(|i| (i % 253) as u8).collect();

        engine.set(&key, &value).unwrap();

        assert_eq!(engine.get(&key).unwrap(), value, "key_len={} value_len={}", key_len, value_len);
    }
}

#[test]
fn test_engine_get_nonexistent_key() {
    let (_temp, engine) = setup_temp_engine();

    let err = engine.get(b"nonexistent").unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "not found");
}

// =============================================================================
// Boundary Tests
// =============================================================================

#[test]
fn test_engine_max_key_and_value() {
    let (temp_dir, engine) = setup_temp_engine();
    let key = vec![b'k'; 255];
    let value = vec![b'v'; 65535];

    engine.set(&key, &value).unwrap();
    assert_eq!(engine.get(&key).unwrap(), value);

    engine.close().unwrap();
    let engine = reopen(&temp_dir);
    assert_eq!(engine.get(&key).unwrap(), value);
}

#[test]
fn test_engine_rejects_oversized_without_writing() {
    let (_temp, engine) = setup_temp_engine();
    engine.set(b"before", b"x").unwrap();
    let log_len = engine.log_len();

    let err = engine.set(&vec![b'k'; 256], b"v").unwrap_err();
    assert!(matches!(err, KvError::KeyTooLong { len: 256 }));

    let err = engine.set(b"k", &vec![b'v'; 65536]).unwrap_err();
    assert!(matches!(err, KvError::ValueTooLong { len: 65536 }));

    assert_eq!(engine.log_len(), log_len);
    assert_eq!(fs::metadata(engine.log_path()).unwrap().len(), log_len);
}

#[test]
fn test_engine_oversized_get_is_not_found() {
    let (_temp, engine) = setup_temp_engine();

    let err = engine.get(&vec![b'k'; 300]).unwrap_err();

    assert!(matches!(err, KvError::NotFound));
}

// =============================================================================
// Recovery Tests
// =============================================================================

#[test]
fn test_engine_replay_equivalence() {
    let (temp_dir, engine) = setup_temp_engine();

    for round in 0..5 {
        for i in 0..50 {
            let key = format!("key{}", i);
            let value = format!("round{}-value{}", round, i);
            engine.set(key.as_bytes(), value.as_bytes()).unwrap();
        }
    }

    let before: Vec<Vec<u8>> = (0..50)
        .map(|i| engine.get(format!("key{}", i).as_bytes()).unwrap())
        .collect();
    let log_len = engine.log_len();
    engine.close().unwrap();

    let engine = reopen(&temp_dir);
    let after: Vec<Vec<u8>> = (0..50)
        .map(|i| engine.get(format!("key{}", i).as_bytes()).unwrap())
        .collect();

    assert_eq!(before, after);
    assert_eq!(engine.log_len(), log_len);
    assert_eq!(engine.key_count(), 50);
    assert_eq!(engine.recovery_report().records_replayed, 250);
}

#[test]
fn test_engine_strict_refuses_torn_log() {
    let (temp_dir, engine) = setup_temp_engine();
    engine.set(b"foo", b"bar").unwrap();
    let log_path = engine.log_path();
    engine.close().unwrap();

    let mut bytes = fs::read(&log_path).unwrap();
    bytes.extend_from_slice(&[10, b'p', b'a', b'r']);
    fs::write(&log_path, bytes).unwrap();

    match StorageKv::open(test_config(&temp_dir)) {
        Ok(_) => panic!("expected strict recovery to fail"),
        Err(e) => assert!(matches!(e, KvError::CorruptLog { offset: 9, .. })),
    }
}

#[test]
fn test_engine_truncate_tail_from_config() {
    let (temp_dir, engine) = setup_temp_engine();
    engine.set(b"foo", b"bar").unwrap();
    let log_path = engine.log_path();
    engine.close().unwrap();

    let mut bytes = fs::read(&log_path).unwrap();
    bytes.extend_from_slice(&[10, b'p', b'a', b'r']);
    fs::write(&log_path, bytes).unwrap();

    let config = Config::builder()
        .data_dir(temp_dir.path())
        .recovery_mode(RecoveryMode::TruncateTail)
        .build();
    let engine = StorageKv::open(config).unwrap();

    assert_eq!(engine.get(b"foo").unwrap(), b"bar");
    assert_eq!(engine.recovery_report().bytes_truncated, 4);
    assert_eq!(engine.log_len(), 9);
}

// =============================================================================
// Contract Tests
// =============================================================================

#[test]
fn test_engine_behind_trait_object() {
    let (_temp, engine) = setup_temp_engine();
    let store: Arc<dyn KvStore> = Arc::new(engine);

    store.set(b"trait", b"object").unwrap();

    assert_eq!(store.get(b"trait").unwrap(), b"object");
    assert!(matches!(store.get(b"other"), Err(KvError::NotFound)));
}

#[test]
fn test_engine_concurrent_clients() {
    let (temp_dir, engine) = setup_temp_engine();
    let engine = Arc::new(engine);

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for i in 0..50 {
                    engine
                        .set(format!("shared{}", i).as_bytes(), format!("t{}", t).as_bytes())
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let before: Vec<Vec<u8>> = (0..50)
        .map(|i| engine.get(format!("shared{}", i).as_bytes()).unwrap())
        .collect();
    drop(engine);

    // Whichever thread wrote last, replay must agree with the live index
    let engine = reopen(&temp_dir);
    for (i, value) in before.iter().enumerate() {
        assert_eq!(&engine.get(format!("shared{}", i).as_bytes()).unwrap(), value);
    }
    assert_eq!(engine.recovery_report().records_replayed, 200);
}
