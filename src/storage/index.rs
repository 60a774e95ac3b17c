//! In-memory index
//!
//! Key → offset of the key's most recent record. A pure cache over the log.

use std::collections::HashMap;

/// Maps each key to the log offset of its latest record
#[derive(Debug, Default)]
pub struct Index {
    entries: HashMap<Vec<u8>, u64>,
}

impl Index {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point `key` at `offset`, returning the offset it replaced
    pub fn insert(&mut self, key: &[u8], offset: u64) -> Option<u64> {
        match self.entries.get_mut(key) {
            Some(slot) => Some(std::mem::replace(slot, offset)),
            None => {
                self.entries.insert(key.to_vec(), offset);
                None
            }
        }
    }

    pub fn get(&self, key: &[u8]) -> Option<u64> {
        self.entries.get(key).copied()
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
