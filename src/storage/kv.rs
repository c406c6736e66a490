//! Ordered key-value substrate.
//!
//! The registry only needs four primitives from its backing store: point get,
//! single-key put, single-key delete and prefix scan in key order. Each
//! primitive is atomic on its own; nothing groups several keys together.

use crate::core::error::RegistryResult;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Ordered KV backend used by the node store.
pub trait KvBackend: Send + Sync {
    /// Get a key's current value.
    fn get(&self, key: &str) -> RegistryResult<Option<Vec<u8>>>;

    /// Put a key-value pair.
    fn put(&self, key: &str, value: Vec<u8>) -> RegistryResult<()>;

    /// Delete a key. Returns whether the key existed.
    fn delete(&self, key: &str) -> RegistryResult<bool>;

    /// All live entries whose key starts with `prefix`, in key order.
    fn scan_prefix(&self, prefix: &str) -> RegistryResult<Vec<KvEntry>>;
}

/// A key-value pair returned by a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvEntry {
    pub key: String,
    pub value: Vec<u8>,
}

/// In-memory ordered KV store.
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryKv {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy out every live entry in key order.
    pub fn entries(&self) -> Vec<KvEntry> {
        scan(&self.entries.read(), "")
    }

    /// Get statistics about the store.
    pub fn stats(&self) -> KvStats {
        let entries = self.entries.read();
        KvStats {
            live_key_count: entries.len(),
            value_bytes: entries.values().map(Vec::len).sum(),
        }
    }
}

fn scan(entries: &BTreeMap<String, Vec<u8>>, prefix: &str) -> Vec<KvEntry> {
    entries
        .range(prefix.to_string()..)
        .take_while(|(k, _)| k.starts_with(prefix))
        .map(|(k, v)| KvEntry {
            key: k.clone(),
            value: v.clone(),
        })
        .collect()
}

impl KvBackend for MemoryKv {
    fn get(&self, key: &str) -> RegistryResult<Option<Vec<u8>>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: Vec<u8>) -> RegistryResult<()> {
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> RegistryResult<bool> {
        Ok(self.entries.write().remove(key).is_some())
    }

    fn scan_prefix(&self, prefix: &str) -> RegistryResult<Vec<KvEntry>> {
        Ok(scan(&self.entries.read(), prefix))
    }
}

/// Statistics for a KV store.
#[derive(Debug, Clone)]
pub struct KvStats {
    /// Number of live keys.
    pub live_key_count: usize,
    /// Total size of stored values.
    pub value_bytes: usize,
}
