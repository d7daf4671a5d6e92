//! Exclusive critical sections keyed by an identity (slot start, participant id).

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// A lazily populated map of async mutexes, one per key.
///
/// Holders of different keys never wait on each other. Entries nobody holds are pruned
/// on the next acquisition.
#[derive(Debug)]
pub struct KeyedLocks<K> {
    entries: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
}

/// Releases the key when dropped.
#[derive(Debug)]
pub struct KeyedGuard {
    _guard: OwnedMutexGuard<()>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, key: K) -> KeyedGuard {
        let mutex = {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            // strong_count == 1: only the map refers to it, nobody holds or waits
            entries.retain(|_, m| Arc::strong_count(m) > 1);
            entries.entry(key).or_default().clone()
        };
        KeyedGuard {
            _guard: mutex.lock_owned().await,
        }
    }

    /// Number of keys currently held or awaited.
    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.values().filter(|m| Arc::strong_count(m) > 1).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
