//! Per-key async mutual exclusion.
//!
//! Callers working on the same key queue up behind one `tokio::sync::Mutex`;
//! callers on different keys never contend beyond a short map lookup. Slots
//! are dropped from the table once nobody holds or waits on them.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Guard for one key; the key is released when it is dropped.
pub type KeyGuard = OwnedMutexGuard<()>;

#[derive(Debug, Default)]
pub struct KeyedLocks {
    slots: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until `key` is free and take it.
    ///
    /// Cancel safe: dropping the returned future before it resolves leaves
    /// the key untouched.
    pub async fn lock(&self, key: &str) -> KeyGuard {
        let slot = {
            let mut slots = self.slots.lock();
            // A slot only referenced by the table has no holder and no waiter
            slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            slots.entry(key.to_string()).or_default().clone()
        };

        slot.lock_owned().await
    }

    /// Number of keys currently held or waited on
    #[cfg(test)]
    pub fn active(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| Arc::strong_count(slot) > 1)
            .count()
    }
}
