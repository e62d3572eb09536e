//! Per-address locks serializing read-modify-write cycles.
//!
//! An operation locks every address it touches before reading any record and
//! holds the locks until its batch is committed. Addresses are locked in
//! sorted order with duplicates removed, so two operations can never wait on
//! each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Slot = Arc<AsyncMutex<()>>;

/// Table of per-address async mutexes, created on demand.
#[derive(Default)]
pub struct LockTable {
    slots: Mutex<HashMap<[u8; 32], Slot>>,
}

/// Guards held for one operation. Dropping it releases every address.
#[must_use = "locks are released as soon as the guard is dropped"]
pub struct LockGuard {
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock every address in `keys`.
    pub async fn acquire<I>(&self, keys: I) -> LockGuard
    where
        I: IntoIterator<Item = [u8; 32]>,
    {
        let mut keys: Vec<[u8; 32]> = keys.into_iter().collect();
        keys.sort_unstable();
        keys.dedup();

        let slots: Vec<Slot> = {
            // The map only holds Arcs, so a poisoned lock still has usable state.
            let mut table = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            // Drop slots nobody is holding or waiting on.
            table.retain(|_, slot| Arc::strong_count(slot) > 1);
            keys.iter()
                .map(|key| table.entry(*key).or_default().clone())
                .collect()
        };

        let mut guards = Vec::with_capacity(slots.len());
        for slot in slots {
            guards.push(slot.lock_owned().await);
        }
        tracing::debug!(addresses = guards.len(), "acquired address locks");
        LockGuard { _guards: guards }
    }

    /// Number of addresses currently tracked.
    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
