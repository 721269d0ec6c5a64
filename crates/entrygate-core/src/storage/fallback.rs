//! Store wrapper that degrades to memory after the first failure.

use std::sync::atomic::{AtomicBool, Ordering};

use super::{KeyValueStore, MemoryStore, SharedStore};
use crate::error::PersistenceError;

/// Wraps a durable store. The first failing operation is logged, the wrapper
/// switches to an in-memory map for the rest of the session, and the
/// operation is retried there. Later operations never touch the durable store.
pub struct FallbackStore {
    durable: SharedStore,
    memory: MemoryStore,
    degraded: AtomicBool,
}

impl FallbackStore {
    pub fn new(durable: SharedStore) -> Self {
        Self {
            durable,
            memory: MemoryStore::new(),
            degraded: AtomicBool::new(false),
        }
    }

    /// Whether the durable store has been abandoned for this session.
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    fn degrade(&self, err: &PersistenceError) {
        if !self.degraded.swap(true, Ordering::AcqRel) {
            tracing::warn!(error = %err, "persistent store failed, continuing in memory only");
        }
    }
}

impl KeyValueStore for FallbackStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        if !self.is_degraded() {
            match self.durable.get(key) {
                Ok(v) => return Ok(v),
                Err(e) => self.degrade(&e),
            }
        }
        self.memory.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        if !self.is_degraded() {
            match self.durable.set(key, value) {
                Ok(()) => return Ok(()),
                Err(e) => self.degrade(&e),
            }
        }
        self.memory.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        if !self.is_degraded() {
            match self.durable.remove(key) {
                Ok(()) => return Ok(()),
                Err(e) => self.degrade(&e),
            }
        }
        self.memory.remove(key)
    }
}
