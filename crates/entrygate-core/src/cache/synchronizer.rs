//! Tiered cache synchronizer.
//!
//! Tiers, fastest first: memory, persistent store, network. A read is served
//! from the best tier available synchronously and, when memory was cold, hands
//! back a `FetchTicket` so the caller can run the network fetch off the
//! critical path.
//!
//! Every fetch carries a sequence number. A completion whose number is lower
//! than the last one applied for that resource is discarded, so a slow stale
//! response can never overwrite a newer one.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::entry::CacheEntry;
use crate::error::NetworkError;
use crate::storage::{keys, SharedStore};

/// Which tier answered a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Memory,
    Persistent,
    None,
}

/// Handle for one in-flight network fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    resource: String,
    seq: u64,
}

impl FetchTicket {
    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

#[derive(Debug, Clone)]
pub struct CacheRead<T> {
    pub entry: Option<CacheEntry<T>>,
    pub tier: Tier,
    /// Present when memory was cold and a background fetch should run.
    pub fetch: Option<FetchTicket>,
}

/// What happened to a completed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchApplied {
    Updated,
    MarkedOffline,
    /// An answer to an older fetch arrived after a newer one was applied.
    Discarded,
}

#[derive(Debug)]
struct Slot<T> {
    entry: Option<CacheEntry<T>>,
    offline: bool,
    last_applied: u64,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            entry: None,
            offline: false,
            last_applied: 0,
        }
    }
}

pub struct TieredCache<T> {
    store: SharedStore,
    user_id: String,
    memory: HashMap<String, Slot<T>>,
    next_seq: u64,
    persist_disabled: bool,
}

impl<T> TieredCache<T>
where
    T: Clone + Serialize + DeserializeOwned,
{
    pub fn new(store: SharedStore, user_id: impl Into<String>) -> Self {
        Self {
            store,
            user_id: user_id.into(),
            memory: HashMap::new(),
            next_seq: 0,
            persist_disabled: false,
        }
    }

    /// Serve `resource` from the best synchronous tier.
    pub fn read(&mut self, resource: &str) -> CacheRead<T> {
        if let Some(entry) = self.memory.get(resource).and_then(|s| s.entry.clone()) {
            return CacheRead {
                entry: Some(entry),
                tier: Tier::Memory,
                fetch: None,
            };
        }

        let hydrated = self.load_persisted(resource);
        let tier = if hydrated.is_some() {
            Tier::Persistent
        } else {
            Tier::None
        };
        let slot = self.memory.entry(resource.to_string()).or_default();
        if let Some(entry) = &hydrated {
            slot.offline = entry.offline;
            slot.entry = Some(entry.clone());
        }
        let entry = slot.entry.clone();

        CacheRead {
            entry,
            tier,
            fetch: Some(self.begin_fetch(resource)),
        }
    }

    /// Current entry without touching lower tiers.
    pub fn peek(&self, resource: &str) -> Option<&CacheEntry<T>> {
        self.memory.get(resource).and_then(|s| s.entry.as_ref())
    }

    /// Whether the last applied fetch for `resource` failed.
    pub fn is_offline(&self, resource: &str) -> bool {
        self.memory.get(resource).is_some_and(|s| s.offline)
    }

    /// Issue a sequence number for a new network fetch of `resource`.
    pub fn begin_fetch(&mut self, resource: &str) -> FetchTicket {
        self.next_seq += 1;
        FetchTicket {
            resource: resource.to_string(),
            seq: self.next_seq,
        }
    }

    /// Apply the outcome of the fetch identified by `ticket`.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<T, NetworkError>,
        now: DateTime<Utc>,
    ) -> FetchApplied {
        let slot = self.memory.entry(ticket.resource.clone()).or_default();
        if ticket.seq < slot.last_applied {
            tracing::warn!(
                resource = %ticket.resource,
                seq = ticket.seq,
                last_applied = slot.last_applied,
                "discarding out-of-order fetch result"
            );
            return FetchApplied::Discarded;
        }
        slot.last_applied = ticket.seq;

        match result {
            Ok(payload) => {
                let entry = CacheEntry {
                    payload,
                    fetched_at: now,
                    offline: false,
                };
                slot.entry = Some(entry.clone());
                slot.offline = false;
                self.persist(&ticket.resource, &entry);
                FetchApplied::Updated
            }
            Err(e) => {
                tracing::warn!(resource = %ticket.resource, error = %e, "fetch failed, serving cached data");
                slot.offline = true;
                if let Some(entry) = slot.entry.as_mut() {
                    entry.offline = true;
                }
                FetchApplied::MarkedOffline
            }
        }
    }

    /// Run `fetch` now and apply its result.
    pub fn refresh<F>(&mut self, resource: &str, now: DateTime<Utc>, fetch: F) -> FetchApplied
    where
        F: FnOnce() -> Result<T, NetworkError>,
    {
        let ticket = self.begin_fetch(resource);
        self.complete(ticket, fetch(), now)
    }

    /// Drop `resource` from every tier.
    pub fn invalidate(&mut self, resource: &str) {
        self.memory.remove(resource);
        if let Err(e) = self.store.remove(&keys::cache(&self.user_id, resource)) {
            tracing::warn!(resource, error = %e, "could not remove cached entry");
        }
    }

    fn load_persisted(&mut self, resource: &str) -> Option<CacheEntry<T>> {
        if self.persist_disabled {
            return None;
        }
        let key = keys::cache(&self.user_id, resource);
        match self.store.get(&key) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(resource, error = %e, "discarding unreadable cache entry");
                    if let Err(e) = self.store.remove(&key) {
                        tracing::warn!(resource, error = %e, "could not remove unreadable cache entry");
                    }
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                self.disable_persistence(&e.to_string());
                None
            }
        }
    }

    fn persist(&mut self, resource: &str, entry: &CacheEntry<T>) {
        if self.persist_disabled {
            return;
        }
        let result = serde_json::to_string(entry)
            .map_err(|e| e.to_string())
            .and_then(|json| {
                self.store
                    .set(&keys::cache(&self.user_id, resource), &json)
                    .map_err(|e| e.to_string())
            });
        if let Err(e) = result {
            self.disable_persistence(&e);
        }
    }

    fn disable_persistence(&mut self, error: &str) {
        tracing::warn!(error, "cache store failed, caching in memory only");
        self.persist_disabled = true;
    }
}
