//! Memory / persistent / network cache that keeps reads usable offline.

mod entry;
mod synchronizer;

pub use entry::CacheEntry;
pub use synchronizer::{CacheRead, FetchApplied, FetchTicket, Tier, TieredCache};
