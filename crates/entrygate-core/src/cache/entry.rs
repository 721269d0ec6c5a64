use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One cached resource. Replaced wholesale on every successful fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
    pub payload: T,
    pub fetched_at: DateTime<Utc>,
    /// Set by a failed fetch, cleared by the next successful one.
    #[serde(default)]
    pub offline: bool,
}
