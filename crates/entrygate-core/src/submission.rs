//! Submission records as reported by the backend.
//!
//! Records are read-only on the client. Timestamps are optional because the
//! backend occasionally returns rows without them; such rows still count
//! toward the quota but never produce a cooldown.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Rejected,
}

impl SubmissionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Approved => "approved",
            SubmissionStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub id: String,
    pub status: SubmissionStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status_changed_at: Option<DateTime<Utc>>,
}

impl SubmissionRecord {
    pub fn is_pending(&self) -> bool {
        self.status == SubmissionStatus::Pending
    }
}

/// Keep only records created inside the trailing window ending at `now`.
///
/// Records without `created_at` are kept: the backend already scoped them to
/// the window when it returned them.
pub fn trailing_window(
    records: &[SubmissionRecord],
    now: DateTime<Utc>,
    window: Duration,
) -> Vec<SubmissionRecord> {
    let since = now - window;
    records
        .iter()
        .filter(|r| r.created_at.map_or(true, |at| at > since))
        .cloned()
        .collect()
}

/// Content of a new entry sent to the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub title: String,
    pub body: String,
    pub category: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub poll_options: Vec<String>,
}
