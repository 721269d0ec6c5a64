//! Eligibility evaluator.
//!
//! A pure function of the history snapshot, the quota, the override flag and
//! the evaluation time. Nothing here is stored; the caller recomputes on every
//! history refresh, tick, or override change.
//!
//! ## Decision order
//!
//! ```text
//! count < quota                 -> open
//! any cooldown end > now        -> blocked until the earliest one
//! any pending record            -> blocked, unlock time unknown
//! otherwise                     -> open
//! override active               -> open (applied last, quota untouched)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::policy::CooldownPolicy;
use crate::submission::SubmissionRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityState {
    pub blocked: bool,
    /// Earliest moment the block lifts. Always after the evaluation time.
    pub unlock_at: Option<DateTime<Utc>>,
    pub override_active: bool,
}

impl EligibilityState {
    fn open(override_active: bool) -> Self {
        Self {
            blocked: false,
            unlock_at: None,
            override_active,
        }
    }
}

/// When the cooldown started by `record` ends.
///
/// Pending records and records without `status_changed_at` yield `None`.
pub fn cooldown_end(record: &SubmissionRecord, policy: &CooldownPolicy) -> Option<DateTime<Utc>> {
    let duration = policy.duration_for(record.status)?;
    let changed_at = record.status_changed_at?;
    Some(changed_at + duration)
}

/// Evaluate eligibility for `records` (the trailing window) at `now`.
pub fn evaluate(
    records: &[SubmissionRecord],
    quota: u32,
    override_active: bool,
    policy: &CooldownPolicy,
    now: DateTime<Utc>,
) -> EligibilityState {
    if (records.len() as u64) < quota as u64 {
        return EligibilityState::open(override_active);
    }

    let unlock_at = records
        .iter()
        .filter_map(|r| cooldown_end(r, policy))
        .filter(|end| *end > now)
        .min();
    let has_pending = records.iter().any(SubmissionRecord::is_pending);

    let blocked = unlock_at.is_some() || has_pending;
    if !blocked {
        return EligibilityState::open(override_active);
    }

    EligibilityState {
        blocked: !override_active,
        unlock_at,
        override_active,
    }
}
