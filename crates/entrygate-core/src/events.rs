use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::Tier;
use crate::integrations::{AdOutcome, ScheduleId};
use crate::submission::SubmissionStatus;

/// Every state change of a `SubmissionClient` produces an Event.
/// The CLI prints them as JSON; a UI layer would render from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// History was read; `tier` says where the records came from.
    HistoryRefreshed {
        count: usize,
        tier: Tier,
        offline: bool,
        at: DateTime<Utc>,
    },
    EligibilityChanged {
        blocked: bool,
        unlock_at: Option<DateTime<Utc>>,
        override_active: bool,
        at: DateTime<Utc>,
    },
    ReminderScheduled {
        schedule_id: ScheduleId,
        fire_at: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    ReminderCancelled {
        at: DateTime<Utc>,
    },
    CountdownTicked {
        remaining_secs: i64,
        label: String,
        can_act_now: bool,
        at: DateTime<Utc>,
    },
    /// Ad view started while blocked.
    OverrideStarted {
        at: DateTime<Utc>,
    },
    OverrideGranted {
        at: DateTime<Utc>,
    },
    /// Ad ended without a reward.
    OverrideClosed {
        outcome: AdOutcome,
        at: DateTime<Utc>,
    },
    OverrideConsumed {
        at: DateTime<Utc>,
    },
    SubmissionCreated {
        id: String,
        status: SubmissionStatus,
        with_override: bool,
        at: DateTime<Utc>,
    },
    DraftSaved {
        saved_at: DateTime<Utc>,
    },
    DraftCleared {
        at: DateTime<Utc>,
    },
}
