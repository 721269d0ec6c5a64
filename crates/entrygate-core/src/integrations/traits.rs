use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{NetworkError, ReminderError, SubmitError};
use crate::reward::OverrideToken;
use crate::submission::{SubmissionPayload, SubmissionRecord};

/// The publishing platform's submission API.
pub trait SubmissionBackend {
    /// Records created within the trailing `window`.
    fn list_recent(&self, window: Duration) -> Result<Vec<SubmissionRecord>, NetworkError>;

    /// Create a new entry. On success the returned record is `pending`.
    fn submit(
        &self,
        payload: &SubmissionPayload,
        override_token: Option<&OverrideToken>,
    ) -> Result<SubmissionRecord, SubmitError>;
}

/// What the ad provider reported after an ad was requested or shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdOutcome {
    RewardGranted,
    ClosedNoReward,
    LoadFailed,
}

/// Rewarded-ad mediation SDK.
///
/// Outcomes are delivered asynchronously; the caller polls `next_outcome`
/// and forwards each one to the override controller.
pub trait RewardAdProvider {
    fn request_load(&mut self);

    fn is_ready(&self) -> bool;

    /// Present the loaded ad.
    fn show(&mut self);

    fn next_outcome(&mut self) -> Option<AdOutcome>;
}

/// Opaque id returned by the reminder scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScheduleId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderPayload {
    pub title: String,
    pub body: String,
}

/// OS-level one-shot reminders. Reminders outlive the process.
pub trait ReminderScheduler {
    /// Schedule a reminder under logical `id`, replacing any previous one
    /// with the same id.
    fn schedule(
        &self,
        id: &str,
        fire_at: DateTime<Utc>,
        payload: &ReminderPayload,
    ) -> Result<ScheduleId, ReminderError>;

    fn cancel(&self, schedule_id: &ScheduleId) -> Result<(), ReminderError>;
}

impl<T: ReminderScheduler + ?Sized> ReminderScheduler for Arc<T> {
    fn schedule(
        &self,
        id: &str,
        fire_at: DateTime<Utc>,
        payload: &ReminderPayload,
    ) -> Result<ScheduleId, ReminderError> {
        (**self).schedule(id, fire_at, payload)
    }

    fn cancel(&self, schedule_id: &ScheduleId) -> Result<(), ReminderError> {
        (**self).cancel(schedule_id)
    }
}
