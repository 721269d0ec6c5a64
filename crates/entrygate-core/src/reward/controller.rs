//! Override controller.
//!
//! Turns a rewarded-ad view into a one-time bypass of the eligibility block.
//!
//! ## Transition table
//!
//! ```text
//! from            event                          to              effects
//! Idle            Start (blocked && ad ready)    AdPlaying       -
//! AdPlaying       RewardGranted                  RewardGranted   CancelReminder, SetOverrideActive(true)
//! AdPlaying       ClosedNoReward | LoadFailed    Idle            -
//! RewardGranted   SubmissionCompleted            Consumed        SetOverrideActive(false)
//! Consumed        Settle                         Idle            -
//! ```
//!
//! Any other pair is an invalid transition. The controller settles
//! `Consumed -> Idle` immediately after a consumption.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::token::OverrideToken;
use crate::error::OverrideError;
use crate::integrations::AdOutcome;
use crate::submission::SubmissionRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum OverrideState {
    Idle,
    AdPlaying,
    RewardGranted {
        token: OverrideToken,
        granted_at: DateTime<Utc>,
    },
    Consumed,
}

impl OverrideState {
    pub fn name(&self) -> &'static str {
        match self {
            OverrideState::Idle => "idle",
            OverrideState::AdPlaying => "ad_playing",
            OverrideState::RewardGranted { .. } => "reward_granted",
            OverrideState::Consumed => "consumed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideEvent {
    /// User asked to watch an ad. Carries the guard inputs.
    Start { blocked: bool, ad_ready: bool },
    Ad(AdOutcome),
    SubmissionCompleted,
    Settle,
}

impl OverrideEvent {
    fn name(&self) -> &'static str {
        match self {
            OverrideEvent::Start { .. } => "start",
            OverrideEvent::Ad(AdOutcome::RewardGranted) => "reward_granted",
            OverrideEvent::Ad(AdOutcome::ClosedNoReward) => "closed_no_reward",
            OverrideEvent::Ad(AdOutcome::LoadFailed) => "load_failed",
            OverrideEvent::SubmissionCompleted => "submission_completed",
            OverrideEvent::Settle => "settle",
        }
    }
}

/// Side effects the owner must apply after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideEffect {
    CancelReminder,
    SetOverrideActive(bool),
}

/// Pure transition function of the table above.
pub fn step(
    state: &OverrideState,
    event: OverrideEvent,
    now: DateTime<Utc>,
) -> Result<(OverrideState, Vec<OverrideEffect>), OverrideError> {
    use OverrideEffect::*;

    match (state, event) {
        (OverrideState::Idle, OverrideEvent::Start { blocked, ad_ready }) => {
            if !blocked {
                return Err(OverrideError::NotBlocked);
            }
            if !ad_ready {
                return Err(OverrideError::AdNotReady);
            }
            Ok((OverrideState::AdPlaying, vec![]))
        }
        (OverrideState::AdPlaying, OverrideEvent::Ad(AdOutcome::RewardGranted)) => Ok((
            OverrideState::RewardGranted {
                token: OverrideToken::generate(),
                granted_at: now,
            },
            vec![CancelReminder, SetOverrideActive(true)],
        )),
        (
            OverrideState::AdPlaying,
            OverrideEvent::Ad(AdOutcome::ClosedNoReward | AdOutcome::LoadFailed),
        ) => Ok((OverrideState::Idle, vec![])),
        (OverrideState::RewardGranted { .. }, OverrideEvent::SubmissionCompleted) => {
            Ok((OverrideState::Consumed, vec![SetOverrideActive(false)]))
        }
        (OverrideState::Consumed, OverrideEvent::Settle) => Ok((OverrideState::Idle, vec![])),
        (state, event) => Err(OverrideError::InvalidTransition {
            state: state.name().to_string(),
            event: event.name().to_string(),
        }),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideController {
    state: OverrideState,
}

impl Default for OverrideController {
    fn default() -> Self {
        Self {
            state: OverrideState::Idle,
        }
    }
}

impl OverrideController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &OverrideState {
        &self.state
    }

    /// Whether the eligibility block is currently bypassed.
    pub fn is_active(&self) -> bool {
        matches!(self.state, OverrideState::RewardGranted { .. })
    }

    /// Token to attach to the next submit request.
    pub fn token(&self) -> Option<&OverrideToken> {
        match &self.state {
            OverrideState::RewardGranted { token, .. } => Some(token),
            _ => None,
        }
    }

    /// Apply `event`, settling `Consumed` back to `Idle`.
    pub fn handle(
        &mut self,
        event: OverrideEvent,
        now: DateTime<Utc>,
    ) -> Result<Vec<OverrideEffect>, OverrideError> {
        let (next, mut effects) = step(&self.state, event, now)?;
        tracing::debug!(from = self.state.name(), to = next.name(), event = event.name(), "override transition");
        self.state = next;

        if self.state == OverrideState::Consumed {
            let (settled, more) = step(&self.state, OverrideEvent::Settle, now)?;
            self.state = settled;
            effects.extend(more);
        }
        Ok(effects)
    }

    /// Begin an ad view. Only allowed while blocked with a ready ad.
    pub fn start(
        &mut self,
        blocked: bool,
        ad_ready: bool,
        now: DateTime<Utc>,
    ) -> Result<Vec<OverrideEffect>, OverrideError> {
        self.handle(OverrideEvent::Start { blocked, ad_ready }, now)
    }

    /// Forward an ad provider callback.
    ///
    /// Callbacks outside `AdPlaying` (late or duplicate SDK events) are
    /// dropped rather than treated as errors.
    pub fn on_ad_outcome(&mut self, outcome: AdOutcome, now: DateTime<Utc>) -> Vec<OverrideEffect> {
        if self.state != OverrideState::AdPlaying {
            tracing::debug!(state = self.state.name(), ?outcome, "ignoring ad callback");
            return Vec::new();
        }
        self.handle(OverrideEvent::Ad(outcome), now)
            .unwrap_or_default()
    }

    /// A submission carrying the override token completed.
    pub fn on_submission_completed(&mut self, now: DateTime<Utc>) -> Vec<OverrideEffect> {
        if !self.is_active() {
            return Vec::new();
        }
        self.handle(OverrideEvent::SubmissionCompleted, now)
            .unwrap_or_default()
    }

    /// Consume the override if the history shows a pending record created
    /// after the reward was granted (e.g. submitted from another device).
    pub fn observe_history(
        &mut self,
        records: &[SubmissionRecord],
        now: DateTime<Utc>,
    ) -> Vec<OverrideEffect> {
        let granted_at = match &self.state {
            OverrideState::RewardGranted { granted_at, .. } => *granted_at,
            _ => return Vec::new(),
        };
        let new_pending = records
            .iter()
            .any(|r| r.is_pending() && r.created_at.is_some_and(|at| at >= granted_at));
        if new_pending {
            self.on_submission_completed(now)
        } else {
            Vec::new()
        }
    }

    /// Drop an ad view that a previous process started. Its callbacks died
    /// with that process, so `AdPlaying` can never complete on its own.
    /// Returns whether the state changed.
    pub fn settle_interrupted_ad(&mut self) -> bool {
        if self.state != OverrideState::AdPlaying {
            return false;
        }
        tracing::debug!("ad view interrupted by restart, returning to idle");
        self.state = OverrideState::Idle;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submission::SubmissionStatus;
    use chrono::Duration;

    fn granted(now: DateTime<Utc>) -> OverrideController {
        let mut ctl = OverrideController::new();
        ctl.start(true, true, now).unwrap();
        ctl.on_ad_outcome(AdOutcome::RewardGranted, now);
        ctl
    }

    #[test]
    fn full_cycle_returns_to_idle() {
        let now = Utc::now();
        let mut ctl = OverrideController::new();

        assert!(ctl.start(true, true, now).unwrap().is_empty());
        assert_eq!(ctl.state(), &OverrideState::AdPlaying);

        let effects = ctl.on_ad_outcome(AdOutcome::RewardGranted, now);
        assert_eq!(
            effects,
            vec![
                OverrideEffect::CancelReminder,
                OverrideEffect::SetOverrideActive(true)
            ]
        );
        assert!(ctl.is_active());
        assert!(ctl.token().is_some());

        let effects = ctl.on_submission_completed(now);
        assert_eq!(effects, vec![OverrideEffect::SetOverrideActive(false)]);
        assert_eq!(ctl.state(), &OverrideState::Idle);
        assert!(ctl.token().is_none());
    }

    #[test]
    fn start_requires_block_and_ready_ad() {
        let now = Utc::now();
        let mut ctl = OverrideController::new();
        assert_eq!(ctl.start(false, true, now), Err(OverrideError::NotBlocked));
        assert_eq!(ctl.start(true, false, now), Err(OverrideError::AdNotReady));
        assert_eq!(ctl.state(), &OverrideState::Idle);
    }

    #[test]
    fn closing_without_reward_goes_idle() {
        let now = Utc::now();
        let mut ctl = OverrideController::new();
        ctl.start(true, true, now).unwrap();
        assert!(ctl.on_ad_outcome(AdOutcome::ClosedNoReward, now).is_empty());
        assert_eq!(ctl.state(), &OverrideState::Idle);
        assert!(!ctl.is_active());
    }

    #[test]
    fn consumption_passes_through_consumed() {
        let now = Utc::now();
        let state = OverrideState::RewardGranted {
            token: OverrideToken::from("t"),
            granted_at: now,
        };
        let (next, effects) = step(&state, OverrideEvent::SubmissionCompleted, now).unwrap();
        assert_eq!(next, OverrideState::Consumed);
        assert_eq!(effects, vec![OverrideEffect::SetOverrideActive(false)]);
        let (next, _) = step(&next, OverrideEvent::Settle, now).unwrap();
        assert_eq!(next, OverrideState::Idle);
    }

    #[test]
    fn invalid_pairs_are_rejected() {
        let now = Utc::now();
        let err = step(&OverrideState::Idle, OverrideEvent::SubmissionCompleted, now).unwrap_err();
        assert_eq!(
            err,
            OverrideError::InvalidTransition {
                state: "idle".into(),
                event: "submission_completed".into()
            }
        );
        assert!(step(&OverrideState::AdPlaying, OverrideEvent::Start { blocked: true, ad_ready: true }, now).is_err());
    }

    #[test]
    fn duplicate_reward_callback_is_ignored() {
        let now = Utc::now();
        let mut ctl = granted(now);
        let token = ctl.token().cloned();
        assert!(ctl.on_ad_outcome(AdOutcome::RewardGranted, now).is_empty());
        assert_eq!(ctl.token().cloned(), token);
    }

    #[test]
    fn new_pending_record_consumes_override() {
        let now = Utc::now();
        let mut ctl = granted(now);

        let old = SubmissionRecord {
            id: "old".into(),
            status: SubmissionStatus::Pending,
            created_at: Some(now - Duration::hours(1)),
            status_changed_at: None,
        };
        assert!(ctl.observe_history(std::slice::from_ref(&old), now).is_empty());
        assert!(ctl.is_active());

        let fresh = SubmissionRecord {
            id: "fresh".into(),
            created_at: Some(now + Duration::seconds(5)),
            ..old.clone()
        };
        let effects = ctl.observe_history(&[old, fresh], now);
        assert_eq!(effects, vec![OverrideEffect::SetOverrideActive(false)]);
        assert!(!ctl.is_active());
    }

    #[test]
    fn interrupted_ad_settles_to_idle() {
        let now = Utc::now();
        let mut ctl = OverrideController::new();
        ctl.start(true, true, now).unwrap();

        let json = serde_json::to_string(&ctl).unwrap();
        let mut reloaded: OverrideController = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded.state(), &OverrideState::AdPlaying);

        assert!(reloaded.settle_interrupted_ad());
        assert_eq!(reloaded.state(), &OverrideState::Idle);
        assert!(reloaded.start(true, true, now).is_ok());
    }

    #[test]
    fn settling_leaves_granted_reward_alone() {
        let now = Utc::now();
        let mut ctl = granted(now);
        assert!(!ctl.settle_interrupted_ad());
        assert!(ctl.is_active());
    }

    #[test]
    fn controller_state_serializes() {
        let now = Utc::now();
        let ctl = granted(now);
        let json = serde_json::to_string(&ctl).unwrap();
        let back: OverrideController = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ctl);
    }
}
