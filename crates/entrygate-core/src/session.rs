//! Submission client: the five components wired together for one user.
//!
//! History flows through the tiered cache into the evaluator; the resulting
//! unlock time drives the reminder and the countdown. Override effects are
//! applied here, and the draft is cleared once a submission goes through.
//!
//! Every operation takes `now` and returns the events it produced.
//!
//! Reads are two-phase: `open_history` answers from memory or disk at once,
//! and `revalidate` runs the network fetch that `open_history` asked for.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::cache::{FetchApplied, FetchTicket, Tier, TieredCache};
use crate::cooldown::{Countdown, CooldownScheduler, TrackedReminder};
use crate::draft::{DraftManager, FormState};
use crate::eligibility::{evaluate, CooldownPolicy, EligibilityState};
use crate::error::{CoreError, Result, SubmitError};
use crate::events::Event;
use crate::integrations::{AdOutcome, ReminderScheduler, RewardAdProvider, SubmissionBackend};
use crate::reward::{OverrideController, OverrideEffect, OverrideState};
use crate::storage::{keys, Config, SharedStore};
use crate::submission::{trailing_window, SubmissionPayload, SubmissionRecord};

/// Cache resource name of the trailing submission history.
pub const HISTORY_RESOURCE: &str = "history";

/// History as served by the fastest tier, before any network round trip.
#[derive(Debug, Clone)]
pub struct HistorySnapshot {
    pub records: Vec<SubmissionRecord>,
    pub eligibility: EligibilityState,
    pub tier: Tier,
    pub offline: bool,
    /// Set when memory was cold; pass the snapshot to `revalidate`.
    pub fetch: Option<FetchTicket>,
}

pub struct SubmissionClient<B, R> {
    backend: B,
    store: SharedStore,
    user_id: String,
    quota: u32,
    cooldown: CooldownPolicy,
    history: TieredCache<Vec<SubmissionRecord>>,
    overrides: OverrideController,
    reminders: CooldownScheduler<R>,
    countdown: Countdown,
    drafts: DraftManager,
    last_eligibility: Option<EligibilityState>,
    poll_interval: Duration,
    last_fetch_at: Option<DateTime<Utc>>,
}

impl<B, R> SubmissionClient<B, R>
where
    B: SubmissionBackend,
    R: ReminderScheduler,
{
    pub fn new(config: &Config, backend: B, reminders: R, store: SharedStore) -> Self {
        let user_id = config.profile.user_id.clone();
        let debounce = Duration::milliseconds(config.draft.debounce_ms as i64);
        Self {
            overrides: load_overrides(&store, &user_id),
            history: TieredCache::new(Arc::clone(&store), user_id.clone()),
            reminders: CooldownScheduler::new(reminders, Arc::clone(&store), user_id.clone()),
            drafts: DraftManager::new(Arc::clone(&store), &user_id, debounce),
            countdown: Countdown::default(),
            quota: config.quota(),
            cooldown: config.cooldown.clone(),
            backend,
            store,
            user_id,
            last_eligibility: None,
            poll_interval: Duration::seconds(config.cache.poll_interval_secs as i64),
            last_fetch_at: None,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn quota(&self) -> u32 {
        self.quota
    }

    pub fn override_state(&self) -> &OverrideState {
        self.overrides.state()
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    pub fn tracked_reminder(&self) -> Option<TrackedReminder> {
        self.reminders.tracked()
    }

    pub fn reminders_enabled(&self) -> bool {
        self.reminders.is_enabled()
    }

    /// Whether the last history fetch failed.
    pub fn is_offline(&self) -> bool {
        self.history.is_offline(HISTORY_RESOURCE)
    }

    /// Best synchronously available history, without touching the network.
    pub fn cached_history(&mut self) -> Vec<SubmissionRecord> {
        if self.history.peek(HISTORY_RESOURCE).is_none() {
            // Hydrates memory from disk. Callers that want the revalidating
            // fetch go through `open_history` instead.
            let _ = self.history.read(HISTORY_RESOURCE);
        }
        self.history
            .peek(HISTORY_RESOURCE)
            .map(|entry| entry.payload.clone())
            .unwrap_or_default()
    }

    /// Serve history from memory or disk and evaluate it, without waiting on
    /// the network. A cold memory tier leaves a ticket in `fetch`.
    pub fn open_history(&mut self, now: DateTime<Utc>) -> HistorySnapshot {
        let read = self.history.read(HISTORY_RESOURCE);
        let records = read.entry.map(|entry| entry.payload).unwrap_or_default();
        let eligibility = self.evaluate_records(&records, now);
        HistorySnapshot {
            records,
            eligibility,
            tier: read.tier,
            offline: self.is_offline(),
            fetch: read.fetch,
        }
    }

    /// Fetch history for `snapshot` from the backend and re-evaluate.
    ///
    /// A failed fetch is absorbed: the cached records stay in place and the
    /// refresh reports `offline`. A result overtaken by a newer fetch yields
    /// no events.
    pub fn revalidate(&mut self, snapshot: HistorySnapshot, now: DateTime<Utc>) -> Vec<Event> {
        let ticket = snapshot
            .fetch
            .unwrap_or_else(|| self.history.begin_fetch(HISTORY_RESOURCE));
        let result = self.backend.list_recent(self.cooldown.window());
        self.last_fetch_at = Some(now);
        if self.history.complete(ticket, result, now) == FetchApplied::Discarded {
            return Vec::new();
        }

        let records = self.cached_history();
        let mut events = vec![Event::HistoryRefreshed {
            count: records.len(),
            tier: snapshot.tier,
            offline: self.is_offline(),
            at: now,
        }];

        let effects = self.overrides.observe_history(&records, now);
        events.extend(self.apply_effects(&effects, now));
        events.extend(self.reevaluate(now));
        events
    }

    /// Open and revalidate in one step; blocks on the backend.
    pub fn refresh_history(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let snapshot = self.open_history(now);
        self.revalidate(snapshot, now)
    }

    /// Refresh when `cache.poll_interval_secs` has passed since the last
    /// fetch, so an offline history is retried while a view stays open.
    pub fn poll_history(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let fresh = self
            .last_fetch_at
            .is_some_and(|at| now - at < self.poll_interval);
        if fresh {
            return Vec::new();
        }
        self.refresh_history(now)
    }

    /// Evaluate eligibility from the cached history at `now`.
    pub fn eligibility(&mut self, now: DateTime<Utc>) -> EligibilityState {
        let records = self.cached_history();
        self.evaluate_records(&records, now)
    }

    fn evaluate_records(&self, records: &[SubmissionRecord], now: DateTime<Utc>) -> EligibilityState {
        let records = trailing_window(records, now, self.cooldown.window());
        evaluate(
            &records,
            self.quota,
            self.overrides.is_active(),
            &self.cooldown,
            now,
        )
    }

    /// Send a new entry.
    ///
    /// Refused with `CoreError::Blocked` while blocked. A backend refusal is
    /// returned as `CoreError::SubmissionRejected` and leaves the draft and
    /// any override in place.
    pub fn submit(&mut self, payload: &SubmissionPayload, now: DateTime<Utc>) -> Result<Vec<Event>> {
        let state = self.eligibility(now);
        if state.blocked {
            return Err(CoreError::Blocked {
                unlock_at: state.unlock_at,
            });
        }

        let token = self.overrides.token().cloned();
        let record = match self.backend.submit(payload, token.as_ref()) {
            Ok(record) => record,
            Err(SubmitError::Rejected { reason }) => {
                tracing::warn!(%reason, "submission rejected");
                return Err(CoreError::SubmissionRejected { reason });
            }
            Err(SubmitError::Network(e)) => return Err(e.into()),
        };
        tracing::info!(id = %record.id, with_override = token.is_some(), "submission created");

        let mut events = vec![Event::SubmissionCreated {
            id: record.id.clone(),
            status: record.status,
            with_override: token.is_some(),
            at: now,
        }];

        let effects = self.overrides.on_submission_completed(now);
        events.extend(self.apply_effects(&effects, now));

        self.drafts.clear();
        events.push(Event::DraftCleared { at: now });

        events.extend(self.refresh_history(now));
        Ok(events)
    }

    /// Start a rewarded ad. Only allowed while blocked.
    pub fn start_reward<A: RewardAdProvider>(
        &mut self,
        ads: &mut A,
        now: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        let blocked = self.eligibility(now).blocked;
        if blocked && !ads.is_ready() {
            ads.request_load();
        }
        self.overrides.start(blocked, ads.is_ready(), now)?;
        self.save_overrides();
        ads.show();
        Ok(vec![Event::OverrideStarted { at: now }])
    }

    /// Forward one ad provider callback.
    pub fn on_ad_outcome(&mut self, outcome: AdOutcome, now: DateTime<Utc>) -> Vec<Event> {
        let was_playing = *self.overrides.state() == OverrideState::AdPlaying;
        let effects = self.overrides.on_ad_outcome(outcome, now);
        self.save_overrides();

        let mut events = Vec::new();
        if was_playing && *self.overrides.state() == OverrideState::Idle {
            events.push(Event::OverrideClosed { outcome, at: now });
        }
        events.extend(self.apply_effects(&effects, now));
        if !effects.is_empty() {
            events.extend(self.reevaluate(now));
        }
        events
    }

    /// Drain every outcome the provider has queued.
    pub fn pump_ad_outcomes<A: RewardAdProvider>(&mut self, ads: &mut A, now: DateTime<Utc>) -> Vec<Event> {
        let mut events = Vec::new();
        while let Some(outcome) = ads.next_outcome() {
            events.extend(self.on_ad_outcome(outcome, now));
        }
        events
    }

    /// Per-second work: fire a due draft save and advance the countdown.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let mut events = Vec::new();
        if let Some(draft) = self.drafts.poll(now) {
            events.push(Event::DraftSaved {
                saved_at: draft.saved_at,
            });
        }
        if let Some(tick) = self.countdown.tick(now) {
            events.push(Event::CountdownTicked {
                remaining_secs: tick.remaining_secs,
                label: tick.label,
                can_act_now: tick.can_act_now,
                at: now,
            });
        }
        events
    }

    /// Form changed; queue a debounced draft save.
    pub fn draft_changed(&mut self, form: &FormState, now: DateTime<Utc>) -> bool {
        self.drafts.on_change(form, now)
    }

    /// Write any queued draft immediately.
    pub fn flush_draft(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        self.drafts
            .flush(now)
            .map(|draft| Event::DraftSaved {
                saved_at: draft.saved_at,
            })
            .into_iter()
            .collect()
    }

    /// Restore the stored draft onto `form`; returns the fields applied.
    pub fn restore_draft(&mut self, form: &mut FormState) -> Vec<&'static str> {
        self.drafts.restore(form)
    }

    pub fn clear_draft(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        self.drafts.clear();
        vec![Event::DraftCleared { at: now }]
    }

    /// Owning view went away: stop the countdown and drop queued saves.
    /// The OS reminder is left in place.
    pub fn unmount(&mut self) {
        self.drafts.unmount();
        self.countdown.stop();
    }

    /// Owning view is back; the countdown ticks again.
    pub fn mount(&mut self) {
        self.countdown.resume();
    }

    /// Re-evaluate and keep the reminder and countdown in step with the result.
    fn reevaluate(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let state = self.eligibility(now);
        let mut events = Vec::new();

        if self.last_eligibility != Some(state) {
            events.push(Event::EligibilityChanged {
                blocked: state.blocked,
                unlock_at: state.unlock_at,
                override_active: state.override_active,
                at: now,
            });
            self.last_eligibility = Some(state);
        }

        let target = if state.blocked { state.unlock_at } else { None };
        self.countdown.set_target(target);

        match target {
            Some(unlock_at) => {
                let before = self.reminders.tracked().map(|t| t.schedule_id);
                if let Some(schedule_id) = self.reminders.schedule(unlock_at, now) {
                    if before.as_ref() != Some(&schedule_id) {
                        events.push(Event::ReminderScheduled {
                            schedule_id,
                            fire_at: unlock_at,
                            at: now,
                        });
                    }
                }
            }
            None => {
                if self.reminders.cancel() {
                    events.push(Event::ReminderCancelled { at: now });
                }
            }
        }
        events
    }

    fn apply_effects(&mut self, effects: &[OverrideEffect], now: DateTime<Utc>) -> Vec<Event> {
        let mut events = Vec::new();
        for effect in effects {
            match effect {
                OverrideEffect::CancelReminder => {
                    if self.reminders.cancel() {
                        events.push(Event::ReminderCancelled { at: now });
                    }
                }
                OverrideEffect::SetOverrideActive(true) => {
                    events.push(Event::OverrideGranted { at: now });
                }
                OverrideEffect::SetOverrideActive(false) => {
                    events.push(Event::OverrideConsumed { at: now });
                }
            }
        }
        if !effects.is_empty() {
            self.save_overrides();
        }
        events
    }

    fn save_overrides(&self) {
        let result = serde_json::to_string(&self.overrides)
            .map_err(|e| e.to_string())
            .and_then(|json| {
                self.store
                    .set(&keys::override_state(&self.user_id), &json)
                    .map_err(|e| e.to_string())
            });
        if let Err(e) = result {
            tracing::warn!(error = %e, "could not persist override state");
        }
    }
}

fn load_overrides(store: &SharedStore, user_id: &str) -> OverrideController {
    let key = keys::override_state(user_id);
    match store.get(&key) {
        Ok(Some(json)) => {
            let mut controller: OverrideController = serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "discarding unreadable override state");
                OverrideController::default()
            });
            controller.settle_interrupted_ad();
            controller
        }
        Ok(None) => OverrideController::default(),
        Err(e) => {
            tracing::warn!(error = %e, "could not read override state");
            OverrideController::default()
        }
    }
}

/// Tier label for display.
pub fn tier_label(tier: Tier) -> &'static str {
    match tier {
        Tier::Memory => "memory",
        Tier::Persistent => "persistent",
        Tier::None => "none",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{NetworkError, ReminderError};
    use crate::integrations::{ReminderPayload, ScheduleId, ScriptedAdProvider};
    use crate::reward::OverrideToken;
    use crate::storage::MemoryStore;
    use crate::submission::SubmissionStatus;
    use std::cell::RefCell;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeBackend {
        records: RefCell<Vec<SubmissionRecord>>,
        fail_list: RefCell<bool>,
        list_calls: RefCell<usize>,
        reject: RefCell<Option<String>>,
        tokens_seen: RefCell<Vec<Option<String>>>,
    }

    impl SubmissionBackend for FakeBackend {
        fn list_recent(&self, _window: Duration) -> std::result::Result<Vec<SubmissionRecord>, NetworkError> {
            *self.list_calls.borrow_mut() += 1;
            if *self.fail_list.borrow() {
                return Err(NetworkError::Timeout);
            }
            Ok(self.records.borrow().clone())
        }

        fn submit(
            &self,
            _payload: &SubmissionPayload,
            token: Option<&OverrideToken>,
        ) -> std::result::Result<SubmissionRecord, SubmitError> {
            self.tokens_seen
                .borrow_mut()
                .push(token.map(|t| t.as_str().to_string()));
            if let Some(reason) = self.reject.borrow().clone() {
                return Err(SubmitError::Rejected { reason });
            }
            let record = SubmissionRecord {
                id: format!("new-{}", self.records.borrow().len()),
                status: SubmissionStatus::Pending,
                created_at: Some(Utc::now()),
                status_changed_at: None,
            };
            self.records.borrow_mut().push(record.clone());
            Ok(record)
        }
    }

    #[derive(Default)]
    struct Reminders {
        live: Mutex<Vec<ScheduleId>>,
        next: Mutex<u32>,
    }

    impl ReminderScheduler for Reminders {
        fn schedule(
            &self,
            _id: &str,
            _fire_at: DateTime<Utc>,
            _payload: &ReminderPayload,
        ) -> std::result::Result<ScheduleId, ReminderError> {
            let mut next = self.next.lock().unwrap();
            *next += 1;
            let id = ScheduleId(next.to_string());
            let mut live = self.live.lock().unwrap();
            live.clear();
            live.push(id.clone());
            Ok(id)
        }

        fn cancel(&self, schedule_id: &ScheduleId) -> std::result::Result<(), ReminderError> {
            self.live.lock().unwrap().retain(|id| id != schedule_id);
            Ok(())
        }
    }

    fn approved(hours_ago: i64, now: DateTime<Utc>) -> SubmissionRecord {
        SubmissionRecord {
            id: format!("a{hours_ago}"),
            status: SubmissionStatus::Approved,
            created_at: Some(now - Duration::hours(hours_ago) - Duration::minutes(30)),
            status_changed_at: Some(now - Duration::hours(hours_ago)),
        }
    }

    fn client(
        backend: FakeBackend,
        reminders: Arc<Reminders>,
    ) -> SubmissionClient<FakeBackend, Arc<Reminders>> {
        client_on(backend, reminders, Arc::new(MemoryStore::new()))
    }

    fn client_on(
        backend: FakeBackend,
        reminders: Arc<Reminders>,
        store: SharedStore,
    ) -> SubmissionClient<FakeBackend, Arc<Reminders>> {
        let mut config = Config::default();
        config.profile.rank = "newcomer".into();
        SubmissionClient::new(&config, backend, reminders, store)
    }

    #[test]
    fn blocked_refresh_schedules_reminder() {
        let now = Utc::now();
        let backend = FakeBackend::default();
        backend.records.borrow_mut().push(approved(19, now));
        let reminders = Arc::new(Reminders::default());
        let mut c = client(backend, Arc::clone(&reminders));

        let events = c.refresh_history(now);
        assert!(events.iter().any(|e| matches!(
            e,
            Event::EligibilityChanged { blocked: true, unlock_at: Some(_), .. }
        )));
        assert!(events.iter().any(|e| matches!(e, Event::ReminderScheduled { .. })));
        assert_eq!(reminders.live.lock().unwrap().len(), 1);
        assert_eq!(c.countdown().target(), Some(now + Duration::hours(5)));

        // Same unlock time again: no new reminder, no new eligibility event.
        let events = c.refresh_history(now + Duration::seconds(1));
        assert!(!events.iter().any(|e| matches!(e, Event::ReminderScheduled { .. })));
        assert!(!events.iter().any(|e| matches!(e, Event::EligibilityChanged { .. })));
    }

    #[test]
    fn submit_while_blocked_is_refused() {
        let now = Utc::now();
        let backend = FakeBackend::default();
        backend.records.borrow_mut().push(approved(1, now));
        let mut c = client(backend, Arc::new(Reminders::default()));
        c.refresh_history(now);

        let err = c.submit(&SubmissionPayload::default(), now).unwrap_err();
        assert!(matches!(err, CoreError::Blocked { unlock_at: Some(_) }));
    }

    #[test]
    fn reward_unblocks_and_submit_consumes() {
        let now = Utc::now();
        let backend = FakeBackend::default();
        backend.records.borrow_mut().push(approved(19, now));
        let reminders = Arc::new(Reminders::default());
        let mut c = client(backend, Arc::clone(&reminders));
        c.refresh_history(now);

        let mut ads = ScriptedAdProvider::new([AdOutcome::RewardGranted]);
        c.start_reward(&mut ads, now).unwrap();
        let events = c.pump_ad_outcomes(&mut ads, now);
        assert!(events.contains(&Event::OverrideGranted { at: now }));
        assert!(events.contains(&Event::ReminderCancelled { at: now }));
        assert!(reminders.live.lock().unwrap().is_empty());
        assert!(!c.eligibility(now).blocked);

        let events = c.submit(&SubmissionPayload::default(), now).unwrap();
        assert!(events.contains(&Event::OverrideConsumed { at: now }));
        assert!(!c.eligibility(now).override_active);
        assert!(c.eligibility(now).blocked);
        assert!(c.backend.tokens_seen.borrow()[0].is_some());
    }

    #[test]
    fn start_reward_requires_block() {
        let now = Utc::now();
        let mut c = client(FakeBackend::default(), Arc::new(Reminders::default()));
        c.refresh_history(now);
        let mut ads = ScriptedAdProvider::new([AdOutcome::RewardGranted]);
        let err = c.start_reward(&mut ads, now).unwrap_err();
        assert!(matches!(err, CoreError::Override(_)));
    }

    #[test]
    fn closed_ad_returns_to_idle() {
        let now = Utc::now();
        let backend = FakeBackend::default();
        backend.records.borrow_mut().push(approved(19, now));
        let mut c = client(backend, Arc::new(Reminders::default()));
        c.refresh_history(now);

        let mut ads = ScriptedAdProvider::new([AdOutcome::ClosedNoReward]);
        c.start_reward(&mut ads, now).unwrap();
        let events = c.pump_ad_outcomes(&mut ads, now);
        assert_eq!(
            events,
            vec![Event::OverrideClosed {
                outcome: AdOutcome::ClosedNoReward,
                at: now
            }]
        );
        assert!(c.eligibility(now).blocked);
    }

    #[test]
    fn rejection_keeps_draft() {
        let now = Utc::now();
        let backend = FakeBackend::default();
        *backend.reject.borrow_mut() = Some("duplicate title".into());
        let mut c = client(backend, Arc::new(Reminders::default()));

        let form = FormState {
            title: "kept".into(),
            ..FormState::default()
        };
        c.draft_changed(&form, now);
        c.flush_draft(now);

        let err = c.submit(&SubmissionPayload::default(), now).unwrap_err();
        match err {
            CoreError::SubmissionRejected { reason } => assert_eq!(reason, "duplicate title"),
            other => panic!("unexpected error: {other}"),
        }
        let mut restored = FormState::default();
        c.restore_draft(&mut restored);
        assert_eq!(restored.title, "kept");
    }

    #[test]
    fn offline_refresh_keeps_cached_history() {
        let now = Utc::now();
        let backend = FakeBackend::default();
        backend.records.borrow_mut().push(approved(30, now));
        let mut c = client(backend, Arc::new(Reminders::default()));
        c.refresh_history(now);

        *c.backend.fail_list.borrow_mut() = true;
        let events = c.refresh_history(now + Duration::seconds(30));
        assert!(matches!(
            events[0],
            Event::HistoryRefreshed { count: 1, offline: true, tier: Tier::Memory, .. }
        ));
        assert!(c.is_offline());
    }

    #[test]
    fn tick_fires_draft_save_and_countdown() {
        let now = Utc::now();
        let backend = FakeBackend::default();
        backend.records.borrow_mut().push(approved(23, now));
        let mut c = client(backend, Arc::new(Reminders::default()));
        c.refresh_history(now);

        let form = FormState {
            title: "Hello".into(),
            ..FormState::default()
        };
        c.draft_changed(&form, now);
        let events = c.tick(now + Duration::milliseconds(1500));
        assert!(matches!(events[0], Event::DraftSaved { .. }));
        assert!(matches!(
            &events[1],
            Event::CountdownTicked { label, can_act_now: false, .. } if label == "59m 58s"
        ));

        c.unmount();
        assert!(c.tick(now + Duration::seconds(3)).is_empty());
    }

    #[test]
    fn remounted_view_ticks_again() {
        let now = Utc::now();
        let backend = FakeBackend::default();
        backend.records.borrow_mut().push(approved(19, now));
        let mut c = client(backend, Arc::new(Reminders::default()));
        c.refresh_history(now);

        c.unmount();
        assert!(c.tick(now + Duration::seconds(1)).is_empty());

        c.mount();
        let events = c.tick(now + Duration::seconds(2));
        assert!(matches!(
            &events[0],
            Event::CountdownTicked { label, .. } if label == "4h 59m 58s"
        ));
    }

    #[test]
    fn ad_view_cut_short_by_restart_can_be_retried() {
        let now = Utc::now();
        let store: SharedStore = Arc::new(MemoryStore::new());
        let history = vec![approved(19, now)];

        {
            let backend = FakeBackend::default();
            *backend.records.borrow_mut() = history.clone();
            let mut c = client_on(backend, Arc::new(Reminders::default()), Arc::clone(&store));
            c.refresh_history(now);
            let mut ads = ScriptedAdProvider::new([AdOutcome::RewardGranted]);
            c.start_reward(&mut ads, now).unwrap();
            assert_eq!(c.override_state(), &OverrideState::AdPlaying);
            // Process dies before the ad reports back.
        }

        let backend = FakeBackend::default();
        *backend.records.borrow_mut() = history;
        let mut c = client_on(backend, Arc::new(Reminders::default()), store);
        assert_eq!(c.override_state(), &OverrideState::Idle);

        c.refresh_history(now);
        let mut ads = ScriptedAdProvider::new([AdOutcome::RewardGranted]);
        c.start_reward(&mut ads, now).unwrap();
        c.pump_ad_outcomes(&mut ads, now);
        assert!(c.eligibility(now).override_active);
    }

    #[test]
    fn cold_open_paints_from_disk_then_revalidates() {
        let now = Utc::now();
        let store: SharedStore = Arc::new(MemoryStore::new());
        let backend = FakeBackend::default();
        backend.records.borrow_mut().push(approved(19, now));
        client_on(backend, Arc::new(Reminders::default()), Arc::clone(&store)).refresh_history(now);

        let backend = FakeBackend::default();
        backend.records.borrow_mut().push(approved(19, now));
        backend.records.borrow_mut().push(approved(1, now));
        let mut c = client_on(backend, Arc::new(Reminders::default()), store);

        let snapshot = c.open_history(now);
        assert_eq!(snapshot.tier, Tier::Persistent);
        assert_eq!(snapshot.records.len(), 1);
        assert!(snapshot.eligibility.blocked);
        assert!(snapshot.fetch.is_some());
        assert_eq!(*c.backend.list_calls.borrow(), 0);

        let events = c.revalidate(snapshot, now);
        assert_eq!(*c.backend.list_calls.borrow(), 1);
        assert!(matches!(
            events[0],
            Event::HistoryRefreshed { count: 2, tier: Tier::Persistent, offline: false, .. }
        ));

        let warm = c.open_history(now);
        assert_eq!(warm.tier, Tier::Memory);
        assert_eq!(warm.records.len(), 2);
        assert!(warm.fetch.is_none());
    }

    #[test]
    fn poll_retries_offline_history_each_interval() {
        let now = Utc::now();
        let backend = FakeBackend::default();
        backend.records.borrow_mut().push(approved(30, now));
        *backend.fail_list.borrow_mut() = true;
        let mut c = client(backend, Arc::new(Reminders::default()));

        let events = c.poll_history(now);
        assert!(matches!(events[0], Event::HistoryRefreshed { offline: true, .. }));
        assert!(c.is_offline());

        assert!(c.poll_history(now + Duration::seconds(29)).is_empty());
        assert_eq!(*c.backend.list_calls.borrow(), 1);

        *c.backend.fail_list.borrow_mut() = false;
        let events = c.poll_history(now + Duration::seconds(30));
        assert!(matches!(
            events[0],
            Event::HistoryRefreshed { count: 1, offline: false, .. }
        ));
        assert!(!c.is_offline());
        assert_eq!(*c.backend.list_calls.borrow(), 2);
    }

    #[test]
    fn tier_labels() {
        assert_eq!(tier_label(Tier::Memory), "memory");
        assert_eq!(tier_label(Tier::None), "none");
    }
}
