//! Local reminder for when the cooldown lifts.
//!
//! One reminder per user at a time: it is keyed by a fixed logical id and the
//! schedule id handed back by the OS is persisted so a later process can
//! cancel it. Reminder failures never propagate; the in-memory countdown keeps
//! working without them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ReminderError;
use crate::integrations::{ReminderPayload, ReminderScheduler, ScheduleId};
use crate::storage::{keys, SharedStore};

const REMINDER_ID: &str = "submission-cooldown";

/// What is persisted about the live reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedReminder {
    pub schedule_id: ScheduleId,
    pub fire_at: DateTime<Utc>,
}

pub struct CooldownScheduler<R> {
    reminders: R,
    store: SharedStore,
    user_id: String,
    enabled: bool,
}

impl<R: ReminderScheduler> CooldownScheduler<R> {
    pub fn new(reminders: R, store: SharedStore, user_id: impl Into<String>) -> Self {
        Self {
            reminders,
            store,
            user_id: user_id.into(),
            enabled: true,
        }
    }

    /// False once the platform has denied reminder permission this session.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn logical_id(&self) -> String {
        format!("{REMINDER_ID}:{}", self.user_id)
    }

    /// The reminder currently on record, if any.
    pub fn tracked(&self) -> Option<TrackedReminder> {
        let key = keys::reminder(&self.user_id);
        match self.store.get(&key) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(tracked) => Some(tracked),
                Err(e) => {
                    tracing::warn!(error = %e, "discarding unreadable reminder record");
                    if let Err(e) = self.store.remove(&key) {
                        tracing::warn!(error = %e, "could not remove unreadable reminder record");
                    }
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "could not read reminder record");
                None
            }
        }
    }

    /// Point the reminder at `unlock_at`.
    ///
    /// Re-scheduling the same time is a no-op. Otherwise the tracked reminder
    /// is cancelled first; if `unlock_at` is not in the future nothing new is
    /// scheduled.
    pub fn schedule(&mut self, unlock_at: DateTime<Utc>, now: DateTime<Utc>) -> Option<ScheduleId> {
        if let Some(tracked) = self.tracked() {
            if tracked.fire_at == unlock_at && unlock_at > now && self.enabled {
                return Some(tracked.schedule_id);
            }
        }
        self.cancel();

        if unlock_at <= now || !self.enabled {
            return None;
        }

        let payload = ReminderPayload {
            title: "You can post again".into(),
            body: "Your submission cooldown has ended.".into(),
        };
        match self.reminders.schedule(&self.logical_id(), unlock_at, &payload) {
            Ok(schedule_id) => {
                tracing::debug!(%unlock_at, schedule_id = %schedule_id.0, "reminder scheduled");
                self.remember(TrackedReminder {
                    schedule_id: schedule_id.clone(),
                    fire_at: unlock_at,
                });
                Some(schedule_id)
            }
            Err(ReminderError::PermissionDenied) => {
                tracing::warn!("reminder permission denied, disabling reminders for this session");
                self.enabled = false;
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not schedule reminder");
                None
            }
        }
    }

    /// Cancel the tracked reminder, if any. Returns whether one was tracked.
    pub fn cancel(&mut self) -> bool {
        let Some(tracked) = self.tracked() else {
            return false;
        };
        if let Err(e) = self.reminders.cancel(&tracked.schedule_id) {
            tracing::warn!(error = %e, schedule_id = %tracked.schedule_id.0, "could not cancel reminder");
        } else {
            tracing::debug!(schedule_id = %tracked.schedule_id.0, "reminder cancelled");
        }
        if let Err(e) = self.store.remove(&keys::reminder(&self.user_id)) {
            tracing::warn!(error = %e, "could not forget reminder record");
        }
        true
    }

    fn remember(&self, tracked: TrackedReminder) {
        let result = serde_json::to_string(&tracked)
            .map_err(|e| e.to_string())
            .and_then(|json| {
                self.store
                    .set(&keys::reminder(&self.user_id), &json)
                    .map_err(|e| e.to_string())
            });
        if let Err(e) = result {
            tracing::warn!(error = %e, "could not persist reminder record");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::Duration;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct FakeReminders {
        next: Mutex<u32>,
        live: Mutex<Vec<(ScheduleId, String, DateTime<Utc>)>>,
        deny: bool,
    }

    impl ReminderScheduler for FakeReminders {
        fn schedule(
            &self,
            id: &str,
            fire_at: DateTime<Utc>,
            _payload: &ReminderPayload,
        ) -> Result<ScheduleId, ReminderError> {
            if self.deny {
                return Err(ReminderError::PermissionDenied);
            }
            let mut next = self.next.lock().unwrap();
            *next += 1;
            let sid = ScheduleId(format!("s{next}"));
            self.live
                .lock()
                .unwrap()
                .push((sid.clone(), id.to_string(), fire_at));
            Ok(sid)
        }

        fn cancel(&self, schedule_id: &ScheduleId) -> Result<(), ReminderError> {
            self.live.lock().unwrap().retain(|(sid, _, _)| sid != schedule_id);
            Ok(())
        }
    }

    fn scheduler(fake: Arc<FakeReminders>) -> CooldownScheduler<Arc<FakeReminders>> {
        CooldownScheduler::new(fake, Arc::new(MemoryStore::new()), "u1")
    }

    #[test]
    fn reschedule_keeps_single_reminder() {
        let fake = Arc::new(FakeReminders::default());
        let mut sched = scheduler(Arc::clone(&fake));
        let now = Utc::now();

        sched.schedule(now + Duration::hours(5), now).unwrap();
        let second = sched.schedule(now + Duration::hours(3), now).unwrap();

        let live = fake.live.lock().unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].0, second);
        assert_eq!(live[0].1, "submission-cooldown:u1");
        assert_eq!(live[0].2, now + Duration::hours(3));
    }

    #[test]
    fn same_unlock_time_is_idempotent() {
        let fake = Arc::new(FakeReminders::default());
        let mut sched = scheduler(Arc::clone(&fake));
        let now = Utc::now();
        let at = now + Duration::hours(2);

        let a = sched.schedule(at, now).unwrap();
        let b = sched.schedule(at, now + Duration::seconds(1)).unwrap();
        assert_eq!(a, b);
        assert_eq!(*fake.next.lock().unwrap(), 1);
    }

    #[test]
    fn past_unlock_cancels_and_schedules_nothing() {
        let fake = Arc::new(FakeReminders::default());
        let mut sched = scheduler(Arc::clone(&fake));
        let now = Utc::now();

        sched.schedule(now + Duration::hours(1), now).unwrap();
        assert!(sched.schedule(now - Duration::seconds(1), now).is_none());
        assert!(fake.live.lock().unwrap().is_empty());
        assert!(sched.tracked().is_none());
    }

    #[test]
    fn permission_denied_disables_without_error() {
        let fake = Arc::new(FakeReminders {
            deny: true,
            ..FakeReminders::default()
        });
        let mut sched = scheduler(fake);
        let now = Utc::now();

        assert!(sched.schedule(now + Duration::hours(1), now).is_none());
        assert!(!sched.is_enabled());
        assert!(sched.tracked().is_none());
    }

    #[test]
    fn tracked_reminder_survives_new_instance() {
        let fake = Arc::new(FakeReminders::default());
        let store: SharedStore = Arc::new(MemoryStore::new());
        let now = Utc::now();

        let mut first = CooldownScheduler::new(Arc::clone(&fake), Arc::clone(&store), "u1");
        let id = first.schedule(now + Duration::hours(4), now).unwrap();

        let mut second = CooldownScheduler::new(Arc::clone(&fake), store, "u1");
        assert_eq!(second.tracked().map(|t| t.schedule_id), Some(id));
        assert!(second.cancel());
        assert!(fake.live.lock().unwrap().is_empty());
    }
}
