//! Draft persistence manager.
//!
//! Form changes are debounced and then written under a per-user key. All
//! writers (autosave, restore, clear) go through this one owner, so a clear
//! cancels the queued save before removing the entry and nothing queued
//! earlier can bring the draft back.
//!
//! While a restore is in progress, change events are ignored: they are either
//! the restored values echoing back from the form or stale pre-restore state.

use chrono::{DateTime, Duration, Utc};

use super::debounce::Debouncer;
use super::form::{Draft, DraftFields, FormState};
use crate::storage::{keys, SharedStore};

pub struct DraftManager {
    store: SharedStore,
    key: String,
    debounce: Debouncer<DraftFields>,
    restoring: bool,
    last_saved_at: Option<DateTime<Utc>>,
    /// Set after a store failure; the draft then lives only in `memory_copy`.
    memory_only: bool,
    memory_copy: Option<Draft>,
}

impl DraftManager {
    pub fn new(store: SharedStore, user_id: &str, debounce: Duration) -> Self {
        Self {
            store,
            key: keys::draft(user_id),
            debounce: Debouncer::new(debounce),
            restoring: false,
            last_saved_at: None,
            memory_only: false,
            memory_copy: None,
        }
    }

    pub fn is_restoring(&self) -> bool {
        self.restoring
    }

    pub fn has_pending_save(&self) -> bool {
        self.debounce.is_pending()
    }

    pub fn pending_deadline(&self) -> Option<DateTime<Utc>> {
        self.debounce.deadline()
    }

    /// Queue a save of `form`. Returns false if suppressed by a restore.
    pub fn on_change(&mut self, form: &FormState, now: DateTime<Utc>) -> bool {
        if self.restoring {
            tracing::debug!("draft change ignored during restore");
            return false;
        }
        self.debounce.trigger(DraftFields::from(form), now);
        true
    }

    /// Write the queued draft if its debounce delay has elapsed.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Option<Draft> {
        let fields = self.debounce.poll(now)?;
        Some(self.persist(fields, now))
    }

    /// Write the queued draft immediately.
    pub fn flush(&mut self, now: DateTime<Utc>) -> Option<Draft> {
        let fields = self.debounce.flush()?;
        Some(self.persist(fields, now))
    }

    /// Read the stored draft and enter the restoring phase.
    ///
    /// Any queued save is dropped: it holds pre-restore state.
    pub fn begin_restore(&mut self) -> Option<Draft> {
        self.restoring = true;
        if self.debounce.cancel() {
            tracing::debug!("dropped queued draft save at restore");
        }
        let draft = self.load();
        if let Some(d) = &draft {
            self.last_saved_at = Some(self.last_saved_at.map_or(d.saved_at, |t| t.max(d.saved_at)));
        }
        draft
    }

    pub fn finish_restore(&mut self) {
        self.restoring = false;
    }

    /// Restore the stored draft onto `form`. Returns the fields applied.
    pub fn restore(&mut self, form: &mut FormState) -> Vec<&'static str> {
        let applied = self
            .begin_restore()
            .map(|d| d.fields.apply_to(form))
            .unwrap_or_default();
        self.finish_restore();
        applied
    }

    /// Remove the stored draft and drop any queued save.
    pub fn clear(&mut self) {
        self.debounce.cancel();
        self.memory_copy = None;
        if self.memory_only {
            return;
        }
        if let Err(e) = self.store.remove(&self.key) {
            tracing::warn!(error = %e, "draft removal failed, keeping drafts in memory only");
            self.memory_only = true;
        }
    }

    /// Stop autosaving; the queued change is discarded.
    pub fn unmount(&mut self) {
        self.debounce.cancel();
    }

    /// The stored draft without entering the restoring phase.
    pub fn load(&mut self) -> Option<Draft> {
        if self.memory_only {
            return self.memory_copy.clone();
        }
        match self.store.get(&self.key) {
            Ok(Some(json)) => match serde_json::from_str::<Draft>(&json) {
                Ok(draft) => Some(draft),
                Err(e) => {
                    tracing::warn!(error = %e, "discarding unreadable draft");
                    if let Err(e) = self.store.remove(&self.key) {
                        tracing::warn!(error = %e, "could not remove unreadable draft");
                    }
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "draft read failed, keeping drafts in memory only");
                self.memory_only = true;
                self.memory_copy.clone()
            }
        }
    }

    fn persist(&mut self, fields: DraftFields, now: DateTime<Utc>) -> Draft {
        let saved_at = self.last_saved_at.map_or(now, |last| last.max(now));
        self.last_saved_at = Some(saved_at);
        let draft = Draft { fields, saved_at };
        self.memory_copy = Some(draft.clone());

        if !self.memory_only {
            let result = serde_json::to_string(&draft)
                .map_err(|e| e.to_string())
                .and_then(|json| self.store.set(&self.key, &json).map_err(|e| e.to_string()));
            match result {
                Ok(()) => tracing::debug!(%saved_at, "draft saved"),
                Err(e) => {
                    tracing::warn!(error = %e, "draft write failed, keeping drafts in memory only");
                    self.memory_only = true;
                }
            }
        }
        draft
    }
}
