//! Ad provider driven by a pre-recorded list of outcomes.
//!
//! Used by the CLI, which has no ad SDK, and by tests.

use std::collections::VecDeque;

use super::traits::{AdOutcome, RewardAdProvider};

#[derive(Debug, Default)]
pub struct ScriptedAdProvider {
    script: VecDeque<AdOutcome>,
    pending: VecDeque<AdOutcome>,
    loaded: bool,
}

impl ScriptedAdProvider {
    /// Each `request_load`/`show` pair consumes the next scripted outcome.
    pub fn new(script: impl IntoIterator<Item = AdOutcome>) -> Self {
        Self {
            script: script.into_iter().collect(),
            pending: VecDeque::new(),
            loaded: false,
        }
    }
}

impl RewardAdProvider for ScriptedAdProvider {
    fn request_load(&mut self) {
        match self.script.front() {
            Some(AdOutcome::LoadFailed) => {
                self.script.pop_front();
                self.loaded = false;
                self.pending.push_back(AdOutcome::LoadFailed);
            }
            Some(_) => self.loaded = true,
            None => self.loaded = false,
        }
    }

    fn is_ready(&self) -> bool {
        self.loaded
    }

    fn show(&mut self) {
        if !self.loaded {
            return;
        }
        self.loaded = false;
        if let Some(outcome) = self.script.pop_front() {
            self.pending.push_back(outcome);
        }
    }

    fn next_outcome(&mut self) -> Option<AdOutcome> {
        self.pending.pop_front()
    }
}
