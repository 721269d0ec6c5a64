//! Live countdown to the unlock time.
//!
//! The caller invokes `tick()` once per second. Reaching zero flips
//! `can_act_now`, an optimistic hint only: the block is lifted for real by the
//! next history refresh.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How often the owner should call `Countdown::tick`.
pub const TICK_INTERVAL: std::time::Duration = std::time::Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountdownTick {
    pub remaining_secs: i64,
    pub label: String,
    pub can_act_now: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Countdown {
    unlock_at: Option<DateTime<Utc>>,
    can_act_now: bool,
    stopped: bool,
}

impl Countdown {
    pub fn new(unlock_at: Option<DateTime<Utc>>) -> Self {
        Self {
            unlock_at,
            can_act_now: false,
            stopped: false,
        }
    }

    /// Retarget after a re-evaluation. Resets the optimistic flag.
    pub fn set_target(&mut self, unlock_at: Option<DateTime<Utc>>) {
        if self.unlock_at != unlock_at {
            self.unlock_at = unlock_at;
            self.can_act_now = false;
        }
    }

    pub fn target(&self) -> Option<DateTime<Utc>> {
        self.unlock_at
    }

    pub fn can_act_now(&self) -> bool {
        self.can_act_now
    }

    /// Stop ticking; called when the owning view goes away.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// Undo `stop` when the view comes back.
    pub fn resume(&mut self) {
        self.stopped = false;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Recompute the remaining time. `None` when stopped or without a target.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<CountdownTick> {
        if self.stopped {
            return None;
        }
        let unlock_at = self.unlock_at?;
        let remaining = (unlock_at - now).max(Duration::zero());
        if remaining.is_zero() {
            self.can_act_now = true;
        }
        Some(CountdownTick {
            remaining_secs: remaining.num_seconds(),
            label: format_remaining(remaining),
            can_act_now: self.can_act_now,
        })
    }
}

/// `"5h 0m 12s"`, `"3m 4s"`, `"9s"`; leading zero units are dropped.
pub fn format_remaining(remaining: Duration) -> String {
    let total = remaining.num_seconds().max(0);
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}h {m}m {s}s")
    } else if m > 0 {
        format!("{m}m {s}s")
    } else {
        format!("{s}s")
    }
}
