use std::collections::BTreeMap;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::submission::SubmissionStatus;

/// Per-rank daily quota table plus the clan bonus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaPolicy {
    #[serde(default = "default_rank_quotas")]
    pub rank_quotas: BTreeMap<String, u32>,
    /// Quota for ranks missing from the table.
    #[serde(default = "default_quota")]
    pub default_quota: u32,
    #[serde(default = "default_clan_bonus")]
    pub clan_bonus: u32,
}

/// Cooldown durations applied once the quota is exhausted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooldownPolicy {
    #[serde(default = "default_approved_hours")]
    pub approved_hours: u32,
    #[serde(default = "default_rejected_hours")]
    pub rejected_hours: u32,
    /// Length of the rolling window the quota is counted over.
    #[serde(default = "default_window_hours")]
    pub window_hours: u32,
}

fn default_rank_quotas() -> BTreeMap<String, u32> {
    [("newcomer", 1), ("regular", 2), ("veteran", 3), ("elite", 5)]
        .into_iter()
        .map(|(rank, quota)| (rank.to_string(), quota))
        .collect()
}
fn default_quota() -> u32 {
    1
}
fn default_clan_bonus() -> u32 {
    1
}
fn default_approved_hours() -> u32 {
    24
}
fn default_rejected_hours() -> u32 {
    12
}
fn default_window_hours() -> u32 {
    24
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            rank_quotas: default_rank_quotas(),
            default_quota: default_quota(),
            clan_bonus: default_clan_bonus(),
        }
    }
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        Self {
            approved_hours: default_approved_hours(),
            rejected_hours: default_rejected_hours(),
            window_hours: default_window_hours(),
        }
    }
}

impl QuotaPolicy {
    /// Daily quota for `rank`, plus the clan bonus when the author is in a clan.
    pub fn quota_for(&self, rank: &str, in_clan: bool) -> u32 {
        let base = self
            .rank_quotas
            .get(rank)
            .copied()
            .unwrap_or(self.default_quota);
        if in_clan {
            base.saturating_add(self.clan_bonus)
        } else {
            base
        }
    }
}

impl CooldownPolicy {
    /// Cooldown length for a resolved record; `None` for pending ones.
    pub fn duration_for(&self, status: SubmissionStatus) -> Option<Duration> {
        match status {
            SubmissionStatus::Approved => Some(Duration::hours(self.approved_hours as i64)),
            SubmissionStatus::Rejected => Some(Duration::hours(self.rejected_hours as i64)),
            SubmissionStatus::Pending => None,
        }
    }

    pub fn window(&self) -> Duration {
        Duration::hours(self.window_hours as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_adds_clan_bonus() {
        let policy = QuotaPolicy::default();
        assert_eq!(policy.quota_for("veteran", false), 3);
        assert_eq!(policy.quota_for("veteran", true), 4);
    }

    #[test]
    fn unknown_rank_uses_default_quota() {
        let policy = QuotaPolicy {
            default_quota: 2,
            ..QuotaPolicy::default()
        };
        assert_eq!(policy.quota_for("mystery", false), 2);
    }

    #[test]
    fn pending_has_no_cooldown() {
        let policy = CooldownPolicy::default();
        assert_eq!(
            policy.duration_for(SubmissionStatus::Approved),
            Some(Duration::hours(24))
        );
        assert_eq!(
            policy.duration_for(SubmissionStatus::Rejected),
            Some(Duration::hours(12))
        );
        assert_eq!(policy.duration_for(SubmissionStatus::Pending), None);
    }
}
