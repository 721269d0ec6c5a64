//! # Entrygate Core Library
//!
//! Client-side decision engine for a rate-limited publishing platform.
//! Authors get a daily quota of entries; once it is used up, each resolved
//! entry imposes a cooldown. A rewarded ad can buy a one-time override.
//!
//! ## Architecture
//!
//! - **Eligibility**: pure evaluation of block state and unlock time from a
//!   history snapshot
//! - **Cooldown**: one OS reminder per user plus a 1-second countdown
//! - **Reward**: override state machine driven by ad callbacks
//! - **Draft**: debounced autosave and restore of the submission form
//! - **Cache**: memory / persistent / network tiers with ordered fetches
//! - **Storage**: SQLite key-value store and TOML configuration
//!
//! Nothing here reads the clock: every operation takes `now`, and the caller
//! drives the countdown and debounce by calling `tick()`.
//!
//! ## Key Components
//!
//! - [`SubmissionClient`]: the components wired together for one user
//! - [`evaluate`]: the eligibility evaluator
//! - [`OverrideController`]: override state machine
//! - [`Database`]: durable key-value store and reminder table
//! - [`Config`]: application configuration management

pub mod cache;
pub mod cooldown;
pub mod draft;
pub mod eligibility;
pub mod error;
pub mod events;
pub mod integrations;
pub mod reward;
pub mod session;
pub mod storage;
pub mod submission;

pub use cache::{CacheEntry, CacheRead, FetchApplied, FetchTicket, Tier, TieredCache};
pub use cooldown::{format_remaining, Countdown, CooldownScheduler};
pub use draft::{Draft, DraftManager, FormState};
pub use eligibility::{evaluate, CooldownPolicy, EligibilityState, QuotaPolicy};
pub use error::{CoreError, NetworkError, PersistenceError, ReminderError, SubmitError};
pub use events::Event;
pub use integrations::{
    AdOutcome, HttpBackend, ReminderScheduler, RewardAdProvider, ScriptedAdProvider,
    SubmissionBackend,
};
pub use reward::{OverrideController, OverrideState, OverrideToken};
pub use session::{HistorySnapshot, SubmissionClient};
pub use storage::{Config, Database, FallbackStore, KeyValueStore, MemoryStore, SharedStore};
pub use submission::{SubmissionPayload, SubmissionRecord, SubmissionStatus};
