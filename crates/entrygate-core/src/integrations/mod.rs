//! Collaborator contracts: submission backend, rewarded-ad provider and local
//! reminder scheduler, plus the adapters shipped with the client.

pub mod http;
pub mod scripted_ad;
pub mod traits;

pub use http::HttpBackend;
pub use scripted_ad::ScriptedAdProvider;
pub use traits::{
    AdOutcome, ReminderPayload, ReminderScheduler, RewardAdProvider, ScheduleId,
    SubmissionBackend,
};
