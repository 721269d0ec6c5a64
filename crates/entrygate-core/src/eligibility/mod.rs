//! Eligibility evaluation: is the author allowed to submit right now, and if
//! not, when does the earliest cooldown lift.

mod evaluator;
mod policy;

pub use evaluator::{cooldown_end, evaluate, EligibilityState};
pub use policy::{CooldownPolicy, QuotaPolicy};
