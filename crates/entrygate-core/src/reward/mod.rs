//! Rewarded-ad override: a one-time bypass of the eligibility block.

mod controller;
mod token;

pub use controller::{step, OverrideController, OverrideEffect, OverrideEvent, OverrideState};
pub use token::OverrideToken;
