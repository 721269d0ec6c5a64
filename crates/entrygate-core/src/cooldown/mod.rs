//! Cooldown follow-up: the OS reminder for when the block lifts and the
//! per-second countdown shown meanwhile.

mod countdown;
mod scheduler;

pub use countdown::{format_remaining, Countdown, CountdownTick, TICK_INTERVAL};
pub use scheduler::{CooldownScheduler, TrackedReminder};
