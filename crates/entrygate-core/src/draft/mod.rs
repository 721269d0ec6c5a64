//! Autosaved submission drafts.

mod debounce;
mod form;
mod manager;

pub use debounce::Debouncer;
pub use form::{Draft, DraftFields, FormState};
pub use manager::DraftManager;
