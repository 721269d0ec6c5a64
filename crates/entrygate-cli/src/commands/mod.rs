pub mod config;
pub mod cooldown;
pub mod draft;
pub mod history;
pub mod reward;
pub mod status;
pub mod submit;
