use chrono::Utc;
use clap::Subcommand;

use crate::context::{print_events, print_json, Context};

#[derive(Subcommand)]
pub enum HistoryAction {
    /// Fetch the trailing window from the backend
    Refresh,
    /// Show cached records without touching the network
    Show,
}

pub fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::open()?;
    let mut client = ctx.client()?;

    match action {
        HistoryAction::Refresh => {
            let events = client.refresh_history(Utc::now());
            print_events(&events)?;
        }
        HistoryAction::Show => {
            print_json(&client.cached_history())?;
        }
    }
    Ok(())
}
