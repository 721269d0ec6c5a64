use chrono::Utc;
use clap::Subcommand;
use entrygate_core::cooldown::TICK_INTERVAL;
use entrygate_core::{format_remaining, Event};
use serde_json::json;

use crate::context::{current_eligibility, print_events, print_json, Context};

#[derive(Subcommand)]
pub enum CooldownAction {
    /// Show the unlock time and the tracked reminder
    Show {
        /// Answer from cached history only; skip the backend fetch
        #[arg(long)]
        no_fetch: bool,
    },
    /// Tick the countdown every second until it reaches zero
    Watch,
    /// List reminders stored in the local reminder table
    Reminders,
}

pub fn run(action: CooldownAction) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::open()?;

    match action {
        CooldownAction::Show { no_fetch } => {
            let mut client = ctx.client()?;
            let now = Utc::now();
            let (state, served_from) = current_eligibility(&mut client, now, !no_fetch);
            let unlock_at = state.unlock_at.filter(|_| state.blocked);
            print_json(&json!({
                "blocked": state.blocked,
                "servedFrom": served_from,
                "offline": client.is_offline(),
                "unlockAt": unlock_at,
                "remaining": unlock_at.map(|at| format_remaining(at - now)),
                "reminder": client.tracked_reminder(),
                "remindersEnabled": client.reminders_enabled(),
            }))?;
        }
        CooldownAction::Watch => {
            let mut client = ctx.client()?;
            let events = client.refresh_history(Utc::now());
            if client.countdown().target().is_none() {
                print_events(&events)?;
                eprintln!("no cooldown running");
                return Ok(());
            }

            // The HTTP backend blocks on its own runtime, so client calls
            // stay outside `block_on`; only the wait happens in here.
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()?;
            let mut interval = runtime.block_on(async { tokio::time::interval(TICK_INTERVAL) });
            loop {
                runtime.block_on(interval.tick());
                let now = Utc::now();
                let mut events = client.poll_history(now);
                events.extend(client.tick(now));
                let done = events
                    .iter()
                    .any(|e| matches!(e, Event::CountdownTicked { can_act_now: true, .. }));
                for event in &events {
                    println!("{}", serde_json::to_string(event)?);
                }
                if done || client.countdown().target().is_none() {
                    break;
                }
            }

            // Zero on the clock is only a hint; confirm against the backend.
            client.unmount();
            print_events(&client.refresh_history(Utc::now()))?;
        }
        CooldownAction::Reminders => {
            print_json(&ctx.db.active_reminders()?)?;
        }
    }
    Ok(())
}
