use chrono::{DateTime, Utc};
use clap::Args;
use entrygate_core::{format_remaining, EligibilityState, Tier};
use serde::Serialize;

use crate::context::{current_eligibility, print_json, Context};

#[derive(Args)]
pub struct StatusArgs {
    /// Answer from cached history only; skip the backend fetch
    #[arg(long)]
    no_fetch: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReport {
    user_id: String,
    quota: u32,
    #[serde(flatten)]
    eligibility: EligibilityState,
    /// Countdown label while blocked with a known unlock time.
    remaining: Option<String>,
    offline: bool,
    /// Tier that held the history before revalidation.
    served_from: Tier,
    override_state: &'static str,
    evaluated_at: DateTime<Utc>,
}

pub fn run(args: StatusArgs) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::open()?;
    let mut client = ctx.client()?;
    let now = Utc::now();

    let (eligibility, served_from) = current_eligibility(&mut client, now, !args.no_fetch);
    let remaining = eligibility
        .unlock_at
        .filter(|_| eligibility.blocked)
        .map(|at| format_remaining(at - now));

    print_json(&StatusReport {
        user_id: client.user_id().to_string(),
        quota: client.quota(),
        eligibility,
        remaining,
        offline: client.is_offline(),
        served_from,
        override_state: client.override_state().name(),
        evaluated_at: now,
    })
}
