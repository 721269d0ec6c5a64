use chrono::Utc;
use clap::{Subcommand, ValueEnum};
use entrygate_core::{AdOutcome, ScriptedAdProvider};

use crate::context::{print_events, print_json, Context};

/// Outcome the simulated ad reports.
#[derive(Clone, Copy, ValueEnum)]
pub enum OutcomeArg {
    RewardGranted,
    ClosedNoReward,
    LoadFailed,
}

impl From<OutcomeArg> for AdOutcome {
    fn from(arg: OutcomeArg) -> Self {
        match arg {
            OutcomeArg::RewardGranted => AdOutcome::RewardGranted,
            OutcomeArg::ClosedNoReward => AdOutcome::ClosedNoReward,
            OutcomeArg::LoadFailed => AdOutcome::LoadFailed,
        }
    }
}

#[derive(Subcommand)]
pub enum RewardAction {
    /// Watch a (simulated) rewarded ad to lift the current block once
    Watch {
        #[arg(long, value_enum, default_value = "reward-granted")]
        outcome: OutcomeArg,
    },
    /// Show the override state
    State,
}

pub fn run(action: RewardAction) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::open()?;
    let mut client = ctx.client()?;

    match action {
        RewardAction::Watch { outcome } => {
            let now = Utc::now();
            let mut events = client.refresh_history(now);
            let mut ads = ScriptedAdProvider::new([AdOutcome::from(outcome)]);
            events.extend(client.start_reward(&mut ads, now)?);
            events.extend(client.pump_ad_outcomes(&mut ads, now));
            print_events(&events)?;
        }
        RewardAction::State => {
            print_json(client.override_state())?;
        }
    }
    Ok(())
}
