use chrono::Utc;
use clap::Subcommand;
use entrygate_core::FormState;
use serde::Serialize;

use crate::context::{print_events, print_json, Context};

#[derive(Subcommand)]
pub enum DraftAction {
    /// Save the given fields as the draft
    Save {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        body: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        subcategory: Option<String>,
        /// Poll option (repeatable); enables the poll
        #[arg(long = "poll-option")]
        poll_options: Vec<String>,
    },
    /// Show the saved draft applied onto an empty form
    Show,
    /// Delete the saved draft
    Clear,
}

#[derive(Serialize)]
struct Restored {
    form: FormState,
    applied: Vec<&'static str>,
}

pub fn run(action: DraftAction) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::open()?;
    let mut client = ctx.client()?;
    let now = Utc::now();

    match action {
        DraftAction::Save {
            title,
            body,
            category,
            subcategory,
            poll_options,
        } => {
            // Start from the stored draft so unspecified fields survive.
            let mut form = FormState::default();
            client.restore_draft(&mut form);
            if let Some(title) = title {
                form.title = title;
            }
            if let Some(body) = body {
                form.body = body;
            }
            if let Some(category) = category {
                form.category = category;
            }
            if subcategory.is_some() {
                form.subcategory = subcategory;
            }
            if !poll_options.is_empty() {
                form.poll_enabled = true;
                form.poll_options = poll_options;
            }
            client.draft_changed(&form, now);
            print_events(&client.flush_draft(now))?;
        }
        DraftAction::Show => {
            let mut form = FormState::default();
            let applied = client.restore_draft(&mut form);
            print_json(&Restored { form, applied })?;
        }
        DraftAction::Clear => {
            print_events(&client.clear_draft(now))?;
        }
    }
    Ok(())
}
