use chrono::Utc;
use clap::Args;
use entrygate_core::{FormState, SubmissionPayload};

use crate::context::{print_events, Context};

#[derive(Args)]
pub struct SubmitArgs {
    /// Entry title
    #[arg(long)]
    title: Option<String>,
    /// Entry body
    #[arg(long)]
    body: Option<String>,
    /// Category
    #[arg(long)]
    category: Option<String>,
    /// Subcategory
    #[arg(long)]
    subcategory: Option<String>,
    /// Poll option (repeatable); enables the poll
    #[arg(long = "poll-option")]
    poll_options: Vec<String>,
    /// Start from the saved draft; flags override its fields
    #[arg(long)]
    from_draft: bool,
}

impl SubmitArgs {
    fn apply_to(self, form: &mut FormState) {
        if let Some(title) = self.title {
            form.title = title;
        }
        if let Some(body) = self.body {
            form.body = body;
        }
        if let Some(category) = self.category {
            form.category = category;
        }
        if self.subcategory.is_some() {
            form.subcategory = self.subcategory;
        }
        if !self.poll_options.is_empty() {
            form.poll_enabled = true;
            form.poll_options = self.poll_options;
        }
    }
}

fn payload(form: FormState) -> SubmissionPayload {
    SubmissionPayload {
        title: form.title,
        body: form.body,
        category: form.category,
        subcategory: form.subcategory,
        poll_options: if form.poll_enabled {
            form.poll_options
        } else {
            Vec::new()
        },
    }
}

pub fn run(args: SubmitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::open()?;
    let mut client = ctx.client()?;
    let now = Utc::now();

    let mut form = FormState::default();
    if args.from_draft {
        client.restore_draft(&mut form);
    }
    args.apply_to(&mut form);
    if form.title.trim().is_empty() {
        return Err("a title is required (--title or --from-draft)".into());
    }

    client.refresh_history(now);
    let events = client.submit(&payload(form), now)?;
    print_events(&events)
}
