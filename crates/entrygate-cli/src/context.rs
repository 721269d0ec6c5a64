//! Wiring shared by every command: config, database and the client.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use entrygate_core::{
    Config, Database, EligibilityState, Event, FallbackStore, HttpBackend, SharedStore,
    SubmissionClient, Tier,
};

pub type Client = SubmissionClient<HttpBackend, Arc<Database>>;

pub struct Context {
    pub config: Config,
    pub db: Arc<Database>,
}

impl Context {
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::load()?;
        let db = Arc::new(Database::open()?);
        tracing::debug!(user = %config.profile.user_id, "context opened");
        Ok(Self { config, db })
    }

    /// Store for drafts, cache and override state. Falls back to memory
    /// if the database starts failing mid-run.
    pub fn store(&self) -> SharedStore {
        let durable: SharedStore = self.db.clone();
        Arc::new(FallbackStore::new(durable))
    }

    pub fn client(&self) -> Result<Client, Box<dyn std::error::Error>> {
        let backend = HttpBackend::new(&self.config.backend)?;
        Ok(SubmissionClient::new(
            &self.config,
            backend,
            Arc::clone(&self.db),
            self.store(),
        ))
    }
}

/// Answer from memory or disk first, then run the revalidating fetch the
/// cache asked for unless `fetch` is off. Returns the tier that served the
/// first answer and the eligibility after revalidation.
pub fn current_eligibility(
    client: &mut Client,
    now: DateTime<Utc>,
    fetch: bool,
) -> (EligibilityState, Tier) {
    let snapshot = client.open_history(now);
    let tier = snapshot.tier;
    if !fetch || snapshot.fetch.is_none() {
        return (snapshot.eligibility, tier);
    }
    client.revalidate(snapshot, now);
    (client.eligibility(now), tier)
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_events(events: &[Event]) -> Result<(), Box<dyn std::error::Error>> {
    print_json(&events)
}
