use chrono::{DateTime, Utc};
use clap::Subcommand;
use vitalog_core::{CheckInSource, EngineConfig, SqliteStore, StoreBackend};

#[derive(Subcommand)]
pub enum CheckinAction {
    /// Record a check-in for a user (local backend only)
    Add {
        user_id: String,
        /// Timestamp (RFC 3339); defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// List a user's raw check-in timestamps
    List { user_id: String },
}

pub async fn run(action: CheckinAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = EngineConfig::load()?;
    if config.store.backend != StoreBackend::Sqlite {
        return Err("check-in seeding requires the sqlite backend".into());
    }
    let store = SqliteStore::open(config.sqlite_path()?)?;

    match action {
        CheckinAction::Add { user_id, at } => {
            let occurred_at = at.unwrap_or_else(Utc::now);
            store.record_check_in(&user_id, occurred_at)?;
            println!("recorded check-in for {user_id} at {}", occurred_at.to_rfc3339());
        }
        CheckinAction::List { user_id } => {
            let mut timestamps = store.fetch_check_ins(&user_id).await?;
            timestamps.sort();
            for ts in timestamps {
                println!("{}", ts.to_rfc3339());
            }
        }
    }
    Ok(())
}
