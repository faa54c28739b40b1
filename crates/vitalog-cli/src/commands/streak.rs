use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use vitalog_core::{EngineConfig, StreakEngine, StreakStore};

use super::Backend;

#[derive(Subcommand)]
pub enum StreakAction {
    /// Show the stored streak for a user
    Show { user_id: String },
    /// Recompute and persist a single user's streak
    Compute {
        user_id: String,
        /// Reference day (YYYY-MM-DD); defaults to the current day.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

pub async fn run(action: StreakAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = EngineConfig::load()?;
    let boundary = config.day_boundary()?;
    let backend = Backend::open(&config)?;

    match action {
        StreakAction::Show { user_id } => match backend.load_streak(&user_id).await? {
            Some(state) => println!("{}", serde_json::to_string_pretty(&state)?),
            None => println!("no streak recorded for {user_id}"),
        },
        StreakAction::Compute { user_id, date } => {
            let today = date.unwrap_or_else(|| boundary.today(Utc::now()));
            let engine = StreakEngine::new(backend, boundary);
            let state = engine.process_user(&user_id, today).await?;
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
    }
    Ok(())
}
