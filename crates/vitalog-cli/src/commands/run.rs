use chrono::{NaiveDate, Utc};
use clap::Args;
use vitalog_core::{EngineConfig, StreakEngine};

use super::Backend;

#[derive(Args)]
pub struct RunArgs {
    /// Reference day (YYYY-MM-DD); defaults to the current day in the
    /// configured boundary frame. Use for backfills and deterministic
    /// reruns.
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

pub async fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = EngineConfig::load()?;
    let boundary = config.day_boundary()?;
    let today = args.date.unwrap_or_else(|| boundary.today(Utc::now()));

    let backend = Backend::open(&config)?;
    let engine = StreakEngine::new(backend, boundary);
    let summary = engine.run(today).await?;

    println!("{}", serde_json::to_string_pretty(&summary)?);

    // Non-zero exit signals external alerting; committed writes stand.
    if !summary.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
