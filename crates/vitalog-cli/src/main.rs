use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "vitalog-cli", version, about = "Vitalog streak engine CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Daily streak batch run
    Run(commands::run::RunArgs),
    /// Streak inspection and single-user recomputation
    Streak {
        #[command(subcommand)]
        action: commands::streak::StreakAction,
    },
    /// Local check-in seeding (SQLite backend)
    Checkin {
        #[command(subcommand)]
        action: commands::checkin::CheckinAction,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args).await,
        Commands::Streak { action } => commands::streak::run(action).await,
        Commands::Checkin { action } => commands::checkin::run(action).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
