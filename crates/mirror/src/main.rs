//! Guild mirror CLI binary.
//!
//! This binary provides command-line access to guild mirroring:
//! - Run the chat bot
//! - Capture, plan and apply against a live guild
//! - Diff snapshot documents offline and list stored snapshots

use clap::Parser;
use guild_mirror::MirrorConfig;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, Commands, diff, list};
    #[cfg(feature = "discord")]
    use cli::{apply_guild, capture_guild, plan_guild, run_bot};

    // Parse command-line arguments
    let cli = Cli::parse();

    // Token and overrides may live in a .env file
    dotenvy::dotenv().ok();

    // RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = MirrorConfig::load()?;

    // Execute the requested command
    match cli.command {
        #[cfg(feature = "discord")]
        Commands::Bot => {
            run_bot(&config).await?;
        }

        #[cfg(feature = "discord")]
        Commands::Capture { guild } => {
            capture_guild(&config, guild).await?;
        }

        #[cfg(feature = "discord")]
        Commands::Plan { guild, snapshot } => {
            plan_guild(&config, guild, &snapshot).await?;
        }

        #[cfg(feature = "discord")]
        Commands::Apply {
            guild,
            snapshot,
            yes,
        } => {
            apply_guild(&config, guild, &snapshot, yes).await?;
        }

        Commands::Diff { source, target } => {
            diff(&config, &source, &target).await?;
        }

        Commands::List { guild } => {
            list(&config, guild).await?;
        }
    }

    Ok(())
}
