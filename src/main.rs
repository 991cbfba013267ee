use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::warn;

use msgpurge::config::{CliOverrides, PurgeConfig};

mod cmd;

#[derive(Parser)]
#[command(name = "msgpurge")]
#[command(
    version,
    about = "Bulk-delete your own messages across communities and direct messages"
)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to msgpurge.toml (defaults to the per-user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Account token. Overrides MSGPURGE_TOKEN and the config file
    #[arg(long, global = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search for and delete your messages
    Run {
        /// Report what would be deleted without deleting anything
        #[arg(long)]
        dry_run: bool,

        /// Only delete messages older than this many days
        #[arg(long)]
        max_age_days: Option<u32>,

        /// Leave channels whose name contains this text alone (repeatable)
        #[arg(long = "skip-channel", value_name = "PATTERN")]
        skip_channels: Vec<String>,

        /// Do not touch direct-message channels
        #[arg(long)]
        no_dms: bool,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,

        /// Print run statistics as JSON instead of the summary
        #[arg(long)]
        json: bool,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Inspect or reset the remembered archived threads
    Archived {
        #[command(subcommand)]
        command: Option<ArchivedCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default msgpurge.toml file
    Init,
}

#[derive(Subcommand, Clone)]
pub enum ArchivedCommands {
    /// List remembered archived threads
    List,
    /// Forget every remembered archived thread
    Clear {
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        let mut overrides = CliOverrides {
            token: self.token.clone(),
            ..Default::default()
        };
        if let Commands::Run {
            dry_run,
            max_age_days,
            skip_channels,
            no_dms,
            ..
        } = &self.command
        {
            overrides.dry_run = *dry_run;
            overrides.max_age_days = *max_age_days;
            overrides.skip_channels = skip_channels.clone();
            overrides.no_dms = *no_dms;
        }
        overrides
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let dotenv = dotenvy::dotenv();

    let config = PurgeConfig::load(cli.config.as_deref(), cli.overrides())?;
    let log_guard = msgpurge::logging::init(
        cli.verbose,
        config.toml.logging.format,
        config.toml.logging.file.as_deref(),
    )?;
    // A missing .env is the normal case.
    if let Err(e) = dotenv
        && !e.not_found()
    {
        warn!(error = %e, "Failed to load .env");
    }

    let success = match &cli.command {
        Commands::Run { yes, json, .. } => cmd::cmd_run(&config, *yes, *json).await?,
        Commands::Config { command } => {
            cmd::cmd_config(&config, command.clone())?;
            true
        }
        Commands::Archived { command } => {
            cmd::cmd_archived(&config, command.clone())?;
            true
        }
    };

    if !success {
        drop(log_guard);
        std::process::exit(1);
    }

    Ok(())
}
