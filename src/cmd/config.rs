//! Configuration view and validation commands: `msgpurge config`.

use anyhow::Result;

use msgpurge::config::{PurgeConfig, PurgeToml};
use msgpurge::snowflake::Snowflake;

use super::super::ConfigCommands;

fn id_list(ids: &[Snowflake]) -> String {
    let quoted: Vec<String> = ids.iter().map(|id| format!("\"{}\"", id)).collect();
    format!("[{}]", quoted.join(", "))
}

fn print_toml(toml: &PurgeToml) {
    println!("[api]");
    println!("  base_url = \"{}\"", toml.api.base_url);
    println!("  user_agent = \"{}\"", toml.api.user_agent);
    println!("  timeout_secs = {}", toml.api.timeout_secs);
    println!();

    let purge = &toml.purge;
    println!("[purge]");
    match purge.max_age_days {
        Some(days) => println!("  max_age_days = {}", days),
        None => println!("  max_age_days = (none)"),
    }
    println!("  dry_run = {}", purge.dry_run);
    println!("  delete_delay_ms = {}", purge.delete_delay_ms);
    println!("  search_delay_ms = {}", purge.search_delay_ms);
    println!("  include_dms = {}", purge.include_dms);
    println!("  skip_channels = {:?}", purge.skip_channels);
    println!("  include_guilds = {}", id_list(&purge.include_guilds));
    println!("  exclude_guilds = {}", id_list(&purge.exclude_guilds));
    println!("  include_dms_ids = {}", id_list(&purge.include_dms_ids));
    println!("  exclude_dms_ids = {}", id_list(&purge.exclude_dms_ids));
    println!();

    println!("[logging]");
    println!("  format = \"{}\"", toml.logging.format);
    if let Some(file) = &toml.logging.file {
        println!("  file = \"{}\"", file.display());
    }
    println!();
}

pub fn cmd_config(config: &PurgeConfig, command: Option<ConfigCommands>) -> Result<()> {
    let config_path = &config.path;

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("msgpurge Configuration");
            println!("======================");
            println!();

            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("No msgpurge.toml found at {}", config_path.display());
                println!("Using default configuration:");
            }
            println!();
            print_toml(&config.toml);

            println!("Effective values (with env/CLI overrides):");
            let token = if config.token().is_some() {
                "set"
            } else {
                "not set"
            };
            println!("  token = {}", token);
            println!("  dry_run = {}", config.dry_run());
            match config.archive_store() {
                Ok(store) => println!("  archived_threads_file = \"{}\"", store.path().display()),
                Err(e) => println!("  archived_threads_file = (unavailable: {})", e),
            }
            println!();

            if !config_path.exists() {
                println!("Run 'msgpurge config init' to create a msgpurge.toml file.");
                println!();
            }
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No msgpurge.toml found. Using defaults (valid).");
                return Ok(());
            }

            let warnings = config.toml.validate();

            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("msgpurge.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            PurgeToml::default().save(config_path)?;

            println!("Created msgpurge.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [purge] max_age_days, skip_channels, include/exclude ids");
            println!("  - [storage] archived_threads_file");
            println!("  - [logging] format, file");
            println!();
            println!("Keep the token in MSGPURGE_TOKEN or a .env file rather than here.");
            println!();
        }
    }

    Ok(())
}
