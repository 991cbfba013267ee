//! The purge itself: `msgpurge run`.

use anyhow::{Context, Result};
use chrono::Utc;
use console::style;
use dialoguer::Confirm;

use msgpurge::api::{ApiClient, HttpTransport};
use msgpurge::config::{PurgeConfig, TOKEN_ENV};
use msgpurge::purge::Purger;
use msgpurge::ui;

/// Returns `Ok(false)` when the run finished but some deletions failed.
pub async fn cmd_run(config: &PurgeConfig, yes: bool, json: bool) -> Result<bool> {
    let Some(token) = config.token() else {
        anyhow::bail!(
            "No token configured. Set {}, pass --token, or add [auth] token to {}",
            TOKEN_ENV,
            config.path.display()
        );
    };

    let settings = config.settings();
    let store = config.archive_store()?;

    if !settings.dry_run && !yes {
        println!();
        println!(
            "{}",
            style("This permanently deletes your messages and cannot be undone.").yellow()
        );
        if let Some(max_age) = settings.max_age {
            println!("Only messages older than {} day(s) are affected.", max_age.num_days());
        }
        if !settings.include_dms {
            println!("Direct messages are left alone.");
        }
        println!();

        let confirm = Confirm::new()
            .with_prompt("Delete your messages now?")
            .default(false)
            .interact()
            .unwrap_or(false);

        if !confirm {
            println!("Purge cancelled");
            return Ok(true);
        }
    }

    let api = &config.toml.api;
    let transport = HttpTransport::new(
        &api.base_url,
        &token,
        &api.user_agent,
        config.request_timeout(),
    )?;
    let purger = Purger::new(ApiClient::new(transport), settings);
    let dry_run = purger.settings().dry_run;

    let stats = purger
        .run_with_store(&store, Utc::now())
        .await
        .context("Purge aborted")?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&stats).context("Failed to serialize run statistics")?
        );
    } else {
        ui::print_summary(&stats, dry_run);
    }

    Ok(!stats.has_failures())
}
