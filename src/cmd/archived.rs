//! Archived-thread memory commands: `msgpurge archived`.

use anyhow::Result;
use dialoguer::Confirm;

use msgpurge::config::PurgeConfig;

use super::super::ArchivedCommands;

pub fn cmd_archived(config: &PurgeConfig, command: Option<ArchivedCommands>) -> Result<()> {
    let store = config.archive_store()?;

    match command {
        None | Some(ArchivedCommands::List) => {
            let threads = store.load()?;
            if threads.is_empty() {
                println!("No archived threads recorded.");
                return Ok(());
            }

            println!("Archived threads ({}):", threads.len());
            println!();
            for (channel_id, thread) in threads.iter() {
                println!(
                    "  {}  {} / {}  (found {})",
                    channel_id, thread.community_name, thread.channel_name, thread.discovered_date
                );
            }
            println!();
            println!("Stored in {}", store.path().display());
        }
        Some(ArchivedCommands::Clear { force }) => {
            if !force {
                let confirm = Confirm::new()
                    .with_prompt("Forget all archived threads? They will be searched again")
                    .default(false)
                    .interact()
                    .unwrap_or(false);

                if !confirm {
                    println!("Clear cancelled");
                    return Ok(());
                }
            }

            if store.clear()? {
                println!("Cleared {}", store.path().display());
            } else {
                println!("Nothing to clear");
            }
        }
    }

    Ok(())
}
