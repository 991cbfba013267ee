use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use super::orchestrator::{TargetOutcome, TargetPurge};
use super::settings::PurgeSettings;
use super::stats::PurgeStats;
use super::target::Target;
use crate::api::{ApiClient, Transport};
use crate::archive::{ArchiveStore, ArchivedThreads};
use crate::errors::{ApiError, PurgeError};
use crate::snowflake::Snowflake;

/// Runs a purge across every community and direct-message channel of the account.
///
/// Targets are processed strictly one after another; nothing here spawns.
pub struct Purger<T> {
    client: ApiClient<T>,
    settings: PurgeSettings,
}

/// Per-run values shared by every target.
struct RunContext {
    user_id: Snowflake,
    cursor: Option<Snowflake>,
    today: NaiveDate,
}

impl<T: Transport> Purger<T> {
    pub fn new(client: ApiClient<T>, settings: PurgeSettings) -> Self {
        Self { client, settings }
    }

    pub fn client(&self) -> &ApiClient<T> {
        &self.client
    }

    pub fn settings(&self) -> &PurgeSettings {
        &self.settings
    }

    /// Load the archived-thread memory, run, and write the memory back.
    ///
    /// The memory is saved even when the run aborts so threads discovered
    /// before the failure are not retried next time. A failed save never
    /// replaces the run's own result; on success it is added to `errors`.
    pub async fn run_with_store(
        &self,
        store: &ArchiveStore,
        now: DateTime<Utc>,
    ) -> Result<PurgeStats, PurgeError> {
        let mut archive = store.load()?;
        let known = archive.len();
        info!(path = %store.path().display(), known, "Loaded archived threads");

        let mut result = self.run(&mut archive, now).await;

        match store.save(&archive) {
            Ok(()) if archive.len() > known => {
                info!(
                    added = archive.len() - known,
                    path = %store.path().display(),
                    "Saved archived threads"
                );
            }
            Ok(()) => {}
            Err(e) => {
                error!(
                    path = %store.path().display(),
                    error = %format!("{:#}", e),
                    "Failed to save archived threads"
                );
                if let Ok(stats) = result.as_mut() {
                    stats.record_error(format!("Failed to save archived threads: {:#}", e));
                }
            }
        }
        result
    }

    pub async fn run(
        &self,
        archive: &mut ArchivedThreads,
        now: DateTime<Utc>,
    ) -> Result<PurgeStats, PurgeError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("purge_run", %run_id, dry_run = self.settings.dry_run);
        self.run_inner(archive, now).instrument(span).await
    }

    async fn run_inner(
        &self,
        archive: &mut ArchivedThreads,
        now: DateTime<Utc>,
    ) -> Result<PurgeStats, PurgeError> {
        let me = self
            .client
            .current_user()
            .await
            .map_err(|e| fatal("account", e))?;
        info!(user = %me.display_name(), id = %me.id, "Authenticated");

        let ctx = RunContext {
            user_id: me.id,
            cursor: self
                .settings
                .max_age
                .map(|age| Snowflake::from_datetime(now - age)),
            today: now.date_naive(),
        };
        if let Some(cursor) = ctx.cursor {
            info!(before = %cursor.timestamp().to_rfc3339(), "Purging messages older than cutoff");
        }

        let mut stats = PurgeStats::default();
        self.purge_communities(&ctx, archive, &mut stats).await?;
        if self.settings.include_dms {
            self.purge_direct_messages(&ctx, archive, &mut stats).await?;
        }

        info!(
            deleted = stats.messages_deleted,
            skipped = stats.messages_skipped,
            failed = stats.messages_failed,
            "Run complete"
        );
        Ok(stats)
    }

    async fn purge_communities(
        &self,
        ctx: &RunContext,
        archive: &mut ArchivedThreads,
        stats: &mut PurgeStats,
    ) -> Result<(), PurgeError> {
        let guilds = self
            .client
            .guilds()
            .await
            .map_err(|e| fatal("communities", e))?;
        info!(count = guilds.len(), "Found communities");

        for guild in guilds.iter().filter(|g| self.settings.includes_guild(g.id)) {
            let target = Target::community(guild);
            let channel_names = if self.settings.has_skip_patterns() {
                self.channel_names(guild.id, &guild.name).await?
            } else {
                None
            };

            stats.communities_processed += 1;
            self.purge_target(
                ctx,
                &target,
                &guild.name,
                channel_names.as_ref(),
                archive,
                stats,
            )
            .await?;
        }
        Ok(())
    }

    /// Best effort: a failed listing only disables skip matching for this community.
    async fn channel_names(
        &self,
        guild_id: Snowflake,
        guild_name: &str,
    ) -> Result<Option<HashMap<Snowflake, String>>, PurgeError> {
        match self.client.guild_channels(guild_id).await {
            Ok(channels) => Ok(Some(
                channels
                    .into_iter()
                    .filter_map(|c| c.name.map(|name| (c.id, name)))
                    .collect(),
            )),
            Err(e) if e.is_unauthorized() => Err(PurgeError::Unauthorized),
            Err(e) => {
                warn!(
                    community = %guild_name,
                    error = %e,
                    "Could not list channels, skip patterns disabled for this community"
                );
                Ok(None)
            }
        }
    }

    async fn purge_direct_messages(
        &self,
        ctx: &RunContext,
        archive: &mut ArchivedThreads,
        stats: &mut PurgeStats,
    ) -> Result<(), PurgeError> {
        let channels = self
            .client
            .dm_channels()
            .await
            .map_err(|e| fatal("direct message channels", e))?;
        info!(count = channels.len(), "Found direct message channels");

        for channel in channels
            .iter()
            .filter(|c| self.settings.includes_dm_channel(c.id))
        {
            let target = Target::direct_message(channel);
            if self.settings.skip_matches(target.name()) {
                info!(name = %target.name(), "Skipping direct message channel");
                continue;
            }

            stats.channels_processed += 1;
            self.purge_target(ctx, &target, target.name(), None, archive, stats)
                .await?;
        }
        Ok(())
    }

    /// Run one target. Only an authentication failure escapes; anything else
    /// is logged and recorded so the remaining targets still run.
    async fn purge_target(
        &self,
        ctx: &RunContext,
        target: &Target,
        community_name: &str,
        channel_names: Option<&HashMap<Snowflake, String>>,
        archive: &mut ArchivedThreads,
        stats: &mut PurgeStats,
    ) -> Result<(), PurgeError> {
        let job = TargetPurge {
            client: &self.client,
            settings: &self.settings,
            target,
            user_id: ctx.user_id,
            community_name,
            channel_names,
        };

        match job.run(ctx.cursor, archive, stats, ctx.today).await {
            Ok(TargetOutcome::Exhausted { .. }) | Ok(TargetOutcome::Forbidden) => Ok(()),
            Err(ApiError::Unauthorized) => Err(PurgeError::Unauthorized),
            Err(e) => {
                warn!(name = %target.name(), error = %e, "Target failed, continuing");
                stats.record_error(format!("{} {}: {}", target.kind_label(), target.name(), e));
                Ok(())
            }
        }
    }
}

fn fatal(what: &'static str, err: ApiError) -> PurgeError {
    if err.is_unauthorized() {
        return PurgeError::Unauthorized;
    }
    PurgeError::Enumeration { what, source: err }
}
