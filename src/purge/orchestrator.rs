//! Per-target search → filter → delete loop.
//!
//! Each round searches below the cursor for the account's own messages,
//! deletes the hits oldest-first, and repeats until the search comes back
//! empty. When a round cannot make progress by deleting (everything filtered,
//! archived, already gone, or simulated) the cursor is pushed below the page
//! so the next search sees different results. The cursor only ever decreases.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, error, info, warn};

use super::settings::PurgeSettings;
use super::stats::PurgeStats;
use super::target::Target;
use crate::api::{ApiClient, Message, SEARCH_PAGE_SIZE, SearchQuery, SearchResult, Transport};
use crate::archive::{ArchivedThread, ArchivedThreads};
use crate::errors::ApiError;
use crate::snowflake::Snowflake;

/// How a target's loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOutcome {
    /// Search stopped returning work after `rounds` searches.
    Exhausted { rounds: u32 },
    /// The account has no access to the target.
    Forbidden,
}

/// One target's purge, borrowing everything it needs from the run.
pub struct TargetPurge<'a, T> {
    pub client: &'a ApiClient<T>,
    pub settings: &'a PurgeSettings,
    pub target: &'a Target,
    pub user_id: Snowflake,
    /// Display name of the enclosing community, used in warnings and archive records.
    pub community_name: &'a str,
    /// Channel id → name for skip-pattern matching (communities only).
    pub channel_names: Option<&'a HashMap<Snowflake, String>>,
}

enum RoundEnd {
    /// Target exhausted.
    Done,
    /// Something was deleted; search again under the same cursor.
    Deleted,
    /// Nothing was deleted; search again below this id.
    Advance(Snowflake),
}

impl<T: Transport> TargetPurge<'_, T> {
    /// Drive the loop to completion.
    ///
    /// Forbidden searches end the loop quietly; any other search failure is
    /// returned for the caller to record. `Unauthorized` from delete is
    /// returned as well since no further call can succeed.
    pub async fn run(
        &self,
        initial_cursor: Option<Snowflake>,
        archive: &mut ArchivedThreads,
        stats: &mut PurgeStats,
        today: NaiveDate,
    ) -> Result<TargetOutcome, ApiError> {
        let scope = self.target.search_scope();
        let mut cursor = initial_cursor;
        let mut rounds = 0u32;

        info!(
            kind = self.target.kind_label(),
            name = %self.target.name(),
            id = %self.target.id(),
            "Purging target"
        );

        loop {
            rounds += 1;
            let query = SearchQuery {
                author_id: self.user_id,
                max_id: cursor,
                min_id: None,
            };
            let page = match self.client.search(scope, query).await {
                Ok(page) => page,
                Err(ApiError::Forbidden { path }) => {
                    warn!(name = %self.target.name(), %path, "No access, skipping target");
                    return Ok(TargetOutcome::Forbidden);
                }
                Err(e) => return Err(e),
            };

            debug!(
                name = %self.target.name(),
                round = rounds,
                cursor = ?cursor.map(|c| c.get()),
                total = page.total_results,
                groups = page.messages.len(),
                "Search round"
            );

            match self.process_page(page, archive, stats, today).await? {
                RoundEnd::Done => break,
                RoundEnd::Deleted => {}
                RoundEnd::Advance(next) => {
                    if let Some(prev) = cursor
                        && next >= prev
                    {
                        warn!(
                            name = %self.target.name(),
                            cursor = prev.get(),
                            "Search returned ids at or above the cursor, stopping"
                        );
                        break;
                    }
                    cursor = Some(next);
                }
            }

            tokio::time::sleep(self.settings.search_delay).await;
        }

        info!(name = %self.target.name(), rounds, "Target exhausted");
        Ok(TargetOutcome::Exhausted { rounds })
    }

    async fn process_page(
        &self,
        page: SearchResult,
        archive: &mut ArchivedThreads,
        stats: &mut PurgeStats,
        today: NaiveDate,
    ) -> Result<RoundEnd, ApiError> {
        if page.total_results == 0 || page.messages.is_empty() {
            return Ok(RoundEnd::Done);
        }

        let Some(raw_min) = page.messages.iter().flatten().map(|m| m.id).min() else {
            return Ok(RoundEnd::Done);
        };
        let total = page.total_results;
        let hits = own_hits(page, self.user_id);
        let hits = self.drop_skipped(hits, stats);

        // Nothing left to act on: move below the raw page unless this was the last page.
        if hits.is_empty() {
            if total <= SEARCH_PAGE_SIZE {
                return Ok(RoundEnd::Done);
            }
            return Ok(RoundEnd::Advance(raw_min));
        }

        let min_hit = hits[0].id;
        let deleted = self.delete_hits(hits, archive, stats, today).await?;

        if deleted == 0 {
            return Ok(RoundEnd::Advance(min_hit.pred()));
        }
        Ok(RoundEnd::Deleted)
    }

    fn drop_skipped(&self, hits: Vec<Message>, stats: &mut PurgeStats) -> Vec<Message> {
        let Some(names) = self.channel_names else {
            return hits;
        };
        if !self.settings.has_skip_patterns() {
            return hits;
        }
        hits.into_iter()
            .filter(|m| {
                let skipped = names
                    .get(&m.channel_id)
                    .is_some_and(|name| self.settings.skip_matches(name));
                if skipped {
                    stats.messages_skipped += 1;
                }
                !skipped
            })
            .collect()
    }

    /// Delete hits in ascending id order. Returns the number of real deletions.
    async fn delete_hits(
        &self,
        hits: Vec<Message>,
        archive: &mut ArchivedThreads,
        stats: &mut PurgeStats,
        today: NaiveDate,
    ) -> Result<u64, ApiError> {
        let mut deleted = 0u64;

        for msg in hits {
            if archive.contains(msg.channel_id) {
                stats.messages_skipped += 1;
                continue;
            }

            if self.settings.dry_run {
                info!(
                    id = %msg.id,
                    channel = %msg.channel_id,
                    at = %msg.timestamp,
                    "[dry-run] Would delete: {}",
                    preview(&msg.content)
                );
                stats.messages_deleted += 1;
                continue;
            }

            match self.client.delete_message(msg.channel_id, msg.id).await {
                Ok(()) => {
                    debug!(id = %msg.id, channel = %msg.channel_id, "Deleted");
                    stats.messages_deleted += 1;
                    deleted += 1;
                }
                Err(ApiError::NotFound { .. }) => {
                    debug!(id = %msg.id, "Already gone");
                }
                Err(ApiError::ArchivedThread { .. }) => {
                    let channel_name = self.channel_name(msg.channel_id);
                    let recorded = archive.record(
                        msg.channel_id,
                        ArchivedThread {
                            community_name: self.community_name.to_string(),
                            channel_name: channel_name.clone(),
                            discovered_date: today,
                        },
                    );
                    if recorded {
                        warn!(
                            channel = %channel_name,
                            community = %self.community_name,
                            "Thread is archived, skipping it from now on"
                        );
                    }
                    stats.messages_skipped += 1;
                }
                Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized),
                Err(e) => {
                    error!(id = %msg.id, channel = %msg.channel_id, error = %e, "Delete failed");
                    stats.messages_failed += 1;
                    stats.record_error(format!(
                        "Failed to delete message {} in channel {} ({}): {}",
                        msg.id, msg.channel_id, self.community_name, e
                    ));
                }
            }

            tokio::time::sleep(self.settings.delete_delay).await;
        }

        Ok(deleted)
    }

    fn channel_name(&self, channel_id: Snowflake) -> String {
        if let Some(name) = self.channel_names.and_then(|names| names.get(&channel_id)) {
            return name.clone();
        }
        match self.target {
            Target::DirectMessage { name, .. } => name.clone(),
            Target::Community { .. } => channel_id.to_string(),
        }
    }
}

/// Flatten result groups into the account's own hits, de-duplicated and ascending.
fn own_hits(page: SearchResult, user_id: Snowflake) -> Vec<Message> {
    let mut by_id: BTreeMap<Snowflake, Message> = BTreeMap::new();
    for msg in page.messages.into_iter().flatten() {
        if msg.hit && msg.author.id == user_id {
            by_id.entry(msg.id).or_insert(msg);
        }
    }
    by_id.into_values().collect()
}

fn preview(content: &str) -> String {
    const MAX: usize = 60;
    let flat = content.replace('\n', " ");
    if flat.chars().count() <= MAX {
        flat
    } else {
        let cut: String = flat.chars().take(MAX).collect();
        format!("{}…", cut)
    }
}
