use chrono::TimeDelta;
use std::time::Duration;

use crate::snowflake::Snowflake;

pub const DEFAULT_DELETE_DELAY: Duration = Duration::from_millis(1200);
pub const DEFAULT_SEARCH_DELAY: Duration = Duration::from_millis(3000);

/// Resolved settings for one purge run.
#[derive(Debug, Clone)]
pub struct PurgeSettings {
    /// Log what would be deleted without calling the delete endpoint.
    pub dry_run: bool,
    /// Channel-name substrings to leave alone (case-insensitive).
    pub skip_channels: Vec<String>,
    /// Pause after every delete call.
    pub delete_delay: Duration,
    /// Pause between search rounds.
    pub search_delay: Duration,
    /// Only messages older than this are purged; `None` purges everything.
    pub max_age: Option<TimeDelta>,
    pub include_dms: bool,
    pub include_guilds: Vec<Snowflake>,
    pub exclude_guilds: Vec<Snowflake>,
    pub include_dm_channels: Vec<Snowflake>,
    pub exclude_dm_channels: Vec<Snowflake>,
}

impl Default for PurgeSettings {
    fn default() -> Self {
        Self {
            dry_run: false,
            skip_channels: Vec::new(),
            delete_delay: DEFAULT_DELETE_DELAY,
            search_delay: DEFAULT_SEARCH_DELAY,
            max_age: None,
            include_dms: true,
            include_guilds: Vec::new(),
            exclude_guilds: Vec::new(),
            include_dm_channels: Vec::new(),
            exclude_dm_channels: Vec::new(),
        }
    }
}

impl PurgeSettings {
    pub fn has_skip_patterns(&self) -> bool {
        self.skip_channels.iter().any(|p| !p.is_empty())
    }

    /// Whether a channel name contains any skip pattern, ignoring case.
    pub fn skip_matches(&self, channel_name: &str) -> bool {
        let name = channel_name.to_lowercase();
        self.skip_channels
            .iter()
            .filter(|p| !p.is_empty())
            .any(|p| name.contains(&p.to_lowercase()))
    }

    pub fn includes_guild(&self, id: Snowflake) -> bool {
        allowed(id, &self.include_guilds, &self.exclude_guilds)
    }

    pub fn includes_dm_channel(&self, id: Snowflake) -> bool {
        allowed(id, &self.include_dm_channels, &self.exclude_dm_channels)
    }
}

/// An empty include list admits everything; the exclude list always wins.
fn allowed(id: Snowflake, include: &[Snowflake], exclude: &[Snowflake]) -> bool {
    (include.is_empty() || include.contains(&id)) && !exclude.contains(&id)
}
