//! Layered configuration for msgpurge.
//!
//! Settings are read from `msgpurge.toml` (by default in the per-user config
//! directory), then overridden by environment variables, then by CLI flags.
//!
//! # Configuration File Format
//!
//! ```toml
//! [auth]
//! token = "..."            # prefer MSGPURGE_TOKEN over storing it here
//!
//! [api]
//! base_url = "https://discord.com/api/v9"
//! timeout_secs = 30
//!
//! [purge]
//! max_age_days = 30
//! dry_run = false
//! delete_delay_ms = 1200
//! search_delay_ms = 3000
//! include_dms = true
//! skip_channels = ["announcements", "rules"]
//! include_guilds = []
//! exclude_guilds = ["123456789012345678"]
//! include_dms_ids = []
//! exclude_dms_ids = []
//!
//! [storage]
//! archived_threads_file = "/path/to/archived_threads.json"
//!
//! [logging]
//! format = "text"           # or "json"
//! file = "/path/to/msgpurge.log"
//! ```

use anyhow::{Context, Result};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::transport::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use crate::archive::ArchiveStore;
use crate::purge::PurgeSettings;
use crate::snowflake::Snowflake;

pub const CONFIG_FILE_NAME: &str = "msgpurge.toml";
pub const TOKEN_ENV: &str = "MSGPURGE_TOKEN";
pub const DRY_RUN_ENV: &str = "MSGPURGE_DRY_RUN";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurgeSection {
    /// Only purge messages older than this many days
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age_days: Option<u32>,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default = "default_delete_delay_ms")]
    pub delete_delay_ms: u64,
    #[serde(default = "default_search_delay_ms")]
    pub search_delay_ms: u64,
    #[serde(default = "default_include_dms")]
    pub include_dms: bool,
    /// Channel-name substrings to leave alone
    #[serde(default)]
    pub skip_channels: Vec<String>,
    #[serde(default)]
    pub include_guilds: Vec<Snowflake>,
    #[serde(default)]
    pub exclude_guilds: Vec<Snowflake>,
    #[serde(default)]
    pub include_dms_ids: Vec<Snowflake>,
    #[serde(default)]
    pub exclude_dms_ids: Vec<Snowflake>,
}

fn default_delete_delay_ms() -> u64 {
    1200
}

fn default_search_delay_ms() -> u64 {
    3000
}

fn default_include_dms() -> bool {
    true
}

impl Default for PurgeSection {
    fn default() -> Self {
        Self {
            max_age_days: None,
            dry_run: false,
            delete_delay_ms: default_delete_delay_ms(),
            search_delay_ms: default_search_delay_ms(),
            include_dms: default_include_dms(),
            skip_channels: Vec::new(),
            include_guilds: Vec::new(),
            exclude_guilds: Vec::new(),
            include_dms_ids: Vec::new(),
            exclude_dms_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_threads_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSection {
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

/// The complete msgpurge.toml structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PurgeToml {
    #[serde(default)]
    pub auth: AuthSection,
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub purge: PurgeSection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

impl PurgeToml {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse msgpurge.toml")
    }

    /// Returns default configuration if the file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize msgpurge.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let purge = &self.purge;

        if purge.delete_delay_ms == 0 {
            warnings.push(
                "delete_delay_ms is 0: deletes will not be paced and will hit rate limits"
                    .to_string(),
            );
        }
        if purge.search_delay_ms == 0 {
            warnings.push(
                "search_delay_ms is 0: searches will not be paced and will hit rate limits"
                    .to_string(),
            );
        }
        if purge.skip_channels.iter().any(|p| p.trim().is_empty()) {
            warnings.push("skip_channels contains an empty pattern; it is ignored".to_string());
        }
        for id in purge
            .include_guilds
            .iter()
            .filter(|id| purge.exclude_guilds.contains(id))
        {
            warnings.push(format!(
                "Community {} is both included and excluded; it will be excluded",
                id
            ));
        }
        for id in purge
            .include_dms_ids
            .iter()
            .filter(|id| purge.exclude_dms_ids.contains(id))
        {
            warnings.push(format!(
                "Direct message channel {} is both included and excluded; it will be excluded",
                id
            ));
        }
        if !self.api.base_url.starts_with("https://") {
            warnings.push(format!(
                "base_url '{}' is not HTTPS; the token would be sent in clear text",
                self.api.base_url
            ));
        }
        if self.auth.token.is_some() {
            warnings.push(format!(
                "Token stored in the config file; consider {} instead",
                TOKEN_ENV
            ));
        }

        warnings
    }
}

/// Flags given on the command line. `None`/empty means "not given".
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub token: Option<String>,
    pub dry_run: bool,
    pub max_age_days: Option<u32>,
    pub skip_channels: Vec<String>,
    pub no_dms: bool,
}

/// Unified configuration: msgpurge.toml, environment, CLI.
#[derive(Debug, Clone)]
pub struct PurgeConfig {
    pub path: PathBuf,
    pub toml: PurgeToml,
    pub cli: CliOverrides,
}

impl PurgeConfig {
    /// Default config file location in the per-user config directory.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("msgpurge").join(CONFIG_FILE_NAME))
    }

    pub fn load(path: Option<&Path>, cli: CliOverrides) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };
        let toml = PurgeToml::load_or_default(&path)?;
        Ok(Self { path, toml, cli })
    }

    /// Token (CLI → env → file).
    pub fn token(&self) -> Option<String> {
        self.token_with(|key| std::env::var(key).ok())
    }

    fn token_with(&self, env: impl Fn(&str) -> Option<String>) -> Option<String> {
        self.cli
            .token
            .clone()
            .or_else(|| env(TOKEN_ENV))
            .or_else(|| self.toml.auth.token.clone())
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }

    /// Dry-run (CLI → env → file). The CLI flag can only turn it on.
    pub fn dry_run(&self) -> bool {
        self.dry_run_with(|key| std::env::var(key).ok())
    }

    fn dry_run_with(&self, env: impl Fn(&str) -> Option<String>) -> bool {
        if self.cli.dry_run {
            return true;
        }
        if let Some(value) = env(DRY_RUN_ENV) {
            return !matches!(value.trim().to_lowercase().as_str(), "" | "0" | "false" | "no");
        }
        self.toml.purge.dry_run
    }

    pub fn settings(&self) -> PurgeSettings {
        let purge = &self.toml.purge;
        let mut skip_channels = purge.skip_channels.clone();
        for pattern in &self.cli.skip_channels {
            if !skip_channels.contains(pattern) {
                skip_channels.push(pattern.clone());
            }
        }

        PurgeSettings {
            dry_run: self.dry_run(),
            skip_channels,
            delete_delay: Duration::from_millis(purge.delete_delay_ms),
            search_delay: Duration::from_millis(purge.search_delay_ms),
            max_age: self
                .cli
                .max_age_days
                .or(purge.max_age_days)
                .map(|days| TimeDelta::days(i64::from(days))),
            include_dms: purge.include_dms && !self.cli.no_dms,
            include_guilds: purge.include_guilds.clone(),
            exclude_guilds: purge.exclude_guilds.clone(),
            include_dm_channels: purge.include_dms_ids.clone(),
            exclude_dm_channels: purge.exclude_dms_ids.clone(),
        }
    }

    pub fn archive_store(&self) -> Result<ArchiveStore> {
        match &self.toml.storage.archived_threads_file {
            Some(path) => Ok(ArchiveStore::new(path.clone())),
            None => ArchiveStore::default_location(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.toml.api.timeout_secs)
    }
}
