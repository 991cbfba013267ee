//! Cross-run memory of archived threads.
//!
//! Deleting from an archived thread fails until someone unarchives it, so the
//! first failure is recorded here and every later run skips the channel
//! without calling the delete endpoint.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::snowflake::Snowflake;

pub const ARCHIVE_FILE_NAME: &str = "archived_threads.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedThread {
    pub community_name: String,
    pub channel_name: String,
    /// Serialized as `YYYY-MM-DD`.
    pub discovered_date: NaiveDate,
}

/// Archived threads keyed by channel id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArchivedThreads(BTreeMap<String, ArchivedThread>);

impl ArchivedThreads {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, channel_id: Snowflake) -> bool {
        self.0.contains_key(&channel_id.to_string())
    }

    /// Remember a channel as archived. Returns `false` if it was already known,
    /// in which case the original entry is kept.
    pub fn record(&mut self, channel_id: Snowflake, thread: ArchivedThread) -> bool {
        use std::collections::btree_map::Entry;
        match self.0.entry(channel_id.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(thread);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    pub fn get(&self, channel_id: Snowflake) -> Option<&ArchivedThread> {
        self.0.get(&channel_id.to_string())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ArchivedThread)> {
        self.0.iter()
    }
}

/// JSON file holding `ArchivedThreads` between runs.
#[derive(Debug, Clone)]
pub struct ArchiveStore {
    path: PathBuf,
}

impl ArchiveStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store in the per-user data directory.
    pub fn default_location() -> Result<Self> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Ok(Self::new(data_dir.join("msgpurge").join(ARCHIVE_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty map, not an error.
    pub fn load(&self) -> Result<ArchivedThreads> {
        if !self.path.exists() {
            return Ok(ArchivedThreads::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))
    }

    /// Write the map; an empty map leaves the filesystem untouched.
    pub fn save(&self, threads: &ArchivedThreads) -> Result<()> {
        if threads.is_empty() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content =
            serde_json::to_string_pretty(threads).context("Failed to serialize archived threads")?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }

    /// Forget every archived thread. Returns whether a file was removed.
    pub fn clear(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&self.path)
            .with_context(|| format!("Failed to remove {}", self.path.display()))?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn thread(channel: &str) -> ArchivedThread {
        ArchivedThread {
            community_name: "Rustaceans".to_string(),
            channel_name: channel.to_string(),
            discovered_date: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
        }
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = ArchiveStore::new(dir.path().join("nope.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let store = ArchiveStore::new(dir.path().join("state").join(ARCHIVE_FILE_NAME));

        let mut threads = ArchivedThreads::new();
        threads.record(Snowflake::new(1_234_567_890_123_456_789), thread("old-thread"));
        store.save(&threads).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, threads);
        assert!(loaded.contains(Snowflake::new(1_234_567_890_123_456_789)));
    }

    #[test]
    fn test_file_format_uses_camel_case_and_iso_date() {
        let dir = tempdir().unwrap();
        let store = ArchiveStore::new(dir.path().join(ARCHIVE_FILE_NAME));
        let mut threads = ArchivedThreads::new();
        threads.record(Snowflake::new(42), thread("help-thread"));
        store.save(&threads).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["42"]["communityName"], "Rustaceans");
        assert_eq!(raw["42"]["channelName"], "help-thread");
        assert_eq!(raw["42"]["discoveredDate"], "2024-03-09");
    }

    #[test]
    fn test_empty_map_is_not_written() {
        let dir = tempdir().unwrap();
        let store = ArchiveStore::new(dir.path().join(ARCHIVE_FILE_NAME));
        store.save(&ArchivedThreads::new()).unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn test_record_keeps_first_entry() {
        let mut threads = ArchivedThreads::new();
        assert!(threads.record(Snowflake::new(5), thread("first")));
        assert!(!threads.record(Snowflake::new(5), thread("second")));
        assert_eq!(threads.get(Snowflake::new(5)).unwrap().channel_name, "first");
        assert_eq!(threads.len(), 1);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(ARCHIVE_FILE_NAME);
        std::fs::write(&path, "{not json").unwrap();
        assert!(ArchiveStore::new(path).load().is_err());
    }

    #[test]
    fn test_clear_removes_file() {
        let dir = tempdir().unwrap();
        let store = ArchiveStore::new(dir.path().join(ARCHIVE_FILE_NAME));
        assert!(!store.clear().unwrap());
        let mut threads = ArchivedThreads::new();
        threads.record(Snowflake::new(1), thread("t"));
        store.save(&threads).unwrap();
        assert!(store.clear().unwrap());
        assert!(!store.path().exists());
    }
}
