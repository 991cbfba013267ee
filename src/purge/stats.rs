use serde::Serialize;

/// Aggregate counters for one run. Created fresh per run, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeStats {
    pub communities_processed: u64,
    pub channels_processed: u64,
    pub messages_deleted: u64,
    pub messages_skipped: u64,
    pub messages_failed: u64,
    /// One line per unrecoverable per-message or per-target failure.
    pub errors: Vec<String>,
}

impl PurgeStats {
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Any message deletion failed; drives the process exit code.
    pub fn has_failures(&self) -> bool {
        self.messages_failed > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failures_are_driven_by_failed_messages_only() {
        let mut stats = PurgeStats::default();
        stats.record_error("community Rust: index not ready");
        assert!(!stats.has_failures());
        stats.messages_failed = 1;
        assert!(stats.has_failures());
    }

    #[test]
    fn test_serializes_camel_case() {
        let stats = PurgeStats {
            messages_deleted: 3,
            ..Default::default()
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["messagesDeleted"], 3);
        assert_eq!(json["communitiesProcessed"], 0);
    }
}
