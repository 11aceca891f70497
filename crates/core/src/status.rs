//! Append-only status feed shown to the operator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a status entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Error => "error",
        }
    }
}

/// A single human-readable event in the status feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEntry {
    /// Strictly increasing within one log, starting at 1.
    pub id: u64,
    pub message: String,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
}

/// Ordered, append-only record of workflow events.
///
/// Ids come from a counter rather than the clock, so two entries appended
/// within the same millisecond still get distinct ids.
#[derive(Debug, Clone, Default)]
pub struct StatusLog {
    entries: Vec<StatusEntry>,
    last_id: u64,
}

impl StatusLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new entry at the tail and return it.
    pub fn append(&mut self, message: impl Into<String>, severity: Severity) -> &StatusEntry {
        self.last_id += 1;
        let entry = StatusEntry {
            id: self.last_id,
            message: message.into(),
            severity,
            created_at: Utc::now(),
        };
        tracing::debug!(id = entry.id, severity = severity.as_str(), "{}", entry.message);
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    pub fn info(&mut self, message: impl Into<String>) -> &StatusEntry {
        self.append(message, Severity::Info)
    }

    pub fn success(&mut self, message: impl Into<String>) -> &StatusEntry {
        self.append(message, Severity::Success)
    }

    pub fn error(&mut self, message: impl Into<String>) -> &StatusEntry {
        self.append(message, Severity::Error)
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> &[StatusEntry] {
        &self.entries
    }

    /// Entries appended after the entry with the given id.
    pub fn since(&self, id: u64) -> &[StatusEntry] {
        let start = self.entries.partition_point(|e| e.id <= id);
        &self.entries[start..]
    }

    pub fn last(&self) -> Option<&StatusEntry> {
        self.entries.last()
    }

    /// Id of the newest entry, or 0 for an empty log.
    pub fn last_id(&self) -> u64 {
        self.last_id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order_and_severity() {
        let mut log = StatusLog::new();
        log.info("Industry selected: Retail");
        log.success("File uploaded successfully");
        log.error("server error");

        let messages: Vec<_> = log.entries().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec!["Industry selected: Retail", "File uploaded successfully", "server error"]
        );
        assert_eq!(log.entries()[1].severity, Severity::Success);
        assert_eq!(log.entries()[2].severity, Severity::Error);
    }

    #[test]
    fn test_ids_unique_in_tight_loop() {
        let mut log = StatusLog::new();
        for i in 0..1000 {
            log.info(format!("event {}", i));
        }
        let ids: Vec<u64> = log.entries().iter().map(|e| e.id).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(ids.first(), Some(&1));
        assert_eq!(ids.last(), Some(&1000));
    }

    #[test]
    fn test_since() {
        let mut log = StatusLog::new();
        log.info("a");
        log.info("b");
        log.info("c");

        assert_eq!(log.since(0).len(), 3);
        let tail = log.since(2);
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].message, "c");
        assert!(log.since(3).is_empty());
        assert!(log.since(99).is_empty());
    }

    #[test]
    fn test_severity_serialization() {
        let json = serde_json::to_string(&Severity::Success).unwrap();
        assert_eq!(json, "\"success\"");
    }
}
