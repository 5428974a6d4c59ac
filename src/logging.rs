//! Deterministic activity logging
//!
//! Every engine operation describes what it did as a list of log entries for
//! the league's activity feed. Entries are stamped with the caller's clock,
//! never the system clock, so replaying the same actions yields the same log.

use crate::types::Version;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Log level for activity entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    /// Trace level - most verbose
    Trace,
    /// Debug level - detailed information
    Debug,
    /// Info level - league activity
    Info,
    /// Warning level - legality findings and shortfalls
    Warn,
    /// Error level - errors that occurred
    Error,
}

/// What kind of league event an entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    BidPlaced,
    BidReplaced,
    PlayerSigned,
    AuctionVoided,
    TradeProposed,
    TradeAccepted,
    TradeRejected,
    TradeCancelled,
    TradeExpired,
    PenaltyTransferred,
    PlayerBoughtOut,
    PlayerAdded,
    PlayerRemoved,
    InjuredReserveChanged,
    LegalityWarning,
}

/// A deterministic log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    /// Timestamp from the caller's clock
    pub timestamp: DateTime<Utc>,
    pub event: EventKind,
    /// Team the event is about, if any
    pub team: Option<String>,
    /// Trade or bid id the event is about, if any
    pub subject_id: Option<String>,
    /// Rule version in force when the event happened
    pub rule_version: Option<Version>,
    pub message: String,
    /// Additional structured data
    pub metadata: Vec<(String, String)>,
}

impl LogEntry {
    /// Create a new log entry
    pub fn new(level: LogLevel, event: EventKind, timestamp: DateTime<Utc>, message: String) -> Self {
        Self {
            level,
            timestamp,
            event,
            team: None,
            subject_id: None,
            rule_version: None,
            message,
            metadata: Vec::new(),
        }
    }

    pub fn info(event: EventKind, timestamp: DateTime<Utc>, message: String) -> Self {
        Self::new(LogLevel::Info, event, timestamp, message)
    }

    pub fn warn(event: EventKind, timestamp: DateTime<Utc>, message: String) -> Self {
        Self::new(LogLevel::Warn, event, timestamp, message)
    }

    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = Some(team.into());
        self
    }

    pub fn with_subject(mut self, id: impl Into<String>) -> Self {
        self.subject_id = Some(id.into());
        self
    }

    /// Add rule context to the log entry
    pub fn with_rule(mut self, version: Version) -> Self {
        self.rule_version = Some(version);
        self
    }

    /// Add metadata to the log entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.metadata.push((key.into(), value.to_string()));
        self
    }
}

/// Collects activity entries without side effects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLog {
    entries: Vec<LogEntry>,
    min_level: LogLevel,
}

impl ActivityLog {
    pub fn new(min_level: LogLevel) -> Self {
        Self {
            entries: Vec::new(),
            min_level,
        }
    }

    /// Create a log that captures all levels
    pub fn all() -> Self {
        Self::new(LogLevel::Trace)
    }

    /// Create a log that captures info and above
    pub fn with_info_level() -> Self {
        Self::new(LogLevel::Info)
    }

    /// Record an entry if it meets the minimum level
    pub fn log(&mut self, entry: LogEntry) {
        if self.should_log(entry.level) {
            self.entries.push(entry);
        }
    }

    fn should_log(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<LogEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn filter_by_level(&self, level: LogLevel) -> Vec<&LogEntry> {
        self.entries.iter().filter(|e| e.level == level).collect()
    }

    pub fn filter_by_event(&self, event: EventKind) -> Vec<&LogEntry> {
        self.entries.iter().filter(|e| e.event == event).collect()
    }

    /// Entries about a given trade or bid
    pub fn filter_by_subject(&self, subject_id: &str) -> Vec<&LogEntry> {
        self.entries
            .iter()
            .filter(|e| e.subject_id.as_deref() == Some(subject_id))
            .collect()
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::with_info_level()
    }
}
