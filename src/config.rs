//! League rules: every constant the engine consumes

use crate::error::ConfigError;
use crate::logging::LogLevel;
use crate::types::{Dollars, Version};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

const MAX_TRADE_EXPIRY_DAYS: i64 = 3650;

/// Versioned league rule set
///
/// Missing fields in a JSON document fall back to the league defaults, so
/// `{"cap_limit": 110}` is a complete configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeagueRules {
    pub version: Version,
    pub cap_limit: Dollars,
    pub max_roster_size: usize,
    pub min_forwards: usize,
    pub min_defensemen: usize,
    /// Distinct players a team may carry retained salary on
    pub max_retention_spots: usize,
    /// Share of one player's salary that may be retained in a trade
    pub max_retention_percent: i64,
    pub trade_expiry_days: i64,
    pub buyout_percent: i64,
    /// Salaries at or below this are waived without penalty
    pub buyout_salary_floor: Dollars,
    /// Reject bids larger than the bidding team's remaining cap space
    pub bid_requires_cap_space: bool,
    /// Bids placed at or after this instant are refused
    pub auction_cutoff: Option<DateTime<Utc>>,
    /// Minimum level kept in the activity feed. Raising it above `Info`
    /// drops routine entries such as `TradeExpired` from the feed; the
    /// snapshot's `expired` flag and `cancellation` record stay authoritative.
    pub log_level: LogLevel,
}

impl Default for LeagueRules {
    fn default() -> Self {
        Self {
            version: Version::default(),
            cap_limit: 100,
            max_roster_size: 15,
            min_forwards: 8,
            min_defensemen: 4,
            max_retention_spots: 3,
            max_retention_percent: 50,
            trade_expiry_days: 7,
            buyout_percent: 25,
            buyout_salary_floor: 1,
            bid_requires_cap_space: true,
            auction_cutoff: None,
            log_level: LogLevel::Info,
        }
    }
}

impl LeagueRules {
    /// Parse and validate rules from JSON
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let rules: LeagueRules = serde_json::from_str(json)?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cap_limit <= 0 {
            return Err(invalid(format!("cap_limit must be positive, got {}", self.cap_limit)));
        }
        if self.max_roster_size == 0 {
            return Err(invalid("max_roster_size must be positive".to_string()));
        }
        if self.min_forwards.saturating_add(self.min_defensemen) > self.max_roster_size {
            return Err(invalid(format!(
                "position minimums ({} F + {} D) exceed max_roster_size {}",
                self.min_forwards, self.min_defensemen, self.max_roster_size
            )));
        }
        if !(0..=100).contains(&self.max_retention_percent) {
            return Err(invalid(format!(
                "max_retention_percent must be within 0..=100, got {}",
                self.max_retention_percent
            )));
        }
        if !(0..=100).contains(&self.buyout_percent) {
            return Err(invalid(format!(
                "buyout_percent must be within 0..=100, got {}",
                self.buyout_percent
            )));
        }
        if !(1..=MAX_TRADE_EXPIRY_DAYS).contains(&self.trade_expiry_days) {
            return Err(invalid(format!(
                "trade_expiry_days must be within 1..={MAX_TRADE_EXPIRY_DAYS}, got {}",
                self.trade_expiry_days
            )));
        }
        if self.buyout_salary_floor < 0 {
            return Err(invalid("buyout_salary_floor must be non-negative".to_string()));
        }
        Ok(())
    }

    pub fn trade_expiry(&self) -> Duration {
        Duration::days(self.trade_expiry_days.clamp(1, MAX_TRADE_EXPIRY_DAYS))
    }

    /// Most salary that may be retained on a player earning `salary`
    pub fn max_retention_for(&self, salary: Dollars) -> Dollars {
        salary.max(0).saturating_mul(self.max_retention_percent) / 100
    }

    pub fn with_cap_limit(mut self, cap_limit: Dollars) -> Self {
        self.cap_limit = cap_limit;
        self
    }

    pub fn with_auction_cutoff(mut self, cutoff: DateTime<Utc>) -> Self {
        self.auction_cutoff = Some(cutoff);
        self
    }

    pub fn with_bid_cap_check(mut self, enabled: bool) -> Self {
        self.bid_requires_cap_space = enabled;
        self
    }
}

fn invalid(reason: String) -> ConfigError {
    ConfigError::Invalid { reason }
}
