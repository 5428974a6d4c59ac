//! Error types for the roster engine

use crate::types::{Dollars, TradeStatus};
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Rejected: {0}")]
    Rule(#[from] RuleViolation),

    #[error("State error: {0}")]
    State(#[from] StateError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl From<crate::types::Rejection> for EngineError {
    fn from(rejection: crate::types::Rejection) -> Self {
        EngineError::Rule(rejection.error)
    }
}

/// Validation rejections. Raised before any mutation; the message is meant
/// to be shown to the manager as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleViolation {
    #[error("{side} player list is empty")]
    EmptyPlayerList { side: &'static str },

    #[error("Team not found: {team}")]
    TeamNotFound { team: String },

    #[error("{team} cannot trade with itself")]
    SelfTrade { team: String },

    #[error("{player} is not on {team}'s roster")]
    PlayerNotOnRoster { player: String, team: String },

    #[error("{field} must be non-negative, got {amount}")]
    NegativeAmount { field: &'static str, amount: Dollars },

    #[error("{team} cannot send ${requested} of buyout penalty, only ${available} available")]
    PenaltyExceedsAvailable {
        team: String,
        requested: Dollars,
        available: Dollars,
    },

    #[error("{team} cannot retain salary on {player}: player is not in their side of the trade")]
    RetentionPlayerNotInTrade { player: String, team: String },

    #[error("Cannot retain ${requested} on {player}, the maximum is ${max}")]
    RetentionExceedsLimit {
        player: String,
        requested: Dollars,
        max: Dollars,
    },

    #[error("{team} would hold {projected} retained players, the maximum is {max}")]
    RetentionSpotsExceeded {
        team: String,
        projected: usize,
        max: usize,
    },

    #[error("{player} is already part of pending trade {trade_id}")]
    PlayerInPendingTrade { player: String, trade_id: String },

    #[error("Trade not found: {trade_id}")]
    TradeNotFound { trade_id: String },

    #[error("Trade {trade_id} is {status}, not pending")]
    TradeNotPending {
        trade_id: String,
        status: TradeStatus,
    },

    #[error("Trade {trade_id} expired at {expires_at}")]
    TradeExpired {
        trade_id: String,
        expires_at: DateTime<Utc>,
    },

    #[error("Trade {trade_id} can no longer settle: {player} is not on {team}'s roster")]
    TradeRosterChanged {
        trade_id: String,
        player: String,
        team: String,
    },

    #[error("{player} cannot be bought out until {until}")]
    BuyoutLocked {
        player: String,
        until: DateTime<Utc>,
    },

    #[error("{player} is already rostered by {team}")]
    PlayerAlreadyRostered { player: String, team: String },

    #[error("Bid amount must be positive, got {amount}")]
    InvalidBidAmount { amount: Dollars },

    #[error("Bidding closed at {cutoff}")]
    BiddingClosed { cutoff: DateTime<Utc> },

    #[error("{team} has ${available} of cap space and cannot bid ${amount}")]
    InsufficientCapSpace {
        team: String,
        amount: Dollars,
        available: Dollars,
    },

    #[error("Player name is empty")]
    EmptyPlayerName,

    #[error("Invalid league snapshot: {0}")]
    InvalidSnapshot(#[from] StateError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("Duplicate team name: {team}")]
    DuplicateTeam { team: String },

    #[error("Invalid state: {reason}")]
    InvalidState { reason: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid rules: {reason}")]
    Invalid { reason: String },

    #[error("Failed to parse rules: {0}")]
    Parse(#[from] serde_json::Error),
}
