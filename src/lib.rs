//! Roster Transaction Engine (RTE)
//!
//! Roster transactions and settlement for a salary-capped fantasy hockey
//! league: free-agent auctions, trades with retained salary and buyout
//! penalty transfer, buyouts and commissioner overrides. Every operation is
//! a pure function from a league snapshot to a new snapshot plus an activity
//! log, driven by a caller-supplied clock.

pub mod auction;
pub mod cap;
pub mod commissioner;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod hasher;
pub mod ledger;
pub mod legality;
pub mod logging;
pub mod trade_lifecycle;
pub mod trade_settlement;
pub mod trade_validator;
pub mod traits;
pub mod types;

// Re-export core types and traits
pub use auction::{open_auctions, place_bid, resolve_auctions, AuctionResolution, AuctionSummary, BidRequest, Signing};
pub use config::LeagueRules;
pub use context::{DeterministicTime, ExecutionContext, SeededRandom};
pub use engine::{LeagueAction, LeagueEngine, ReplayResult, TimedAction};
pub use error::{ConfigError, EngineError, RuleViolation, StateError};
pub use hasher::StateHasher;
pub use legality::{LegalityIssue, Warning};
pub use logging::{ActivityLog, EventKind, LogEntry, LogLevel};
pub use trade_lifecycle::{CancelOptions, TradeBook};
pub use trade_validator::{TradeDraft, ValidatedTrade};
pub use traits::State;
pub use types::{
    Bid, Dollars, LeagueState, NameKey, PenaltyEntry, PenaltyKind, Player, Position, Rejection, StateHash, Team,
    TradeProposal, TradeStatus, Transition, Version,
};
