//! Core data types for the roster engine

use crate::error::{RuleViolation, StateError};
use crate::hasher::StateHasher;
use crate::legality::Warning;
use crate::logging::LogEntry;
use crate::traits::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Whole-dollar amounts. Negative values never count toward any total.
pub type Dollars = i64;

/// Semantic version for league rule sets
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    /// Create a new version
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::new(1, 0, 0)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Blake3 fingerprint of a league snapshot
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateHash(pub [u8; 32]);

impl fmt::Display for StateHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Normalized name used at every player and team comparison site.
///
/// Names are matched trimmed and case-insensitively, so `" Connor McDavid"`
/// and `"connor mcdavid"` address the same player.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NameKey(String);

impl NameKey {
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `name` normalizes to this key
    pub fn matches(&self, name: &str) -> bool {
        self.0 == name.trim().to_lowercase()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for NameKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for NameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Roster position. Unset positions count as forwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    #[default]
    #[serde(rename = "F")]
    Forward,
    #[serde(rename = "D")]
    Defense,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Forward => f.write_str("F"),
            Position::Defense => f.write_str("D"),
        }
    }
}

/// A rostered player. Owned by exactly one team at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    #[serde(default)]
    pub salary: Dollars,
    #[serde(default)]
    pub position: Position,
    /// Injured reserve players are excluded from cap, size and position counts
    #[serde(default)]
    pub on_ir: bool,
    #[serde(default)]
    pub buyout_locked_until: Option<DateTime<Utc>>,
}

impl Player {
    pub fn new(name: impl Into<String>, salary: Dollars, position: Position) -> Self {
        Self {
            name: name.into(),
            salary,
            position,
            on_ir: false,
            buyout_locked_until: None,
        }
    }

    pub fn forward(name: impl Into<String>, salary: Dollars) -> Self {
        Self::new(name, salary, Position::Forward)
    }

    pub fn defense(name: impl Into<String>, salary: Dollars) -> Self {
        Self::new(name, salary, Position::Defense)
    }

    pub fn with_ir(mut self, on_ir: bool) -> Self {
        self.on_ir = on_ir;
        self
    }

    pub fn locked_until(mut self, until: DateTime<Utc>) -> Self {
        self.buyout_locked_until = Some(until);
        self
    }

    pub fn key(&self) -> NameKey {
        NameKey::new(&self.name)
    }

    pub fn is_active(&self) -> bool {
        !self.on_ir
    }

    /// Salary as it counts against the cap
    pub fn cap_hit(&self) -> Dollars {
        self.salary.max(0)
    }
}

/// Which bucket a penalty entry belongs to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PenaltyKind {
    /// Penalty from a waived player, transferable in trades
    #[default]
    Buyout,
    /// Salary retained on a player traded away
    Retained,
}

/// One line of a team's penalty ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyEntry {
    pub player: String,
    #[serde(default)]
    pub penalty: Dollars,
    #[serde(default)]
    pub kind: PenaltyKind,
}

impl PenaltyEntry {
    pub fn buyout(player: impl Into<String>, penalty: Dollars) -> Self {
        Self {
            player: player.into(),
            penalty,
            kind: PenaltyKind::Buyout,
        }
    }

    pub fn retained(player: impl Into<String>, penalty: Dollars) -> Self {
        Self {
            player: player.into(),
            penalty,
            kind: PenaltyKind::Retained,
        }
    }

    pub fn is_retained(&self) -> bool {
        self.kind == PenaltyKind::Retained
    }

    pub fn amount(&self) -> Dollars {
        self.penalty.max(0)
    }
}

/// A franchise: its roster and its penalty ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    #[serde(default)]
    pub roster: Vec<Player>,
    #[serde(default)]
    pub buyouts: Vec<PenaltyEntry>,
}

impl Team {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            roster: Vec::new(),
            buyouts: Vec::new(),
        }
    }

    pub fn with_player(mut self, player: Player) -> Self {
        self.roster.push(player);
        self
    }

    pub fn with_penalty(mut self, entry: PenaltyEntry) -> Self {
        self.buyouts.push(entry);
        self
    }

    pub fn key(&self) -> NameKey {
        NameKey::new(&self.name)
    }

    pub fn player_index(&self, key: &NameKey) -> Option<usize> {
        self.roster.iter().position(|p| p.key() == *key)
    }

    pub fn find_player(&self, name: &str) -> Option<&Player> {
        let key = NameKey::new(name);
        self.roster.iter().find(|p| p.key() == key)
    }

    pub fn has_player(&self, name: &str) -> bool {
        self.find_player(name).is_some()
    }
}

/// A sealed bid on a free agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    pub id: String,
    pub player: String,
    pub team: String,
    pub amount: Dollars,
    #[serde(default)]
    pub position: Position,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub resolved: bool,
    /// Set on the winning bid only
    #[serde(default)]
    pub winning_team: Option<String>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Bid {
    pub fn is_open(&self) -> bool {
        !self.resolved
    }

    pub fn is_winner(&self) -> bool {
        self.resolved && self.winning_team.is_some()
    }

    pub fn player_key(&self) -> NameKey {
        NameKey::new(&self.player)
    }
}

/// Trade status. Everything but `Pending` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
}

impl TradeStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TradeStatus::Pending)
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TradeStatus::Pending => "pending",
            TradeStatus::Accepted => "accepted",
            TradeStatus::Rejected => "rejected",
            TradeStatus::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// Who cancelled a trade and why
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cancellation {
    pub auto_cancelled: bool,
    pub reason: Option<String>,
    pub cancelled_by: Option<String>,
}

/// A submitted trade between two teams
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeProposal {
    pub id: String,
    pub from_team: String,
    pub to_team: String,
    pub offered_players: Vec<String>,
    pub requested_players: Vec<String>,
    /// Buyout penalty sent from `from_team` to `to_team`
    #[serde(default)]
    pub penalty_from: Dollars,
    /// Buyout penalty sent from `to_team` to `from_team`
    #[serde(default)]
    pub penalty_to: Dollars,
    /// Salary `from_team` keeps on offered players
    #[serde(default)]
    pub retention_from: BTreeMap<String, Dollars>,
    /// Salary `to_team` keeps on requested players
    #[serde(default)]
    pub retention_to: BTreeMap<String, Dollars>,
    pub status: TradeStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub expired: bool,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cancellation: Option<Cancellation>,
    #[serde(default)]
    pub settlement_warnings: Vec<String>,
}

impl TradeProposal {
    pub fn is_pending(&self) -> bool {
        self.status == TradeStatus::Pending
    }

    pub fn is_past_expiry(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn involves_team(&self, team: &NameKey) -> bool {
        team.matches(&self.from_team) || team.matches(&self.to_team)
    }

    /// Whether the player travels in either direction
    pub fn involves_player(&self, player: &NameKey) -> bool {
        self.players().any(|name| player.matches(name))
    }

    pub fn players(&self) -> impl Iterator<Item = &String> {
        self.offered_players.iter().chain(self.requested_players.iter())
    }
}

/// Whole-league snapshot the engine takes in and hands back
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueState {
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub bids: Vec<Bid>,
    #[serde(default)]
    pub trades: Vec<TradeProposal>,
}

impl LeagueState {
    pub fn new(teams: Vec<Team>) -> Self {
        Self {
            teams,
            bids: Vec::new(),
            trades: Vec::new(),
        }
    }

    pub fn team_index(&self, name: &str) -> Option<usize> {
        let key = NameKey::new(name);
        self.teams.iter().position(|t| t.key() == key)
    }

    pub fn find_team(&self, name: &str) -> Option<&Team> {
        self.team_index(name).map(|i| &self.teams[i])
    }

    /// Swap in an updated copy of a team, matched by name
    pub fn replace_team(&mut self, team: Team) {
        match self.team_index(&team.name) {
            Some(index) => self.teams[index] = team,
            None => self.teams.push(team),
        }
    }

    /// The team currently rostering `player`, if any
    pub fn rostered_by(&self, player: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.has_player(player))
    }

    pub fn find_trade(&self, trade_id: &str) -> Option<&TradeProposal> {
        self.trades.iter().find(|t| t.id == trade_id)
    }

    pub fn pending_trades(&self) -> impl Iterator<Item = &TradeProposal> {
        self.trades.iter().filter(|t| t.is_pending())
    }
}

impl State for LeagueState {
    fn validate(&self) -> Result<(), StateError> {
        let mut seen = std::collections::BTreeSet::new();
        for team in &self.teams {
            let key = team.key();
            if key.is_empty() {
                return Err(StateError::InvalidState {
                    reason: "Team name is empty".to_string(),
                });
            }
            if !seen.insert(key) {
                return Err(StateError::DuplicateTeam {
                    team: team.name.clone(),
                });
            }
        }

        let mut trade_ids = std::collections::BTreeSet::new();
        for trade in &self.trades {
            if !trade_ids.insert(trade.id.as_str()) {
                return Err(StateError::InvalidState {
                    reason: format!("Duplicate trade id {}", trade.id),
                });
            }
        }

        Ok(())
    }
}

/// A completed state change: the new snapshot plus what happened
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transition {
    pub state: LeagueState,
    pub log: Vec<LogEntry>,
    /// Non-blocking legality findings
    pub warnings: Vec<Warning>,
    pub from_hash: StateHash,
    pub to_hash: StateHash,
}

impl Transition {
    pub fn between(
        before: &LeagueState,
        after: LeagueState,
        log: Vec<LogEntry>,
        warnings: Vec<Warning>,
    ) -> Self {
        let hasher = StateHasher::new();
        Self {
            from_hash: hasher.hash(before),
            to_hash: hasher.hash(&after),
            state: after,
            log,
            warnings,
        }
    }

    /// Re-anchor the transition on an earlier snapshot
    pub fn rebase(mut self, before: &LeagueState) -> Self {
        self.from_hash = StateHasher::new().hash(before);
        self
    }

    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(|w| w.to_string()).collect()
    }
}

/// A refused action. Some refusals still change state (an expired trade is
/// cancelled on the way out); that change travels in `side_effect`.
#[derive(Debug, Clone, Error)]
#[error("{error}")]
pub struct Rejection {
    pub error: RuleViolation,
    pub side_effect: Option<Transition>,
}

impl Rejection {
    pub fn new(error: RuleViolation) -> Self {
        Self {
            error,
            side_effect: None,
        }
    }

    pub fn with_side_effect(error: RuleViolation, side_effect: Transition) -> Self {
        Self {
            error,
            side_effect: Some(side_effect),
        }
    }
}

impl From<RuleViolation> for Rejection {
    fn from(error: RuleViolation) -> Self {
        Self::new(error)
    }
}
