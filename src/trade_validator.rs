//! Trade validation
//!
//! Turns a manager's draft into a normalized, clamped trade or the first
//! reason it cannot be proposed. Checks run in a fixed order and stop at the
//! first failure:
//!
//! 1. both player lists are non-empty
//! 2. both teams exist, differ, and roster the players named
//! 3. penalty amounts are non-negative and covered by the sender's ledger
//! 4. every retention entry is on the sender's side and within the cap
//! 5. neither team exceeds its retention spots
//! 6. no player is already committed to another pending trade

use crate::cap::{retained_players, total_buyout_penalty};
use crate::config::LeagueRules;
use crate::context::ExecutionContext;
use crate::error::RuleViolation;
use crate::types::{Dollars, NameKey, Team, TradeProposal, TradeStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// An unsubmitted trade as edited by a manager
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeDraft {
    pub from_team: String,
    pub to_team: String,
    #[serde(default)]
    pub offered_players: Vec<String>,
    #[serde(default)]
    pub requested_players: Vec<String>,
    #[serde(default)]
    pub penalty_from: Option<Dollars>,
    #[serde(default)]
    pub penalty_to: Option<Dollars>,
    #[serde(default)]
    pub retention_from: BTreeMap<String, Dollars>,
    #[serde(default)]
    pub retention_to: BTreeMap<String, Dollars>,
}

impl TradeDraft {
    pub fn new(from_team: impl Into<String>, to_team: impl Into<String>) -> Self {
        Self {
            from_team: from_team.into(),
            to_team: to_team.into(),
            ..Self::default()
        }
    }

    pub fn offer(mut self, player: impl Into<String>) -> Self {
        self.offered_players.push(player.into());
        self
    }

    pub fn request(mut self, player: impl Into<String>) -> Self {
        self.requested_players.push(player.into());
        self
    }

    pub fn send_penalty(mut self, amount: Dollars) -> Self {
        self.penalty_from = Some(amount);
        self
    }

    pub fn ask_penalty(mut self, amount: Dollars) -> Self {
        self.penalty_to = Some(amount);
        self
    }

    /// `from_team` keeps `amount` of the offered player's salary
    pub fn retain_on_offered(mut self, player: impl Into<String>, amount: Dollars) -> Self {
        self.retention_from.insert(player.into(), amount);
        self
    }

    /// `to_team` keeps `amount` of the requested player's salary
    pub fn retain_on_requested(mut self, player: impl Into<String>, amount: Dollars) -> Self {
        self.retention_to.insert(player.into(), amount);
        self
    }
}

/// A draft that passed validation, with names resolved to roster spelling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedTrade {
    pub from_team: String,
    pub to_team: String,
    pub offered_players: Vec<String>,
    pub requested_players: Vec<String>,
    pub penalty_from_amount: Dollars,
    pub penalty_to_amount: Dollars,
    pub validated_retention_from: BTreeMap<String, Dollars>,
    pub validated_retention_to: BTreeMap<String, Dollars>,
}

/// Validate a draft against the live teams and the trades already on file
pub fn validate_trade_draft(
    draft: &TradeDraft,
    teams: &[Team],
    trades: &[TradeProposal],
    rules: &LeagueRules,
) -> Result<ValidatedTrade, RuleViolation> {
    let offered_keys = dedupe(&draft.offered_players);
    let requested_keys = dedupe(&draft.requested_players);
    if offered_keys.is_empty() {
        return Err(RuleViolation::EmptyPlayerList { side: "Offered" });
    }
    if requested_keys.is_empty() {
        return Err(RuleViolation::EmptyPlayerList { side: "Requested" });
    }

    let from = find_team(teams, &draft.from_team)?;
    let to = find_team(teams, &draft.to_team)?;
    if from.key() == to.key() {
        return Err(RuleViolation::SelfTrade {
            team: from.name.clone(),
        });
    }
    let offered_players = resolve_players(from, &offered_keys)?;
    let requested_players = resolve_players(to, &requested_keys)?;

    let penalty_from_amount = check_penalty("penalty_from", draft.penalty_from, from)?;
    let penalty_to_amount = check_penalty("penalty_to", draft.penalty_to, to)?;

    let validated_retention_from =
        check_retention(&draft.retention_from, &offered_keys, from, rules)?;
    let validated_retention_to =
        check_retention(&draft.retention_to, &requested_keys, to, rules)?;

    check_retention_spots(from, &validated_retention_from, trades, rules)?;
    check_retention_spots(to, &validated_retention_to, trades, rules)?;

    check_pending_conflicts(
        trades,
        &[from.key(), to.key()],
        offered_players.iter().chain(requested_players.iter()),
    )?;

    Ok(ValidatedTrade {
        from_team: from.name.clone(),
        to_team: to.name.clone(),
        offered_players,
        requested_players,
        penalty_from_amount,
        penalty_to_amount,
        validated_retention_from,
        validated_retention_to,
    })
}

/// Stamp a validated trade as a pending proposal expiring after the
/// configured window
pub fn build_trade_from_draft(
    validated: &ValidatedTrade,
    ctx: &mut ExecutionContext,
    rules: &LeagueRules,
) -> TradeProposal {
    let now = ctx.now();
    TradeProposal {
        id: ctx.next_id("trade"),
        from_team: validated.from_team.clone(),
        to_team: validated.to_team.clone(),
        offered_players: validated.offered_players.clone(),
        requested_players: validated.requested_players.clone(),
        penalty_from: validated.penalty_from_amount,
        penalty_to: validated.penalty_to_amount,
        retention_from: validated.validated_retention_from.clone(),
        retention_to: validated.validated_retention_to.clone(),
        status: TradeStatus::Pending,
        created_at: now,
        expires_at: now
            .checked_add_signed(rules.trade_expiry())
            .unwrap_or(DateTime::<Utc>::MAX_UTC),
        expired: false,
        resolved_at: None,
        cancellation: None,
        settlement_warnings: Vec::new(),
    }
}

// Blank names are dropped; repeats collapse to the first spelling
fn dedupe(names: &[String]) -> Vec<NameKey> {
    let mut seen = BTreeSet::new();
    names
        .iter()
        .map(|n| NameKey::new(n))
        .filter(|k| !k.is_empty() && seen.insert(k.clone()))
        .collect()
}

fn find_team<'a>(teams: &'a [Team], name: &str) -> Result<&'a Team, RuleViolation> {
    let key = NameKey::new(name);
    teams
        .iter()
        .find(|t| t.key() == key)
        .ok_or_else(|| RuleViolation::TeamNotFound {
            team: name.trim().to_string(),
        })
}

fn resolve_players(team: &Team, keys: &[NameKey]) -> Result<Vec<String>, RuleViolation> {
    keys.iter()
        .map(|key| {
            team.player_index(key)
                .map(|i| team.roster[i].name.clone())
                .ok_or_else(|| RuleViolation::PlayerNotOnRoster {
                    player: key.to_string(),
                    team: team.name.clone(),
                })
        })
        .collect()
}

fn check_penalty(
    field: &'static str,
    requested: Option<Dollars>,
    sender: &Team,
) -> Result<Dollars, RuleViolation> {
    let amount = requested.unwrap_or(0);
    if amount < 0 {
        return Err(RuleViolation::NegativeAmount { field, amount });
    }
    let available = total_buyout_penalty(sender);
    if amount > available {
        return Err(RuleViolation::PenaltyExceedsAvailable {
            team: sender.name.clone(),
            requested: amount,
            available,
        });
    }
    Ok(amount)
}

fn check_retention(
    retention: &BTreeMap<String, Dollars>,
    side: &[NameKey],
    sender: &Team,
    rules: &LeagueRules,
) -> Result<BTreeMap<String, Dollars>, RuleViolation> {
    let mut validated = BTreeMap::new();

    for (name, &amount) in retention {
        let key = NameKey::new(name);
        if !side.contains(&key) {
            return Err(RuleViolation::RetentionPlayerNotInTrade {
                player: name.trim().to_string(),
                team: sender.name.clone(),
            });
        }
        let player = sender
            .player_index(&key)
            .map(|i| &sender.roster[i])
            .ok_or_else(|| RuleViolation::PlayerNotOnRoster {
                player: name.trim().to_string(),
                team: sender.name.clone(),
            })?;
        if amount < 0 {
            return Err(RuleViolation::NegativeAmount {
                field: "retention",
                amount,
            });
        }
        let max = rules.max_retention_for(player.salary);
        if amount > max {
            return Err(RuleViolation::RetentionExceedsLimit {
                player: player.name.clone(),
                requested: amount,
                max,
            });
        }
        if amount > 0 {
            validated.insert(player.name.clone(), amount);
        }
    }

    Ok(validated)
}

// Spots already on the ledger, spots promised by the team's other pending
// trades, and the new ones must fit together
fn check_retention_spots(
    team: &Team,
    new_retention: &BTreeMap<String, Dollars>,
    trades: &[TradeProposal],
    rules: &LeagueRules,
) -> Result<(), RuleViolation> {
    let team_key = team.key();
    let mut projected = retained_players(team);
    for trade in trades.iter().filter(|t| t.is_pending()) {
        let promised = if team_key.matches(&trade.from_team) {
            &trade.retention_from
        } else if team_key.matches(&trade.to_team) {
            &trade.retention_to
        } else {
            continue;
        };
        projected.extend(
            promised
                .iter()
                .filter(|(_, amount)| **amount > 0)
                .map(|(name, _)| NameKey::new(name)),
        );
    }
    projected.extend(new_retention.keys().map(|name| NameKey::new(name)));

    if projected.len() > rules.max_retention_spots {
        return Err(RuleViolation::RetentionSpotsExceeded {
            team: team.name.clone(),
            projected: projected.len(),
            max: rules.max_retention_spots,
        });
    }
    Ok(())
}

fn check_pending_conflicts<'a>(
    trades: &[TradeProposal],
    teams: &[NameKey],
    players: impl Iterator<Item = &'a String>,
) -> Result<(), RuleViolation> {
    let open: Vec<&TradeProposal> = trades
        .iter()
        .filter(|t| t.is_pending() && teams.iter().any(|team| t.involves_team(team)))
        .collect();

    for player in players {
        let key = NameKey::new(player);
        if let Some(conflict) = open.iter().find(|t| t.involves_player(&key)) {
            return Err(RuleViolation::PlayerInPendingTrade {
                player: player.clone(),
                trade_id: conflict.id.clone(),
            });
        }
    }
    Ok(())
}
