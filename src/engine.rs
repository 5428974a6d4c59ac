//! League engine: one entry point for every roster action
//!
//! The engine takes a league snapshot and an action and returns either a
//! [`Transition`] to the next snapshot or a [`Rejection`]. It holds no state
//! of its own. Pending trades are swept for expiry before every action, so
//! nothing downstream ever trusts a stale pending status.

use crate::auction::{place_bid, resolve_auctions, BidRequest};
use crate::commissioner::{add_player, remove_player, set_injured_reserve};
use crate::config::LeagueRules;
use crate::context::ExecutionContext;
use crate::error::{EngineError, RuleViolation};
use crate::hasher::StateHasher;
use crate::ledger::buyout_player;
use crate::legality::{roster_warnings, Warning};
use crate::logging::{ActivityLog, EventKind, LogEntry};
use crate::trade_lifecycle::{
    cancel_trade_by_id, cancel_trades_for_player, expire_pending_trades, reject_trade_by_id,
    CancelOptions, TradeBook,
};
use crate::trade_settlement::accept_trade_by_id;
use crate::trade_validator::{build_trade_from_draft, validate_trade_draft, TradeDraft};
use crate::traits::State;
use crate::types::{LeagueState, Player, Rejection, StateHash, Team, Transition};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything a manager or commissioner can ask the engine to do.
/// Authorization happens before the action reaches the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LeagueAction {
    PlaceBid(BidRequest),
    ResolveAuctions,
    ProposeTrade(TradeDraft),
    AcceptTrade {
        trade_id: String,
    },
    RejectTrade {
        trade_id: String,
        #[serde(default)]
        rejected_by: Option<String>,
    },
    CancelTrade {
        trade_id: String,
        #[serde(default)]
        cancelled_by: Option<String>,
        #[serde(default)]
        reason: Option<String>,
    },
    ExpireTrades,
    Buyout {
        team: String,
        player: String,
    },
    AddPlayer {
        team: String,
        player: Player,
    },
    RemovePlayer {
        team: String,
        player: String,
        #[serde(default)]
        apply_penalty: bool,
    },
    SetInjuredReserve {
        team: String,
        player: String,
        on_ir: bool,
    },
}

impl LeagueAction {
    pub fn name(&self) -> &'static str {
        match self {
            LeagueAction::PlaceBid(_) => "place_bid",
            LeagueAction::ResolveAuctions => "resolve_auctions",
            LeagueAction::ProposeTrade(_) => "propose_trade",
            LeagueAction::AcceptTrade { .. } => "accept_trade",
            LeagueAction::RejectTrade { .. } => "reject_trade",
            LeagueAction::CancelTrade { .. } => "cancel_trade",
            LeagueAction::ExpireTrades => "expire_trades",
            LeagueAction::Buyout { .. } => "buyout",
            LeagueAction::AddPlayer { .. } => "add_player",
            LeagueAction::RemovePlayer { .. } => "remove_player",
            LeagueAction::SetInjuredReserve { .. } => "set_injured_reserve",
        }
    }
}

/// An action pinned to the instant it happened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedAction {
    pub at: DateTime<Utc>,
    pub action: LeagueAction,
}

impl TimedAction {
    pub fn new(at: DateTime<Utc>, action: LeagueAction) -> Self {
        Self { at, action }
    }
}

/// Outcome of replaying an action history
#[derive(Debug, Clone)]
pub struct ReplayResult {
    pub final_state: LeagueState,
    pub final_hash: StateHash,
    /// Every snapshot hash along the way folded into one
    pub chain_hash: StateHash,
    pub log: Vec<LogEntry>,
    pub warnings: Vec<Warning>,
    /// Index into the action list and the reason it was refused
    pub rejections: Vec<(usize, RuleViolation)>,
    pub actions_applied: usize,
}

#[derive(Debug, Clone, Default)]
pub struct LeagueEngine {
    rules: LeagueRules,
}

impl LeagueEngine {
    pub fn new(rules: LeagueRules) -> Self {
        Self { rules }
    }

    /// Build an engine from a JSON rules document
    pub fn from_json_rules(json: &str) -> Result<Self, EngineError> {
        Ok(Self::new(LeagueRules::from_json(json)?))
    }

    pub fn rules(&self) -> &LeagueRules {
        &self.rules
    }

    /// Apply one action to a snapshot at the context's current time.
    ///
    /// A rejection may still carry a state change in `side_effect`, e.g. the
    /// expiry sweep cancelled trades before the action itself was refused.
    /// Callers should persist that change.
    pub fn process(
        &self,
        state: &LeagueState,
        action: &LeagueAction,
        ctx: &mut ExecutionContext,
    ) -> Result<Transition, Rejection> {
        state.validate().map_err(RuleViolation::from)?;

        let now = ctx.now();
        let swept = expire_pending_trades(&state.trades, &ActivityLog::new(self.rules.log_level), now);
        let mut current = state.clone();
        current.trades = swept.trades;

        match self.dispatch(&current, action, ctx, &swept.log) {
            Ok(transition) => Ok(self.finish(state, transition)),
            Err(mut rejection) => {
                if rejection.side_effect.is_none() && current != *state {
                    rejection.side_effect = Some(Transition::between(
                        state,
                        current,
                        swept.log.into_entries(),
                        Vec::new(),
                    ));
                }
                rejection.side_effect = rejection.side_effect.map(|t| self.finish(state, t));
                Err(rejection)
            }
        }
    }

    /// Fold a history of actions over `initial`, applying each at its own
    /// timestamp. Refused actions are recorded and skipped, but their side
    /// effects are kept.
    pub fn replay(&self, initial: &LeagueState, actions: &[TimedAction], seed: u64) -> ReplayResult {
        let hasher = StateHasher::new();
        let start = actions.first().map(|a| a.at).unwrap_or_default();
        let mut ctx = ExecutionContext::new(start, seed);

        let mut state = initial.clone();
        let mut hashes = vec![hasher.hash(&state)];
        let mut log = Vec::new();
        let mut warnings = Vec::new();
        let mut rejections = Vec::new();
        let mut actions_applied = 0;

        for (index, timed) in actions.iter().enumerate() {
            ctx.advance_to(timed.at);
            let applied = match self.process(&state, &timed.action, &mut ctx) {
                Ok(transition) => {
                    actions_applied += 1;
                    Some(transition)
                }
                Err(rejection) => {
                    rejections.push((index, rejection.error));
                    rejection.side_effect
                }
            };
            if let Some(transition) = applied {
                hashes.push(transition.to_hash);
                log.extend(transition.log);
                warnings.extend(transition.warnings);
                state = transition.state;
            }
        }

        ReplayResult {
            final_hash: hasher.hash(&state),
            chain_hash: hasher.hash_chain(&hashes),
            final_state: state,
            log,
            warnings,
            rejections,
            actions_applied,
        }
    }

    fn dispatch(
        &self,
        current: &LeagueState,
        action: &LeagueAction,
        ctx: &mut ExecutionContext,
        log: &ActivityLog,
    ) -> Result<Transition, Rejection> {
        let rules = &self.rules;
        let now = ctx.now();

        match action {
            LeagueAction::PlaceBid(request) => {
                let placed = place_bid(&current.teams, &current.bids, request, ctx, rules)?;
                let mut log = log.clone();
                let (event, verb) = match placed.replaced {
                    Some(_) => (EventKind::BidReplaced, "updated their bid on"),
                    None => (EventKind::BidPlaced, "bid on"),
                };
                let mut entry = LogEntry::info(event, now, format!("{} {} {}", placed.bid.team, verb, placed.bid.player))
                    .with_team(placed.bid.team.clone())
                    .with_subject(placed.bid.id.clone());
                if let Some(replaced) = &placed.replaced {
                    entry = entry.with_metadata("replaced", replaced);
                }
                log.log(entry);

                let mut next = current.clone();
                next.bids = placed.bids;
                Ok(Transition::between(current, next, log.into_entries(), Vec::new()))
            }

            LeagueAction::ResolveAuctions => {
                let resolution = resolve_auctions(&current.teams, &current.bids, now, rules, log);
                let mut next = current.clone();
                next.teams = resolution.teams;
                next.bids = resolution.bids;
                Ok(Transition::between(
                    current,
                    next,
                    resolution.log.into_entries(),
                    resolution.warnings,
                ))
            }

            LeagueAction::ProposeTrade(draft) => {
                let validated = validate_trade_draft(draft, &current.teams, &current.trades, rules)?;
                let trade = build_trade_from_draft(&validated, ctx, rules);
                let mut log = log.clone();
                log.log(
                    LogEntry::info(
                        EventKind::TradeProposed,
                        now,
                        format!(
                            "{} offered {} to {} for {}",
                            trade.from_team,
                            trade.offered_players.join(", "),
                            trade.to_team,
                            trade.requested_players.join(", ")
                        ),
                    )
                    .with_team(trade.from_team.clone())
                    .with_subject(trade.id.clone())
                    .with_metadata("expires_at", trade.expires_at.to_rfc3339()),
                );

                let mut next = current.clone();
                next.trades.push(trade);
                Ok(Transition::between(current, next, log.into_entries(), Vec::new()))
            }

            LeagueAction::AcceptTrade { trade_id } => accept_trade_by_id(current, trade_id, now, rules, log),

            LeagueAction::RejectTrade {
                trade_id,
                rejected_by,
            } => {
                let book = reject_trade_by_id(&current.trades, log, trade_id, rejected_by.as_deref(), now)?;
                Ok(with_trade_book(current, book))
            }

            LeagueAction::CancelTrade {
                trade_id,
                cancelled_by,
                reason,
            } => {
                let options = CancelOptions {
                    auto_cancelled: false,
                    reason: reason.clone(),
                    cancelled_by: cancelled_by.clone(),
                };
                let book = cancel_trade_by_id(&current.trades, log, trade_id, options, now)?;
                Ok(with_trade_book(current, book))
            }

            // The sweep in `process` already did the work
            LeagueAction::ExpireTrades => Ok(Transition::between(
                current,
                current.clone(),
                log.clone().into_entries(),
                Vec::new(),
            )),

            LeagueAction::Buyout { team, player } => {
                let outcome = buyout_player(find_team(current, team)?, player, now, rules)?;
                let mut log = log.clone();
                log.log(
                    LogEntry::info(
                        EventKind::PlayerBoughtOut,
                        now,
                        format!(
                            "{} bought out {} (${} penalty)",
                            outcome.team.name, outcome.player.name, outcome.penalty
                        ),
                    )
                    .with_team(outcome.team.name.clone())
                    .with_metadata("penalty", outcome.penalty),
                );
                let reason = format!("{} was bought out by {}", outcome.player.name, outcome.team.name);
                Ok(self.roster_change(current, outcome.team, Some((outcome.player.name.as_str(), reason.as_str())), log, now))
            }

            LeagueAction::AddPlayer { team, player } => {
                let updated = add_player(find_team(current, team)?, player.clone(), &current.teams)?;
                let mut log = log.clone();
                log.log(
                    LogEntry::info(
                        EventKind::PlayerAdded,
                        now,
                        format!("Commissioner added {} to {} at ${}", player.name.trim(), updated.name, player.salary),
                    )
                    .with_team(updated.name.clone()),
                );
                Ok(self.roster_change(current, updated, None, log, now))
            }

            LeagueAction::RemovePlayer {
                team,
                player,
                apply_penalty,
            } => {
                let removed = remove_player(find_team(current, team)?, player, *apply_penalty, rules)?;
                let mut log = log.clone();
                log.log(
                    LogEntry::info(
                        EventKind::PlayerRemoved,
                        now,
                        format!("Commissioner removed {} from {}", removed.player.name, removed.team.name),
                    )
                    .with_team(removed.team.name.clone())
                    .with_metadata("penalty", removed.penalty),
                );
                let reason = format!("{} was removed from {}", removed.player.name, removed.team.name);
                Ok(self.roster_change(current, removed.team, Some((removed.player.name.as_str(), reason.as_str())), log, now))
            }

            LeagueAction::SetInjuredReserve { team, player, on_ir } => {
                let updated = set_injured_reserve(find_team(current, team)?, player, *on_ir)?;
                let mut log = log.clone();
                let status = if *on_ir { "placed on" } else { "activated from" };
                log.log(
                    LogEntry::info(
                        EventKind::InjuredReserveChanged,
                        now,
                        format!("{} {} injured reserve by {}", player.trim(), status, updated.name),
                    )
                    .with_team(updated.name.clone()),
                );
                Ok(self.roster_change(current, updated, None, log, now))
            }
        }
    }

    // Swap in the edited team, cancel trades the departing player was part
    // of, and report where the team now stands
    fn roster_change(
        &self,
        current: &LeagueState,
        team: Team,
        departed: Option<(&str, &str)>,
        log: ActivityLog,
        now: DateTime<Utc>,
    ) -> Transition {
        let mut next = current.clone();
        let mut log = log;

        if let Some((player, reason)) = departed {
            let book = cancel_trades_for_player(&next.trades, &log, &team.name, player, reason, now);
            next.trades = book.trades;
            log = book.log;
        }

        let warnings = roster_warnings([&team], &self.rules);
        for warning in &warnings {
            log.log(
                LogEntry::warn(EventKind::LegalityWarning, now, warning.to_string()).with_team(team.name.clone()),
            );
        }

        next.replace_team(team);
        Transition::between(current, next, log.into_entries(), warnings)
    }

    fn finish(&self, original: &LeagueState, transition: Transition) -> Transition {
        let mut transition = transition.rebase(original);
        for entry in transition.log.iter_mut().filter(|e| e.rule_version.is_none()) {
            entry.rule_version = Some(self.rules.version.clone());
        }
        transition
    }
}

fn with_trade_book(current: &LeagueState, book: TradeBook) -> Transition {
    let mut next = current.clone();
    next.trades = book.trades;
    Transition::between(current, next, book.log.into_entries(), Vec::new())
}

fn find_team<'a>(state: &'a LeagueState, name: &str) -> Result<&'a Team, RuleViolation> {
    state.find_team(name).ok_or_else(|| RuleViolation::TeamNotFound {
        team: name.trim().to_string(),
    })
}
