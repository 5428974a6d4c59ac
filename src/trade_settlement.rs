//! Trade settlement
//!
//! Realizes an accepted trade on copies of both teams. Settlement always
//! completes; anything illegal about the resulting rosters comes back as
//! warnings for the teams to fix afterwards.

use crate::config::LeagueRules;
use crate::error::RuleViolation;
use crate::ledger::transfer_buyout_penalty;
use crate::legality::{build_post_trade_issues, Warning};
use crate::logging::{ActivityLog, EventKind, LogEntry};
use crate::trade_lifecycle::{cancel_trade_by_id, expire_in_place, CancelOptions};
use crate::types::{
    Dollars, LeagueState, NameKey, PenaltyEntry, Player, Rejection, Team, TradeProposal,
    TradeStatus, Transition,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Both teams after a trade, plus what the settlement had to report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettledTrade {
    pub from_team: Team,
    pub to_team: Team,
    pub warnings: Vec<Warning>,
    /// Penalty actually moved from `from_team` to `to_team`
    pub penalty_moved_from: Dollars,
    /// Penalty actually moved from `to_team` to `from_team`
    pub penalty_moved_to: Dollars,
}

/// Apply a trade to the two teams.
///
/// Retained salary becomes a permanent `Retained` entry on the sending team
/// and the player travels at the reduced salary. Players move before any
/// buyout penalty does; penalty amounts were validated against the ledgers
/// as they stood before the trade.
pub fn apply_trade_to_teams(
    from: &Team,
    to: &Team,
    trade: &TradeProposal,
    rules: &LeagueRules,
) -> SettledTrade {
    let mut from_team = from.clone();
    let mut to_team = to.clone();

    let outgoing = detach_players(&mut from_team, &trade.offered_players, &trade.retention_from, rules);
    let incoming = detach_players(&mut to_team, &trade.requested_players, &trade.retention_to, rules);
    to_team.roster.extend(outgoing);
    from_team.roster.extend(incoming);

    let mut warnings = Vec::new();
    let mut penalty_moved_from = 0;
    let mut penalty_moved_to = 0;

    if trade.penalty_from > 0 {
        let transfer = transfer_buyout_penalty(&from_team, &to_team, trade.penalty_from);
        if transfer.transferred < trade.penalty_from {
            warnings.push(Warning::PenaltyShortfall {
                from_team: from_team.name.clone(),
                to_team: to_team.name.clone(),
                requested: trade.penalty_from,
                transferred: transfer.transferred,
            });
        }
        penalty_moved_from = transfer.transferred;
        from_team = transfer.from;
        to_team = transfer.to;
    }

    if trade.penalty_to > 0 {
        let transfer = transfer_buyout_penalty(&to_team, &from_team, trade.penalty_to);
        if transfer.transferred < trade.penalty_to {
            warnings.push(Warning::PenaltyShortfall {
                from_team: to_team.name.clone(),
                to_team: from_team.name.clone(),
                requested: trade.penalty_to,
                transferred: transfer.transferred,
            });
        }
        penalty_moved_to = transfer.transferred;
        to_team = transfer.from;
        from_team = transfer.to;
    }

    warnings.extend(build_post_trade_issues(&from_team, &to_team, rules));

    SettledTrade {
        from_team,
        to_team,
        warnings,
        penalty_moved_from,
        penalty_moved_to,
    }
}

/// Accept a pending trade against the current snapshot.
///
/// The trade's expiry is checked first: an overdue trade is cancelled as
/// expired and the acceptance refused, with the cancellation carried in the
/// rejection. Both teams are then looked up fresh; if a traded player has
/// left the expected roster since the proposal, the trade is cancelled
/// instead of settled.
pub fn accept_trade_by_id(
    state: &LeagueState,
    trade_id: &str,
    now: DateTime<Utc>,
    rules: &LeagueRules,
    log: &ActivityLog,
) -> Result<Transition, Rejection> {
    let index = state
        .trades
        .iter()
        .position(|t| t.id == trade_id)
        .ok_or_else(|| RuleViolation::TradeNotFound {
            trade_id: trade_id.to_string(),
        })?;
    let trade = &state.trades[index];

    if trade.expired {
        return Err(expired(trade).into());
    }
    if trade.status.is_terminal() {
        return Err(RuleViolation::TradeNotPending {
            trade_id: trade.id.clone(),
            status: trade.status,
        }
        .into());
    }

    if trade.is_past_expiry(now) {
        let mut next = state.clone();
        let mut log = log.clone();
        expire_in_place(&mut next.trades[index], &mut log, now);
        let side_effect = Transition::between(state, next, log.into_entries(), Vec::new());
        return Err(Rejection::with_side_effect(expired(trade), side_effect));
    }

    let from = find_team(state, &trade.from_team)?;
    let to = find_team(state, &trade.to_team)?;

    if let Some(violation) = missing_player(trade, from, to) {
        let book = cancel_trade_by_id(
            &state.trades,
            log,
            &trade.id,
            CancelOptions::automatic(violation.to_string()),
            now,
        )?;
        let mut next = state.clone();
        next.trades = book.trades;
        let side_effect = Transition::between(state, next, book.log.into_entries(), Vec::new());
        return Err(Rejection::with_side_effect(violation, side_effect));
    }

    let settled = apply_trade_to_teams(from, to, trade, rules);
    let mut log = log.clone();
    log.log(
        LogEntry::info(
            EventKind::TradeAccepted,
            now,
            format!(
                "{} traded {} to {} for {}",
                trade.from_team,
                trade.offered_players.join(", "),
                trade.to_team,
                trade.requested_players.join(", ")
            ),
        )
        .with_team(trade.to_team.clone())
        .with_subject(trade.id.clone()),
    );
    if settled.penalty_moved_from > 0 || settled.penalty_moved_to > 0 {
        log.log(
            LogEntry::info(
                EventKind::PenaltyTransferred,
                now,
                format!(
                    "${} of buyout penalty moved to {}, ${} moved to {}",
                    settled.penalty_moved_from, trade.to_team, settled.penalty_moved_to, trade.from_team
                ),
            )
            .with_subject(trade.id.clone()),
        );
    }
    for warning in &settled.warnings {
        log.log(
            LogEntry::warn(EventKind::LegalityWarning, now, warning.to_string())
                .with_subject(trade.id.clone()),
        );
    }

    let mut next = state.clone();
    {
        let accepted = &mut next.trades[index];
        accepted.status = TradeStatus::Accepted;
        accepted.resolved_at = Some(now);
        accepted.settlement_warnings = settled.warnings.iter().map(|w| w.to_string()).collect();
    }
    next.replace_team(settled.from_team);
    next.replace_team(settled.to_team);

    Ok(Transition::between(state, next, log.into_entries(), settled.warnings))
}

// Pull the named players off `team`, booking any retained salary as it goes
fn detach_players(
    team: &mut Team,
    names: &[String],
    retention: &BTreeMap<String, Dollars>,
    rules: &LeagueRules,
) -> Vec<Player> {
    let mut moving = Vec::with_capacity(names.len());
    for name in names {
        let key = NameKey::new(name);
        let Some(index) = team.player_index(&key) else {
            continue;
        };
        let mut player = team.roster.remove(index);

        let requested = retention
            .iter()
            .find(|(retained, _)| key.matches(retained))
            .map(|(_, &amount)| amount)
            .unwrap_or(0);
        let retained = requested.clamp(0, rules.max_retention_for(player.salary));
        if retained > 0 {
            team.buyouts.push(PenaltyEntry::retained(player.name.clone(), retained));
            player.salary -= retained;
        }
        moving.push(player);
    }
    moving
}

fn find_team<'a>(state: &'a LeagueState, name: &str) -> Result<&'a Team, RuleViolation> {
    state.find_team(name).ok_or_else(|| RuleViolation::TeamNotFound {
        team: name.to_string(),
    })
}

fn missing_player(trade: &TradeProposal, from: &Team, to: &Team) -> Option<RuleViolation> {
    let sides = [(&trade.offered_players, from), (&trade.requested_players, to)];
    sides.into_iter().find_map(|(names, team)| {
        names
            .iter()
            .find(|name| !team.has_player(name))
            .map(|name| RuleViolation::TradeRosterChanged {
                trade_id: trade.id.clone(),
                player: name.clone(),
                team: team.name.clone(),
            })
    })
}

fn expired(trade: &TradeProposal) -> RuleViolation {
    RuleViolation::TradeExpired {
        trade_id: trade.id.clone(),
        expires_at: trade.expires_at,
    }
}
