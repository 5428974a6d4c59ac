//! Buyout penalty ledger
//!
//! Moves buyout penalty between teams and waives players into new penalty
//! entries. Retained-salary entries never move: they stay with the team that
//! retained them.

use crate::cap::calculate_buyout_penalty;
use crate::config::LeagueRules;
use crate::error::RuleViolation;
use crate::types::{Dollars, NameKey, PenaltyEntry, Player, Team};
use chrono::{DateTime, Utc};

/// Result of moving penalty between two teams
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PenaltyTransfer {
    pub from: Team,
    pub to: Team,
    /// What actually moved; less than requested when the sender ran short
    pub transferred: Dollars,
}

impl PenaltyTransfer {
    pub fn shortfall(&self, requested: Dollars) -> Dollars {
        (requested.max(0) - self.transferred).max(0)
    }
}

/// Move up to `amount` of buyout penalty from `from` to `to`.
///
/// Entries are consumed in ledger order; the entry that completes the
/// request is reduced rather than removed. The receiving team gains a single
/// entry for the amount actually moved. Running short is not an error: the
/// sender's ledger may have shrunk since the trade was drafted.
pub fn transfer_buyout_penalty(from: &Team, to: &Team, amount: Dollars) -> PenaltyTransfer {
    let mut from = from.clone();
    let mut to = to.clone();
    let mut remaining = amount.max(0);
    let mut transferred = 0;

    let mut emptied = Vec::new();
    for (index, entry) in from.buyouts.iter_mut().enumerate() {
        if remaining == 0 {
            break;
        }
        if entry.is_retained() || entry.amount() == 0 {
            continue;
        }
        let take = entry.amount().min(remaining);
        entry.penalty -= take;
        remaining -= take;
        transferred += take;
        if entry.penalty == 0 {
            emptied.push(index);
        }
    }
    // Only entries this transfer drained leave the ledger
    for index in emptied.into_iter().rev() {
        from.buyouts.remove(index);
    }

    if transferred > 0 {
        to.buyouts.push(PenaltyEntry::buyout(
            format!("Traded penalty from {}", from.name),
            transferred,
        ));
    }

    PenaltyTransfer {
        from,
        to,
        transferred,
    }
}

/// A player waived off a roster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuyoutOutcome {
    pub team: Team,
    pub player: Player,
    pub penalty: Dollars,
}

/// Waive a player, leaving a buyout penalty on the ledger when one is owed
pub fn buyout_player(
    team: &Team,
    player: &str,
    now: DateTime<Utc>,
    rules: &LeagueRules,
) -> Result<BuyoutOutcome, RuleViolation> {
    let key = NameKey::new(player);
    let index = team
        .player_index(&key)
        .ok_or_else(|| RuleViolation::PlayerNotOnRoster {
            player: player.trim().to_string(),
            team: team.name.clone(),
        })?;

    if let Some(until) = team.roster[index].buyout_locked_until {
        if now < until {
            return Err(RuleViolation::BuyoutLocked {
                player: team.roster[index].name.clone(),
                until,
            });
        }
    }

    let mut team = team.clone();
    let waived = team.roster.remove(index);
    let penalty = calculate_buyout_penalty(waived.salary, rules);
    if penalty > 0 {
        team.buyouts.push(PenaltyEntry::buyout(waived.name.clone(), penalty));
    }

    Ok(BuyoutOutcome {
        team,
        player: waived,
        penalty,
    })
}
