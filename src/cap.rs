//! Cap math
//!
//! Pure totals over a team's roster and penalty ledger. Injured reserve
//! players never count; every penalty entry does.

use crate::config::LeagueRules;
use crate::types::{Dollars, NameKey, Position, Team};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Active roster counts by position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionCounts {
    pub forwards: usize,
    pub defensemen: usize,
}

/// Penalty for waiving a player: nothing at or below the salary floor,
/// otherwise the configured share of salary rounded up.
pub fn calculate_buyout_penalty(salary: Dollars, rules: &LeagueRules) -> Dollars {
    if salary <= rules.buyout_salary_floor {
        return 0;
    }
    let scaled = salary.saturating_mul(rules.buyout_percent.max(0));
    scaled / 100 + Dollars::from(scaled % 100 != 0)
}

/// Active salaries plus every penalty entry, retained or not.
/// Totals saturate at `Dollars::MAX` instead of wrapping.
pub fn total_cap(team: &Team) -> Dollars {
    active_salary(team).saturating_add(saturating_total(team.buyouts.iter().map(|e| e.amount())))
}

pub fn active_salary(team: &Team) -> Dollars {
    saturating_total(team.roster.iter().filter(|p| p.is_active()).map(|p| p.cap_hit()))
}

/// Ordinary buyout penalties only; retained salary is excluded
pub fn total_buyout_penalty(team: &Team) -> Dollars {
    saturating_total(team.buyouts.iter().filter(|e| !e.is_retained()).map(|e| e.amount()))
}

pub fn total_retained_salary(team: &Team) -> Dollars {
    saturating_total(team.buyouts.iter().filter(|e| e.is_retained()).map(|e| e.amount()))
}

fn saturating_total(amounts: impl Iterator<Item = Dollars>) -> Dollars {
    amounts.fold(0, Dollars::saturating_add)
}

/// Distinct players carrying a positive retained entry
pub fn retained_players(team: &Team) -> BTreeSet<NameKey> {
    team.buyouts
        .iter()
        .filter(|e| e.is_retained() && e.amount() > 0)
        .map(|e| NameKey::new(&e.player))
        .collect()
}

pub fn count_retention_spots(team: &Team) -> usize {
    retained_players(team).len()
}

pub fn count_positions(team: &Team) -> PositionCounts {
    team.roster
        .iter()
        .filter(|p| p.is_active())
        .fold(PositionCounts::default(), |mut counts, p| {
            match p.position {
                Position::Forward => counts.forwards += 1,
                Position::Defense => counts.defensemen += 1,
            }
            counts
        })
}

pub fn active_roster_size(team: &Team) -> usize {
    team.roster.iter().filter(|p| p.is_active()).count()
}

/// Room left under the cap; negative when the team is over
pub fn cap_space(team: &Team, rules: &LeagueRules) -> Dollars {
    rules.cap_limit.saturating_sub(total_cap(team))
}
