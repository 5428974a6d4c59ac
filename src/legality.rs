//! Roster legality checks
//!
//! Advisory only. Transactions always complete; an illegal roster is
//! reported so the team can fix it with buyouts afterwards.

use crate::cap::{active_roster_size, count_positions, count_retention_spots, total_cap};
use crate::config::LeagueRules;
use crate::types::{Dollars, Team};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One way a roster breaks league limits, with the exact numbers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegalityIssue {
    OverCap {
        team: String,
        total: Dollars,
        limit: Dollars,
    },
    RosterTooLarge {
        team: String,
        size: usize,
        max: usize,
    },
    TooFewForwards {
        team: String,
        count: usize,
        min: usize,
    },
    TooFewDefensemen {
        team: String,
        count: usize,
        min: usize,
    },
    TooManyRetained {
        team: String,
        count: usize,
        max: usize,
    },
}

impl LegalityIssue {
    pub fn team(&self) -> &str {
        match self {
            LegalityIssue::OverCap { team, .. }
            | LegalityIssue::RosterTooLarge { team, .. }
            | LegalityIssue::TooFewForwards { team, .. }
            | LegalityIssue::TooFewDefensemen { team, .. }
            | LegalityIssue::TooManyRetained { team, .. } => team,
        }
    }
}

impl fmt::Display for LegalityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LegalityIssue::OverCap { team, total, limit } => write!(
                f,
                "{} is ${} over the cap (${} / ${})",
                team,
                total.saturating_sub(*limit),
                total,
                limit
            ),
            LegalityIssue::RosterTooLarge { team, size, max } => write!(
                f,
                "{} has {} active players, {} over the limit of {}",
                team,
                size,
                size.saturating_sub(*max),
                max
            ),
            LegalityIssue::TooFewForwards { team, count, min } => write!(
                f,
                "{} has {} forwards, {} short of the minimum of {}",
                team,
                count,
                min.saturating_sub(*count),
                min
            ),
            LegalityIssue::TooFewDefensemen { team, count, min } => write!(
                f,
                "{} has {} defensemen, {} short of the minimum of {}",
                team,
                count,
                min.saturating_sub(*count),
                min
            ),
            LegalityIssue::TooManyRetained { team, count, max } => write!(
                f,
                "{} retains salary on {} players, {} over the limit of {}",
                team,
                count,
                count.saturating_sub(*max),
                max
            ),
        }
    }
}

/// Non-blocking finding returned alongside an applied state change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Warning {
    Legality(LegalityIssue),
    /// A trade asked to move more buyout penalty than the sender still held
    PenaltyShortfall {
        from_team: String,
        to_team: String,
        requested: Dollars,
        transferred: Dollars,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::Legality(issue) => issue.fmt(f),
            Warning::PenaltyShortfall {
                from_team,
                to_team,
                requested,
                transferred,
            } => write!(
                f,
                "Only ${} of ${} buyout penalty could be moved from {} to {}",
                transferred, requested, from_team, to_team
            ),
        }
    }
}

impl From<LegalityIssue> for Warning {
    fn from(issue: LegalityIssue) -> Self {
        Warning::Legality(issue)
    }
}

/// Check a team against cap, size, position and retention limits, in that
/// order
pub fn team_issues(team: &Team, rules: &LeagueRules) -> Vec<LegalityIssue> {
    let mut issues = Vec::new();

    let total = total_cap(team);
    if total > rules.cap_limit {
        issues.push(LegalityIssue::OverCap {
            team: team.name.clone(),
            total,
            limit: rules.cap_limit,
        });
    }

    let size = active_roster_size(team);
    if size > rules.max_roster_size {
        issues.push(LegalityIssue::RosterTooLarge {
            team: team.name.clone(),
            size,
            max: rules.max_roster_size,
        });
    }

    let counts = count_positions(team);
    if counts.forwards < rules.min_forwards {
        issues.push(LegalityIssue::TooFewForwards {
            team: team.name.clone(),
            count: counts.forwards,
            min: rules.min_forwards,
        });
    }
    if counts.defensemen < rules.min_defensemen {
        issues.push(LegalityIssue::TooFewDefensemen {
            team: team.name.clone(),
            count: counts.defensemen,
            min: rules.min_defensemen,
        });
    }

    let retained = count_retention_spots(team);
    if retained > rules.max_retention_spots {
        issues.push(LegalityIssue::TooManyRetained {
            team: team.name.clone(),
            count: retained,
            max: rules.max_retention_spots,
        });
    }

    issues
}

pub fn is_team_illegal(team: &Team, rules: &LeagueRules) -> bool {
    !team_issues(team, rules).is_empty()
}

/// Issues for both sides of a trade, sending team first
pub fn build_post_trade_issues(from: &Team, to: &Team, rules: &LeagueRules) -> Vec<Warning> {
    roster_warnings([from, to], rules)
}

pub fn roster_warnings<'a>(
    teams: impl IntoIterator<Item = &'a Team>,
    rules: &LeagueRules,
) -> Vec<Warning> {
    teams
        .into_iter()
        .flat_map(|team| team_issues(team, rules))
        .map(Warning::from)
        .collect()
}
