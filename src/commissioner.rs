//! Commissioner roster overrides
//!
//! Direct roster edits outside the trade and auction flows. Whoever calls
//! these has already been authorized as commissioner.

use crate::cap::calculate_buyout_penalty;
use crate::config::LeagueRules;
use crate::error::RuleViolation;
use crate::types::{Dollars, NameKey, PenaltyEntry, Player, Team};

/// Add a player to `team`. The name must not be rostered anywhere in the
/// league, `team` included.
pub fn add_player(team: &Team, player: Player, all_teams: &[Team]) -> Result<Team, RuleViolation> {
    let key = player.key();
    if key.is_empty() {
        return Err(RuleViolation::EmptyPlayerName);
    }
    if let Some(owner) = all_teams
        .iter()
        .chain(std::iter::once(team))
        .find(|t| t.player_index(&key).is_some())
    {
        return Err(RuleViolation::PlayerAlreadyRostered {
            player: player.name.trim().to_string(),
            team: owner.name.clone(),
        });
    }

    let mut team = team.clone();
    team.roster.push(Player {
        name: player.name.trim().to_string(),
        ..player
    });
    Ok(team)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedPlayer {
    pub team: Team,
    pub player: Player,
    /// Zero unless a penalty was requested and one is owed
    pub penalty: Dollars,
}

/// Remove a player, optionally charging the normal buyout penalty.
///
/// Unlike a manager buyout this ignores any buyout lock.
pub fn remove_player(
    team: &Team,
    name: &str,
    apply_penalty: bool,
    rules: &LeagueRules,
) -> Result<RemovedPlayer, RuleViolation> {
    let index = roster_index(team, name)?;
    let mut team = team.clone();
    let player = team.roster.remove(index);

    let penalty = if apply_penalty {
        calculate_buyout_penalty(player.salary, rules)
    } else {
        0
    };
    if penalty > 0 {
        team.buyouts.push(PenaltyEntry::buyout(player.name.clone(), penalty));
    }

    Ok(RemovedPlayer {
        team,
        player,
        penalty,
    })
}

/// Move a player on or off injured reserve
pub fn set_injured_reserve(team: &Team, name: &str, on_ir: bool) -> Result<Team, RuleViolation> {
    let index = roster_index(team, name)?;
    let mut team = team.clone();
    team.roster[index].on_ir = on_ir;
    Ok(team)
}

fn roster_index(team: &Team, name: &str) -> Result<usize, RuleViolation> {
    team.player_index(&NameKey::new(name))
        .ok_or_else(|| RuleViolation::PlayerNotOnRoster {
            player: name.trim().to_string(),
            team: team.name.clone(),
        })
}
