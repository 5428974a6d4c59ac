//! Free-agent auctions
//!
//! Bids are sealed: each team's bid on a player is stored without revealing
//! it to the others. Resolution groups open bids by normalized player name,
//! and the highest amount wins. Ties go to the earliest timestamp, then the
//! lowest bid id.

use crate::cap::cap_space;
use crate::config::LeagueRules;
use crate::context::ExecutionContext;
use crate::error::RuleViolation;
use crate::legality::{roster_warnings, Warning};
use crate::logging::{ActivityLog, EventKind, LogEntry};
use crate::types::{Bid, Dollars, NameKey, Player, Position, Team};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// A manager's bid before it is accepted into the book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidRequest {
    pub team: String,
    pub player: String,
    pub amount: Dollars,
    #[serde(default)]
    pub position: Position,
}

impl BidRequest {
    pub fn new(team: impl Into<String>, player: impl Into<String>, amount: Dollars) -> Self {
        Self {
            team: team.into(),
            player: player.into(),
            amount,
            position: Position::Forward,
        }
    }

    pub fn at_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }
}

/// The bid book after a successful placement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedBid {
    pub bids: Vec<Bid>,
    pub bid: Bid,
    /// Id of the team's earlier open bid on the same player, now withdrawn
    pub replaced: Option<String>,
}

/// Place a sealed bid on a free agent.
///
/// A team holds at most one open bid per player: bidding again withdraws
/// the earlier bid, and the new one takes a fresh timestamp.
pub fn place_bid(
    teams: &[Team],
    bids: &[Bid],
    request: &BidRequest,
    ctx: &mut ExecutionContext,
    rules: &LeagueRules,
) -> Result<PlacedBid, RuleViolation> {
    let now = ctx.now();
    let player_key = NameKey::new(&request.player);
    if player_key.is_empty() {
        return Err(RuleViolation::EmptyPlayerName);
    }
    if request.amount <= 0 {
        return Err(RuleViolation::InvalidBidAmount {
            amount: request.amount,
        });
    }
    if let Some(cutoff) = rules.auction_cutoff {
        if now >= cutoff {
            return Err(RuleViolation::BiddingClosed { cutoff });
        }
    }

    let team_key = NameKey::new(&request.team);
    let team = teams
        .iter()
        .find(|t| t.key() == team_key)
        .ok_or_else(|| RuleViolation::TeamNotFound {
            team: request.team.trim().to_string(),
        })?;

    if let Some(owner) = teams.iter().find(|t| t.player_index(&player_key).is_some()) {
        return Err(RuleViolation::PlayerAlreadyRostered {
            player: request.player.trim().to_string(),
            team: owner.name.clone(),
        });
    }

    if rules.bid_requires_cap_space {
        let available = cap_space(team, rules);
        if request.amount > available {
            return Err(RuleViolation::InsufficientCapSpace {
                team: team.name.clone(),
                amount: request.amount,
                available,
            });
        }
    }

    let bid = Bid {
        id: ctx.next_id("bid"),
        player: request.player.trim().to_string(),
        team: team.name.clone(),
        amount: request.amount,
        position: request.position,
        timestamp: now,
        resolved: false,
        winning_team: None,
        resolved_at: None,
    };

    let mut replaced = None;
    let mut next: Vec<Bid> = Vec::with_capacity(bids.len() + 1);
    for existing in bids {
        if existing.is_open() && existing.player_key() == player_key && team_key.matches(&existing.team) {
            replaced = Some(existing.id.clone());
            continue;
        }
        next.push(existing.clone());
    }
    next.push(bid.clone());

    Ok(PlacedBid {
        bids: next,
        bid,
        replaced,
    })
}

/// What the league can see about an open auction. Amounts stay sealed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionSummary {
    pub player: String,
    pub position: Position,
    pub bid_count: usize,
    pub opened_at: DateTime<Utc>,
    pub last_bid_at: DateTime<Utc>,
}

/// Open auctions, one per player, ordered by normalized player name
pub fn open_auctions(bids: &[Bid]) -> Vec<AuctionSummary> {
    group_open_bids(bids)
        .into_values()
        .map(|indices| {
            let first = &bids[indices[0]];
            let mut summary = AuctionSummary {
                player: first.player.clone(),
                position: first.position,
                bid_count: indices.len(),
                opened_at: first.timestamp,
                last_bid_at: first.timestamp,
            };
            for &i in &indices[1..] {
                summary.opened_at = summary.opened_at.min(bids[i].timestamp);
                summary.last_bid_at = summary.last_bid_at.max(bids[i].timestamp);
            }
            summary
        })
        .collect()
}

/// A player awarded by auction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signing {
    pub player: String,
    pub team: String,
    pub salary: Dollars,
    pub position: Position,
    pub bid_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuctionResolution {
    pub teams: Vec<Team>,
    pub bids: Vec<Bid>,
    pub signings: Vec<Signing>,
    /// Players whose auctions closed without a winner
    pub voided: Vec<String>,
    pub warnings: Vec<Warning>,
    pub log: ActivityLog,
}

/// Resolve every open auction.
///
/// Each auction resolves exactly once: all of its bids are marked resolved
/// and at most one carries a winning team. The winner always gets the
/// player, even when that leaves the roster illegal; the resulting issues
/// come back as warnings. An auction voids when no bidding team still
/// exists or when the player was rostered after the bids went in.
pub fn resolve_auctions(
    teams: &[Team],
    bids: &[Bid],
    now: DateTime<Utc>,
    rules: &LeagueRules,
    log: &ActivityLog,
) -> AuctionResolution {
    let mut teams = teams.to_vec();
    let mut bids = bids.to_vec();
    let mut log = log.clone();
    let mut signings = Vec::new();
    let mut voided = Vec::new();
    let mut signed_teams = BTreeSet::new();

    for (player_key, indices) in group_open_bids(&bids) {
        for &i in &indices {
            bids[i].resolved = true;
            bids[i].resolved_at = Some(now);
            bids[i].winning_team = None;
        }
        let player_name = bids[indices[0]].player.trim().to_string();

        if let Some(owner) = teams.iter().find(|t| t.player_index(&player_key).is_some()) {
            log.log(
                LogEntry::info(
                    EventKind::AuctionVoided,
                    now,
                    format!("Auction for {} voided: already rostered by {}", player_name, owner.name),
                )
                .with_team(owner.name.clone())
                .with_metadata("bids", indices.len()),
            );
            voided.push(player_name);
            continue;
        }

        let mut candidates: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| bids[i].amount > 0 && team_position(&teams, &bids[i].team).is_some())
            .collect();
        candidates.sort_by(|&a, &b| compare_bids(&bids[a], &bids[b]));

        let Some(&winner) = candidates.first() else {
            log.log(
                LogEntry::info(
                    EventKind::AuctionVoided,
                    now,
                    format!("Auction for {} voided: no eligible bids", player_name),
                )
                .with_metadata("bids", indices.len()),
            );
            voided.push(player_name);
            continue;
        };

        let Some(team_index) = team_position(&teams, &bids[winner].team) else {
            continue;
        };
        let team_name = teams[team_index].name.clone();
        let bid = &mut bids[winner];
        bid.winning_team = Some(team_name.clone());
        let signed_name = bid.player.trim().to_string();

        teams[team_index]
            .roster
            .push(Player::new(signed_name.clone(), bid.amount, bid.position));
        signed_teams.insert(team_index);

        log.log(
            LogEntry::info(
                EventKind::PlayerSigned,
                now,
                format!("{} signed {} for ${}", team_name, signed_name, bid.amount),
            )
            .with_team(team_name.clone())
            .with_subject(bid.id.clone())
            .with_metadata("bids", indices.len()),
        );
        signings.push(Signing {
            player: signed_name,
            team: team_name,
            salary: bid.amount,
            position: bid.position,
            bid_id: bid.id.clone(),
        });
    }

    let warnings = roster_warnings(signed_teams.iter().map(|&i| &teams[i]), rules);
    for warning in &warnings {
        log.log(LogEntry::warn(EventKind::LegalityWarning, now, warning.to_string()));
    }

    AuctionResolution {
        teams,
        bids,
        signings,
        voided,
        warnings,
        log,
    }
}

/// Highest amount first, then earliest timestamp, then lowest id
pub fn compare_bids(a: &Bid, b: &Bid) -> Ordering {
    b.amount
        .cmp(&a.amount)
        .then_with(|| a.timestamp.cmp(&b.timestamp))
        .then_with(|| a.id.cmp(&b.id))
}

// BTreeMap keeps resolution order independent of bid insertion order
fn group_open_bids(bids: &[Bid]) -> BTreeMap<NameKey, Vec<usize>> {
    let mut groups: BTreeMap<NameKey, Vec<usize>> = BTreeMap::new();
    for (i, bid) in bids.iter().enumerate().filter(|(_, b)| b.is_open()) {
        groups.entry(bid.player_key()).or_default().push(i);
    }
    groups
}

fn team_position(teams: &[Team], name: &str) -> Option<usize> {
    let key = NameKey::new(name);
    teams.iter().position(|t| t.key() == key)
}
