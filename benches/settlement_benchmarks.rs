//! Benchmarks for settlement hot paths
//!
//! These benchmarks measure:
//! - Auction resolution as the number of open bids grows
//! - Trade validation against a crowded pending-trade book
//! - Snapshot hashing for a full league

use chrono::{DateTime, Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use rte::trade_validator::validate_trade_draft;
use rte::{
    resolve_auctions, ActivityLog, Bid, LeagueRules, LeagueState, Player, Position, StateHasher, Team,
    TradeDraft, TradeProposal, TradeStatus,
};
use std::collections::BTreeMap;

// ============================================================================
// League Generation
// ============================================================================

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap()
}

fn create_league(num_teams: usize) -> LeagueState {
    let teams = (0..num_teams)
        .map(|t| {
            let mut team = Team::new(format!("Team {t:02}"));
            for p in 0..14 {
                let position = if p < 9 { Position::Forward } else { Position::Defense };
                team.roster.push(Player::new(format!("T{t:02} P{p:02}"), 1 + (p as i64 % 7), position));
            }
            team
        })
        .collect();
    LeagueState::new(teams)
}

fn create_bids(num_teams: usize, num_bids: usize) -> Vec<Bid> {
    (0..num_bids)
        .map(|i| Bid {
            id: format!("bid-{i:06}"),
            player: format!("Free Agent {}", i % 40),
            team: format!("Team {:02}", i % num_teams),
            amount: 1 + (i as i64 * 7919) % 25,
            position: Position::Forward,
            timestamp: base_time() + Duration::seconds(i as i64),
            resolved: false,
            winning_team: None,
            resolved_at: None,
        })
        .collect()
}

fn create_pending_trades(state: &LeagueState, count: usize) -> Vec<TradeProposal> {
    let n = state.teams.len();
    (0..count)
        .map(|i| {
            let from = &state.teams[i % n];
            let to = &state.teams[(i + 1) % n];
            TradeProposal {
                id: format!("trade-{i:06}"),
                from_team: from.name.clone(),
                to_team: to.name.clone(),
                offered_players: vec![from.roster[i % 9].name.clone()],
                requested_players: vec![to.roster[i % 9].name.clone()],
                penalty_from: 0,
                penalty_to: 0,
                retention_from: BTreeMap::new(),
                retention_to: BTreeMap::new(),
                status: TradeStatus::Pending,
                created_at: base_time(),
                expires_at: base_time() + Duration::days(7),
                expired: false,
                resolved_at: None,
                cancellation: None,
                settlement_warnings: Vec::new(),
            }
        })
        .collect()
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_auction_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("auction_resolution");
    let rules = LeagueRules::default();
    let league = create_league(12);

    for num_bids in [40, 400, 4000].iter() {
        group.throughput(Throughput::Elements(*num_bids as u64));
        group.bench_with_input(BenchmarkId::from_parameter(num_bids), num_bids, |b, &num_bids| {
            let bids = create_bids(12, num_bids);
            b.iter(|| {
                black_box(resolve_auctions(
                    &league.teams,
                    &bids,
                    base_time(),
                    &rules,
                    &ActivityLog::default(),
                ))
            });
        });
    }

    group.finish();
}

fn bench_trade_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("trade_validation");
    let rules = LeagueRules::default();
    let league = create_league(12);
    let draft = TradeDraft::new("Team 00", "Team 05")
        .offer("T00 P12")
        .request("T05 P13")
        .retain_on_offered("T00 P12", 1);

    for pending in [0, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(pending), pending, |b, &pending| {
            let trades = create_pending_trades(&league, pending);
            b.iter(|| black_box(validate_trade_draft(&draft, &league.teams, &trades, &rules)));
        });
    }

    group.finish();
}

fn bench_league_hashing(c: &mut Criterion) {
    let mut group = c.benchmark_group("league_hashing");
    let hasher = StateHasher::new();

    for num_teams in [8, 32, 128].iter() {
        group.throughput(Throughput::Elements(*num_teams as u64));
        group.bench_with_input(BenchmarkId::from_parameter(num_teams), num_teams, |b, &num_teams| {
            let mut state = create_league(num_teams);
            state.bids = create_bids(num_teams, num_teams * 5);
            b.iter(|| black_box(hasher.hash(&state)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_auction_resolution, bench_trade_validation, bench_league_hashing);
criterion_main!(benches);
