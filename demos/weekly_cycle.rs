//! Weekly Cycle Example
//!
//! Walks one league week through the engine:
//! - Blind bids on a free agent and the Sunday resolution
//! - A trade with retained salary and buyout penalty attached
//! - A buyout that auto-cancels a pending trade
//! - Replaying the same week to confirm the final fingerprint

use chrono::{Duration, TimeZone, Utc};

use rte::cap::{cap_space, total_cap};
use rte::{
    BidRequest, ExecutionContext, LeagueAction, LeagueEngine, LeagueState, PenaltyEntry, Player, Team,
    TimedAction, TradeDraft,
};

fn build_team(name: &str, prefix: &str, salary: i64) -> Team {
    let mut team = Team::new(name);
    for i in 0..9 {
        team.roster.push(Player::forward(format!("{prefix} Forward {i}"), salary));
    }
    for i in 0..5 {
        team.roster.push(Player::defense(format!("{prefix} Defense {i}"), salary - 1));
    }
    team
}

fn print_league(state: &LeagueState, engine: &LeagueEngine) {
    for team in &state.teams {
        println!(
            "  {:<8} roster {:>2}  cap ${:>3}  space ${:>3}",
            team.name,
            team.roster.len(),
            total_cap(team),
            cap_space(team, engine.rules())
        );
    }
    println!();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Weekly Cycle Example ===\n");

    let engine = LeagueEngine::from_json_rules(r#"{"cap_limit": 100, "trade_expiry_days": 7}"#)?;
    let initial = LeagueState::new(vec![
        build_team("Bruins", "BOS", 6).with_penalty(PenaltyEntry::buyout("BOS Old Contract", 4)),
        build_team("Rangers", "NYR", 5),
        build_team("Devils", "NJD", 5),
    ]);

    println!("Initial League:");
    print_league(&initial, &engine);

    let monday = Utc.with_ymd_and_hms(2026, 2, 2, 9, 0, 0).unwrap();
    let week = vec![
        TimedAction::new(monday, LeagueAction::PlaceBid(BidRequest::new("Rangers", "Free Agent Winger", 8))),
        TimedAction::new(
            monday + Duration::minutes(30),
            LeagueAction::PlaceBid(BidRequest::new("Devils", "Free Agent Winger", 8)),
        ),
        TimedAction::new(
            monday + Duration::days(1),
            LeagueAction::ProposeTrade(
                TradeDraft::new("Bruins", "Rangers")
                    .offer("BOS Forward 0")
                    .request("NYR Defense 0")
                    .retain_on_offered("BOS Forward 0", 3)
                    .send_penalty(2),
            ),
        ),
        TimedAction::new(
            monday + Duration::days(1) + Duration::hours(1),
            LeagueAction::ProposeTrade(TradeDraft::new("Devils", "Bruins").offer("NJD Forward 3").request("BOS Forward 4")),
        ),
        TimedAction::new(
            monday + Duration::days(2),
            LeagueAction::Buyout {
                team: "Bruins".to_string(),
                player: "BOS Forward 4".to_string(),
            },
        ),
        TimedAction::new(monday + Duration::days(6), LeagueAction::ResolveAuctions),
    ];

    let mut ctx = ExecutionContext::new(monday, 2026);
    let mut state = initial.clone();
    let mut trade_to_accept = None;

    for timed in &week {
        ctx.advance_to(timed.at);
        match engine.process(&state, &timed.action, &mut ctx) {
            Ok(transition) => {
                println!("{} @ {}", timed.action.name(), timed.at.format("%a %H:%M"));
                for entry in &transition.log {
                    println!("  [{:?}] {}", entry.level, entry.message);
                }
                if trade_to_accept.is_none() {
                    trade_to_accept = transition.state.trades.first().map(|t| t.id.clone());
                }
                state = transition.state;
            }
            Err(rejection) => {
                println!("{} rejected: {}", timed.action.name(), rejection);
                if let Some(side_effect) = rejection.side_effect {
                    state = side_effect.state;
                }
            }
        }
    }

    // Rangers accept the first trade on Wednesday afternoon
    if let Some(trade_id) = trade_to_accept {
        ctx.advance_to(monday + Duration::days(2) + Duration::hours(6));
        let transition = engine.process(&state, &LeagueAction::AcceptTrade { trade_id }, &mut ctx)?;
        for warning in transition.warning_messages() {
            println!("  warning: {}", warning);
        }
        state = transition.state;
    }

    println!("\nFinal League:");
    print_league(&state, &engine);

    for trade in &state.trades {
        println!("  {} {} -> {}: {}", trade.id, trade.from_team, trade.to_team, trade.status);
    }

    let replayed = engine.replay(&initial, &week, 2026);
    println!("\nReplay of the scheduled week:");
    println!("  actions applied: {}", replayed.actions_applied);
    println!("  rejections:      {}", replayed.rejections.len());
    println!("  final hash:      {}", replayed.final_hash);

    Ok(())
}
