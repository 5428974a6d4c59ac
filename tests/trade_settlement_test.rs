//! Integration tests for trade validation, settlement and expiry

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use rte::cap::{total_cap, total_retained_salary};
use rte::logging::{ActivityLog, EventKind};
use rte::trade_lifecycle::expire_pending_trades;
use rte::trade_settlement::{accept_trade_by_id, apply_trade_to_teams};
use rte::trade_validator::{build_trade_from_draft, validate_trade_draft};
use rte::{
    ExecutionContext, LeagueRules, LeagueState, PenaltyEntry, Player, RuleViolation, Team, TradeDraft, TradeStatus,
    Warning,
};

fn monday() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 12, 1, 9, 0, 0).unwrap()
}

fn full_roster(name: &str, forwards: usize, defense: usize, salary: i64) -> Team {
    let mut team = Team::new(name);
    for i in 0..forwards {
        team.roster.push(Player::forward(format!("{name} F{i}"), salary));
    }
    for i in 0..defense {
        team.roster.push(Player::defense(format!("{name} D{i}"), salary));
    }
    team
}

fn propose(state: &LeagueState, draft: &TradeDraft, ctx: &mut ExecutionContext) -> LeagueState {
    let rules = LeagueRules::default();
    let validated = validate_trade_draft(draft, &state.teams, &state.trades, &rules).unwrap();
    let mut next = state.clone();
    next.trades.push(build_trade_from_draft(&validated, ctx, &rules));
    next
}

#[test]
fn test_retention_limit_is_half_salary() {
    let teams = vec![
        Team::new("Panthers").with_player(Player::forward("Barkov", 100)),
        Team::new("Lightning").with_player(Player::forward("Kucherov", 20)),
    ];
    let rules = LeagueRules::default();
    let base = TradeDraft::new("Panthers", "Lightning").offer("Barkov").request("Kucherov");

    let over = base.clone().retain_on_offered("Barkov", 51);
    assert!(matches!(
        validate_trade_draft(&over, &teams, &[], &rules),
        Err(RuleViolation::RetentionExceedsLimit { max: 50, .. })
    ));

    let at_limit = base.retain_on_offered("Barkov", 50);
    assert!(validate_trade_draft(&at_limit, &teams, &[], &rules).is_ok());
}

#[test]
fn test_fourth_retained_player_rejected() {
    let panthers = Team::new("Panthers")
        .with_player(Player::forward("Reinhart", 20))
        .with_penalty(PenaltyEntry::retained("One", 2))
        .with_penalty(PenaltyEntry::retained("Two", 2))
        .with_penalty(PenaltyEntry::retained("Three", 2));
    let teams = vec![panthers, Team::new("Lightning").with_player(Player::forward("Point", 10))];

    let draft = TradeDraft::new("Panthers", "Lightning")
        .offer("Reinhart")
        .request("Point")
        .retain_on_offered("Reinhart", 5);
    assert!(matches!(
        validate_trade_draft(&draft, &teams, &[], &LeagueRules::default()),
        Err(RuleViolation::RetentionSpotsExceeded { projected: 4, max: 3, .. })
    ));
}

#[test]
fn test_pending_retention_counts_toward_spots() {
    let state = LeagueState::new(vec![
        Team::new("Panthers")
            .with_player(Player::forward("Verhaeghe", 10))
            .with_player(Player::forward("Reinhart", 10))
            .with_penalty(PenaltyEntry::retained("One", 2))
            .with_penalty(PenaltyEntry::retained("Two", 2)),
        Team::new("Lightning")
            .with_player(Player::forward("Point", 10))
            .with_player(Player::forward("Guentzel", 10)),
    ]);
    let mut ctx = ExecutionContext::new(monday(), 8);
    let state = propose(
        &state,
        &TradeDraft::new("Panthers", "Lightning")
            .offer("Verhaeghe")
            .request("Point")
            .retain_on_offered("Verhaeghe", 5),
        &mut ctx,
    );

    let second = TradeDraft::new("Panthers", "Lightning")
        .offer("Reinhart")
        .request("Guentzel")
        .retain_on_offered("Reinhart", 5);
    assert!(matches!(
        validate_trade_draft(&second, &state.teams, &state.trades, &LeagueRules::default()),
        Err(RuleViolation::RetentionSpotsExceeded { projected: 4, max: 3, .. })
    ));

    // Once the first trade is off the table its spot is free again
    let mut withdrawn = state.clone();
    withdrawn.trades[0].status = TradeStatus::Rejected;
    assert!(validate_trade_draft(&second, &withdrawn.teams, &withdrawn.trades, &LeagueRules::default()).is_ok());
}

#[test]
fn test_settlement_reports_retention_overage() {
    let panthers = Team::new("Panthers")
        .with_player(Player::forward("Reinhart", 10))
        .with_penalty(PenaltyEntry::retained("One", 2))
        .with_penalty(PenaltyEntry::retained("Two", 2))
        .with_penalty(PenaltyEntry::retained("Three", 2));
    let lightning = Team::new("Lightning").with_player(Player::forward("Point", 10));
    let state = LeagueState::new(vec![panthers.clone(), lightning.clone()]);
    let mut ctx = ExecutionContext::new(monday(), 9);
    let state = propose(
        &state,
        &TradeDraft::new("Panthers", "Lightning").offer("Reinhart").request("Point"),
        &mut ctx,
    );

    // A ledger edited past the limit after proposal still settles, loudly
    let mut trade = state.trades[0].clone();
    trade.retention_from.insert("Reinhart".to_string(), 5);
    let settled = apply_trade_to_teams(&panthers, &lightning, &trade, &LeagueRules::default());

    assert_eq!(rte::cap::count_retention_spots(&settled.from_team), 4);
    assert!(settled
        .warnings
        .iter()
        .any(|w| w.to_string() == "Panthers retains salary on 4 players, 1 over the limit of 3"));
}

#[test]
fn test_player_cannot_be_in_two_pending_trades() {
    let state = LeagueState::new(vec![
        Team::new("Panthers").with_player(Player::forward("Tkachuk", 10)),
        Team::new("Lightning").with_player(Player::forward("Point", 10)).with_player(Player::forward("Guentzel", 9)),
    ]);
    let mut ctx = ExecutionContext::new(monday(), 3);
    let state = propose(
        &state,
        &TradeDraft::new("Panthers", "Lightning").offer("Tkachuk").request("Point"),
        &mut ctx,
    );

    let second = TradeDraft::new("Panthers", "Lightning").offer("TKACHUK").request("Guentzel");
    assert!(matches!(
        validate_trade_draft(&second, &state.teams, &state.trades, &LeagueRules::default()),
        Err(RuleViolation::PlayerInPendingTrade { .. })
    ));
}

#[test]
fn test_sixteen_man_roster_warns_but_settles() {
    let receiving = full_roster("Panthers", 11, 4, 2);
    let sending = full_roster("Lightning", 10, 5, 2);
    let state = LeagueState::new(vec![receiving, sending]);
    let mut ctx = ExecutionContext::new(monday(), 5);

    let draft = TradeDraft::new("Lightning", "Panthers")
        .offer("Lightning F0")
        .offer("Lightning F1")
        .request("Panthers F0");
    let state = propose(&state, &draft, &mut ctx);
    let trade_id = state.trades[0].id.clone();

    let transition = accept_trade_by_id(
        &state,
        &trade_id,
        monday() + Duration::hours(1),
        &LeagueRules::default(),
        &ActivityLog::default(),
    )
    .unwrap();

    let panthers = transition.state.find_team("Panthers").unwrap();
    assert_eq!(panthers.roster.len(), 16);
    let size_warning = transition
        .warning_messages()
        .into_iter()
        .find(|m| m.starts_with("Panthers has 16"))
        .expect("roster size warning");
    assert!(size_warning.contains("15"));
    assert_eq!(
        transition.state.trades[0].settlement_warnings,
        transition.warning_messages()
    );
}

#[test]
fn test_expired_trade_cancels_with_one_log_entry() {
    let state = LeagueState::new(vec![
        Team::new("Panthers").with_player(Player::forward("Tkachuk", 10)),
        Team::new("Lightning").with_player(Player::forward("Point", 10)),
    ]);
    let mut ctx = ExecutionContext::new(monday(), 9);
    let state = propose(
        &state,
        &TradeDraft::new("Panthers", "Lightning").offer("Tkachuk").request("Point"),
        &mut ctx,
    );
    let later = monday() + Duration::days(10);

    let book = expire_pending_trades(&state.trades, &ActivityLog::default(), later);
    assert_eq!(book.trades[0].status, TradeStatus::Cancelled);
    assert!(book.trades[0].expired);
    assert_eq!(book.log.filter_by_event(EventKind::TradeExpired).len(), 1);

    // Accepting directly is refused and performs the same cancellation
    let rejection = accept_trade_by_id(
        &state,
        &state.trades[0].id,
        later,
        &LeagueRules::default(),
        &ActivityLog::default(),
    )
    .unwrap_err();
    assert!(matches!(rejection.error, RuleViolation::TradeExpired { .. }));
    let side_effect = rejection.side_effect.expect("expiry side effect");
    assert_eq!(side_effect.state.trades, book.trades);
    assert_eq!(
        side_effect.log.iter().filter(|e| e.event == EventKind::TradeExpired).count(),
        1
    );
    // Rosters are untouched
    assert_eq!(side_effect.state.teams, state.teams);
}

#[test]
fn test_accepting_twice_is_refused() {
    let state = LeagueState::new(vec![
        Team::new("Panthers").with_player(Player::forward("Tkachuk", 10)),
        Team::new("Lightning").with_player(Player::forward("Point", 10)),
    ]);
    let mut ctx = ExecutionContext::new(monday(), 9);
    let state = propose(
        &state,
        &TradeDraft::new("Panthers", "Lightning").offer("Tkachuk").request("Point"),
        &mut ctx,
    );
    let id = state.trades[0].id.clone();
    let rules = LeagueRules::default();

    let accepted = accept_trade_by_id(&state, &id, monday(), &rules, &ActivityLog::default()).unwrap();
    let again = accept_trade_by_id(&accepted.state, &id, monday(), &rules, &ActivityLog::default()).unwrap_err();
    assert!(matches!(
        again.error,
        RuleViolation::TradeNotPending { status: TradeStatus::Accepted, .. }
    ));
    assert!(again.side_effect.is_none());
}

#[test]
fn test_penalty_shortfall_surfaces_as_warning() {
    let from = Team::new("Panthers")
        .with_player(Player::forward("Tkachuk", 10))
        .with_penalty(PenaltyEntry::buyout("Gone", 4));
    let to = Team::new("Lightning").with_player(Player::forward("Point", 10));
    let mut ctx = ExecutionContext::new(monday(), 1);
    let rules = LeagueRules::default();

    let draft = TradeDraft::new("Panthers", "Lightning").offer("Tkachuk").request("Point").send_penalty(4);
    let validated = validate_trade_draft(&draft, &[from.clone(), to.clone()], &[], &rules).unwrap();
    let trade = build_trade_from_draft(&validated, &mut ctx, &rules);

    // The ledger shrank between proposal and settlement
    let mut shrunk = from;
    shrunk.buyouts[0].penalty = 1;
    let settled = apply_trade_to_teams(&shrunk, &to, &trade, &rules);

    assert_eq!(settled.penalty_moved_from, 1);
    assert!(settled
        .warnings
        .iter()
        .any(|w| matches!(w, Warning::PenaltyShortfall { requested: 4, transferred: 1, .. })));
}

fn arb_side() -> impl Strategy<Value = Vec<(i64, i64)>> {
    // (salary, retained share in percent)
    prop::collection::vec((1i64..40, 0i64..=50), 1..4)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Proposing and settling a trade moves each player exactly once and
    /// shifts exactly the non-retained salary between the two teams
    #[test]
    fn property_round_trip_moves_salary_once(
        offered in arb_side(),
        requested in arb_side(),
    ) {
        let mut from = Team::new("Panthers").with_player(Player::forward("Keeper", 3));
        let mut to = Team::new("Lightning").with_player(Player::defense("Anchor", 4));
        let mut draft = TradeDraft::new("Panthers", "Lightning");
        let mut retained_from = 0;
        let mut retained_to = 0;
        let mut salary_from = 0;
        let mut salary_to = 0;

        for (i, &(salary, pct)) in offered.iter().enumerate() {
            let name = format!("Out {i}");
            let retain = salary * pct / 100;
            from.roster.push(Player::forward(name.clone(), salary));
            draft = draft.offer(name.clone());
            // At most three retained players per side
            if retain > 0 && i < 3 {
                draft = draft.retain_on_offered(name, retain);
                retained_from += retain;
            }
            salary_from += salary;
        }
        for (i, &(salary, pct)) in requested.iter().enumerate() {
            let name = format!("In {i}");
            let retain = salary * pct / 100;
            to.roster.push(Player::defense(name.clone(), salary));
            draft = draft.request(name.clone());
            if retain > 0 && i < 3 {
                draft = draft.retain_on_requested(name, retain);
                retained_to += retain;
            }
            salary_to += salary;
        }

        let rules = LeagueRules::default();
        let before_from = total_cap(&from);
        let before_to = total_cap(&to);
        let mut ctx = ExecutionContext::new(monday(), 77);
        let validated = validate_trade_draft(&draft, &[from.clone(), to.clone()], &[], &rules).unwrap();
        let trade = build_trade_from_draft(&validated, &mut ctx, &rules);
        let settled = apply_trade_to_teams(&from, &to, &trade, &rules);

        let after_from = total_cap(&settled.from_team);
        let after_to = total_cap(&settled.to_team);
        prop_assert_eq!(after_from, before_from - (salary_from - retained_from) + (salary_to - retained_to));
        prop_assert_eq!(after_to, before_to - (salary_to - retained_to) + (salary_from - retained_from));
        prop_assert_eq!(total_retained_salary(&settled.from_team), retained_from);
        prop_assert_eq!(total_retained_salary(&settled.to_team), retained_to);

        prop_assert_eq!(settled.from_team.roster.len() + settled.to_team.roster.len(), from.roster.len() + to.roster.len());
        for player in &settled.from_team.roster {
            prop_assert!(!settled.to_team.has_player(&player.name), "{} on both rosters", player.name);
        }
        prop_assert!(settled.from_team.has_player("Keeper"));
        prop_assert!(settled.to_team.has_player("Anchor"));
    }
}
