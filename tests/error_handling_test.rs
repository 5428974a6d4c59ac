use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rte::{
    EngineError, ExecutionContext, LeagueAction, LeagueEngine, LeagueState, Rejection, RuleViolation, StateError,
    Team, TradeStatus,
};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Rejection messages name the offending values so they can be shown to
    /// a manager as-is
    #[test]
    fn property_messages_carry_amounts(
        requested in 1i64..1000,
        available in 0i64..1000,
        team in "[A-Z][a-z]{3,10}"
    ) {
        let violation = RuleViolation::PenaltyExceedsAvailable {
            team: team.clone(),
            requested,
            available,
        };
        let message = violation.to_string();
        prop_assert!(message.contains(&team));
        let requested_text = format!("${}", requested);
        let available_text = format!("${}", available);
        prop_assert!(message.contains(&requested_text));
        prop_assert!(message.contains(&available_text));
    }

    /// Unknown ids and names are rejections, never panics
    #[test]
    fn property_unknown_ids_are_rejected(trade_id in "[a-z0-9-]{1,20}", team in "[A-Za-z ]{1,12}") {
        let engine = LeagueEngine::default();
        let state = LeagueState::new(vec![Team::new("Known")]);
        let mut ctx = ExecutionContext::new(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(), 0);

        let accept = engine.process(&state, &LeagueAction::AcceptTrade { trade_id: trade_id.clone() }, &mut ctx);
        let is_not_found = matches!(accept, Err(Rejection { error: RuleViolation::TradeNotFound { .. }, .. }));
        prop_assert!(is_not_found);

        prop_assume!(!team.trim().eq_ignore_ascii_case("known"));
        let buyout = engine.process(
            &state,
            &LeagueAction::Buyout { team, player: "Anyone".to_string() },
            &mut ctx,
        );
        let is_team_not_found = matches!(buyout, Err(Rejection { error: RuleViolation::TeamNotFound { .. }, .. }));
        prop_assert!(is_team_not_found);
    }
}

#[test]
fn test_error_layers_convert() {
    let rule: EngineError = RuleViolation::TradeNotPending {
        trade_id: "trade-1".to_string(),
        status: TradeStatus::Rejected,
    }
    .into();
    assert_eq!(rule.to_string(), "Rejected: Trade trade-1 is rejected, not pending");

    let state: EngineError = StateError::DuplicateTeam {
        team: "Kings".to_string(),
    }
    .into();
    assert!(matches!(state, EngineError::State(_)));

    let rejection = Rejection::new(RuleViolation::EmptyPlayerName);
    assert_eq!(rejection.to_string(), "Player name is empty");
    let from_rejection: EngineError = rejection.into();
    assert!(matches!(from_rejection, EngineError::Rule(RuleViolation::EmptyPlayerName)));
}

#[test]
fn test_snapshot_errors_wrap_state_errors() {
    let violation: RuleViolation = StateError::InvalidState {
        reason: "Team name is empty".to_string(),
    }
    .into();
    assert_eq!(
        violation.to_string(),
        "Invalid league snapshot: Invalid state: Team name is empty"
    );
}
