//! End-to-end campaign: found a studio, carry one game from planning all
//! the way through release, and start the next one.

use greenlight_game::data::ReferenceData;
use greenlight_game::project::{
    assign_team, set_launch_window, set_marketing_budget, set_marketing_strategy,
    set_optimization_focus, set_priority, set_resource_allocation, set_target_audience,
    start_project,
};
use greenlight_game::state::GameState;
use greenlight_game::testing::{run_test, TestType};
use greenlight_game::{advance_week, fix_bugs, release_game, DevPhase};

const PUZZLE_ELEMENTS: [&str; 3] = ["Grid System", "Combo System", "Power-ups"];

fn quiet_campaign() -> GameState {
    // Dropping the RNG turns off weekly events and risk rolls so the pacing
    // numbers are exact.
    let mut state = GameState::new("Moon Frog", 2024, ReferenceData::default_config());
    state.rng = None;
    state
}

fn start_puzzle(state: &mut GameState) {
    let elements: Vec<String> = PUZZLE_ELEMENTS.iter().map(ToString::to_string).collect();
    start_project(state, "puzzle", "match3", &elements, "Gem Garden").unwrap();
    assign_team(state).unwrap();
    set_resource_allocation(state, 50, 30, 20).unwrap();
    set_priority(state, "balanced").unwrap();
}

#[test]
fn solo_puzzle_project_reaches_testing_in_twenty_weeks() {
    let mut state = quiet_campaign();
    start_puzzle(&mut state);

    for week in 1..=19 {
        let report = advance_week(&mut state);
        assert_ne!(
            report.phase_changed,
            Some(DevPhase::Testing),
            "completed early at week {week}"
        );
    }
    let report = advance_week(&mut state);
    assert_eq!(report.phase_changed, Some(DevPhase::Testing));

    let project = state.project.as_ref().unwrap();
    assert!((project.progress - 100.0).abs() < f64::EPSILON);
    assert_eq!(project.phase, DevPhase::Testing);
}

#[test]
fn full_campaign_ships_a_game_and_keeps_going() {
    let mut state = quiet_campaign();
    let founding_money = state.money_cents;
    start_puzzle(&mut state);
    let budget = state.project.as_ref().unwrap().initial_budget_cents;
    assert_eq!(founding_money - state.money_cents, budget);

    while state.project.as_ref().unwrap().phase == DevPhase::Planning
        || state.project.as_ref().unwrap().phase == DevPhase::Development
    {
        advance_week(&mut state);
    }

    // Testing: the three passes, the last of which opens the release phase.
    run_test(&mut state, TestType::Unit).unwrap();
    run_test(&mut state, TestType::Integration).unwrap();
    let report = run_test(&mut state, TestType::Playtest).unwrap();
    assert!(report.phase_complete);
    assert_eq!(state.project.as_ref().unwrap().phase, DevPhase::Release);

    // Polish until the bug pool is empty.
    let mut passes = 0;
    while !state.project.as_ref().unwrap().bugs.is_empty() {
        let fix = fix_bugs(&mut state).unwrap();
        assert!(fix.total_fixed() >= 1);
        passes += 1;
        assert!(passes < 100, "bug fixing never converged");
    }

    set_marketing_strategy(&mut state, "casual").unwrap();
    set_launch_window(&mut state, "optimal").unwrap();
    set_optimization_focus(&mut state, "balance").unwrap();
    set_target_audience(&mut state, "casual").unwrap();
    set_marketing_budget(&mut state, 50_000).unwrap();

    let money_before = state.money_cents;
    let outcome = release_game(&mut state).unwrap();

    assert!((0..=100).contains(&outcome.game.quality));
    assert!((0..=100).contains(&outcome.game.success_score));
    assert!(outcome.game.revenue_cents >= 0);
    for score in [
        outcome.game.reception.casual,
        outcome.game.reception.hardcore,
        outcome.game.reception.critics,
    ] {
        assert!((0..=100).contains(&score));
    }
    assert_eq!(state.money_cents - money_before, outcome.game.revenue_cents);
    assert_eq!(state.history.len(), 1);
    assert!(state.project.is_none());
    assert!(state.reputation.total_fans() > 0);
    assert!(!state.reputation.last_mentions.is_empty());

    // The studio can immediately green-light the next game.
    start_puzzle(&mut state);
    assert_eq!(state.project.as_ref().unwrap().phase, DevPhase::Planning);
}

#[test]
fn campaign_state_survives_a_save_round_trip_mid_game() {
    let mut state = quiet_campaign();
    start_puzzle(&mut state);
    for _ in 0..8 {
        advance_week(&mut state);
    }

    let json = serde_json::to_string(&state).unwrap();
    let restored: GameState = serde_json::from_str(&json).unwrap();
    let restored = restored.rehydrate(ReferenceData::default_config());

    assert_eq!(restored.week, state.week);
    assert_eq!(restored.money_cents, state.money_cents);
    assert_eq!(restored.market, state.market);
    let a = state.project.as_ref().unwrap();
    let b = restored.project.as_ref().unwrap();
    assert_eq!(b.phase, a.phase);
    assert!((b.progress - a.progress).abs() < f64::EPSILON);
    assert!(restored.rng.is_some(), "rehydration restores the rng");
}
