use runway_core::{
    clock::GameSpeed,
    command::PlayerCommand,
    config::GameConfig,
    engine::{SimEngine, OUT_OF_MONEY},
    error::SimError,
    event::SimEvent,
    funding_subsystem::RoundType,
    snapshot::GameState,
    team_subsystem::{Candidate, ExperienceLevel, Role},
};
use std::sync::Arc;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn make_engine(run_id: &str, seed: u64) -> SimEngine {
    let mut engine = SimEngine::build_test(run_id.into(), seed).unwrap();
    engine.select_product("test_pair").unwrap();
    engine
}

fn candidate(id: &str) -> Candidate {
    Candidate {
        id: id.into(),
        name: format!("Candidate {id}"),
        role: Role::Sales,
        expected_salary: 5_000.0,
        productivity: 0.5,
        experience_level: ExperienceLevel::Junior,
    }
}

// ── Setup ────────────────────────────────────────────────────────────────────

#[test]
fn nothing_runs_before_a_product_is_selected() {
    let mut engine = SimEngine::build_test("engine-no-product".into(), 1).unwrap();
    let before = engine.snapshot();

    let events = engine.tick(5.0).unwrap();

    assert!(events.is_empty());
    assert!(Arc::ptr_eq(&before, &engine.snapshot()));
    assert_eq!(engine.state().current_time(), 0.0);
}

#[test]
fn selecting_a_product_installs_its_backlog() {
    let mut engine = SimEngine::build_test("engine-select".into(), 1).unwrap();

    let state = engine.select_product("crm").unwrap();
    let template = engine.config().template("crm").unwrap();
    assert_eq!(state.product.product_template_id.as_deref(), Some("crm"));
    assert_eq!(state.product.features.len(), template.features.len());
    assert!(state.product.features.iter().all(|f| f.progress == 0.0));
    assert_eq!(state.finance.revenue_per_sale, 1_000.0 * template.revenue_potential);

    assert!(matches!(engine.select_product("helpdesk"), Err(SimError::InvalidState(_))));
}

#[test]
fn unknown_template_is_not_found() {
    let mut engine = SimEngine::build_test("engine-template".into(), 1).unwrap();
    assert!(matches!(
        engine.select_product("spaceship"),
        Err(SimError::NotFound { kind: "product template", .. })
    ));
    assert!(!engine.state().has_product());
}

// ── Ticking ──────────────────────────────────────────────────────────────────

#[test]
fn tick_journals_start_and_completion() {
    let mut engine = make_engine("engine-journal", 1);
    let events = engine.tick(1.0).unwrap();

    assert_eq!(events.first(), Some(&SimEvent::TickStarted { day: 1.0 }));
    assert_eq!(events.last(), Some(&SimEvent::TickCompleted { day: 1.0 }));

    let log = engine.event_log();
    assert_eq!(log[0].event_type, "run_initialized");
    assert!(log.windows(2).all(|w| w[0].seq + 1 == w[1].seq));
}

#[test]
fn invalid_delta_is_rejected() {
    let mut engine = make_engine("engine-delta", 1);
    assert!(engine.tick(0.0).is_err());
    assert!(engine.tick(-3.0).is_err());
    assert!(engine.tick(f64::NAN).is_err());
    assert_eq!(engine.state().current_time(), 0.0);
}

#[test]
fn paused_clock_freezes_the_simulation() {
    let mut engine = make_engine("engine-pause", 1);
    engine.set_paused(true).unwrap();
    let before = engine.snapshot();

    engine.run_ticks(10).unwrap();
    assert_eq!(*engine.state(), *before);

    engine.set_paused(false).unwrap();
    engine.run_ticks(2).unwrap();
    assert_eq!(engine.state().current_time(), 2.0);
}

#[test]
fn speed_sets_days_per_step() {
    let mut engine = make_engine("engine-speed", 1);
    assert_eq!(engine.state().clock.days_per_step(), 1.0);

    let state = engine.set_game_speed(GameSpeed::X4).unwrap();
    assert_eq!(state.game_speed(), GameSpeed::X4);
    assert_eq!(state.clock.days_per_step(), 4.0);
}

#[test]
fn queued_commands_apply_at_the_start_of_the_next_tick() {
    let mut engine = make_engine("engine-queue", 1);
    engine.seed_candidate(candidate("cand-q")).unwrap();

    engine
        .submit_command(PlayerCommand::Hire { candidate_id: "cand-q".into() })
        .unwrap();
    assert_eq!(engine.queued_commands(), 1);
    assert!(engine.state().team.employees.is_empty());

    let events = engine.tick(1.0).unwrap();
    assert_eq!(engine.queued_commands(), 0);
    assert_eq!(engine.state().team.employees.len(), 1);
    assert_eq!(engine.state().team.employees[0].hire_date, 0.0);
    assert!(matches!(events.first(), Some(SimEvent::PlayerCommandReceived { .. })));
}

#[test]
fn queued_resume_restarts_a_paused_clock() {
    let mut engine = make_engine("engine-resume", 1);
    engine.set_paused(true).unwrap();
    engine.submit_command(PlayerCommand::Resume).unwrap();

    engine.tick(1.0).unwrap();
    assert!(!engine.state().is_paused());
    assert_eq!(engine.state().current_time(), 1.0);
}

#[test]
fn old_snapshots_are_never_mutated() {
    let mut engine = make_engine("engine-immutable", 1);
    let day_zero = engine.snapshot();

    engine.run_ticks(20).unwrap();

    assert_eq!(day_zero.current_time(), 0.0);
    assert_eq!(day_zero.money(), 100_000.0);
    assert!(engine.state().money() < day_zero.money());
}

#[test]
fn snapshot_json_exposes_flat_finance_fields() {
    let mut engine = make_engine("engine-json", 1);
    engine.run_ticks(3).unwrap();

    let json = engine.state().to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(value["money"].is_number());
    assert!(value["runway"].is_number());
    assert!(value["product"]["features"].is_array());
    assert_eq!(value["gameOver"], false);

    let restored = GameState::from_json(&json).unwrap();
    assert_eq!(restored.current_time(), 3.0);
    let ids = |s: &GameState| s.team.candidate_pool.iter().map(|c| c.id.clone()).collect::<Vec<_>>();
    assert_eq!(ids(&restored), ids(engine.state()));
    assert_eq!(restored.product.product_template_id.as_deref(), Some("test_pair"));
}

// ── Game over ────────────────────────────────────────────────────────────────

/// $999 and a $2k/month overhead: fifteen days leave the company at -$1.
#[test]
fn running_out_of_money_ends_the_game_for_good() {
    let config = GameConfig::default_test().with_starting_money(999.0);
    let mut engine = SimEngine::new("engine-game-over".into(), 1, config).unwrap();
    engine.select_product("test_pair").unwrap();

    let events = engine.tick(15.0).unwrap();
    let state = engine.snapshot();
    assert!((state.money() - -1.0).abs() < 1e-9, "money={}", state.money());
    assert!(state.game_over);
    assert_eq!(state.game_over_reason.as_deref(), Some(OUT_OF_MONEY));
    assert!(events.iter().any(|e| matches!(e, SimEvent::GameOver { .. })));

    // Every later tick is an identity.
    for _ in 0..10 {
        assert!(engine.tick(1.0).unwrap().is_empty());
    }
    assert!(Arc::ptr_eq(&state, &engine.snapshot()));

    // And every action is refused.
    assert!(matches!(engine.set_paused(true), Err(SimError::GameOver { .. })));
    assert!(matches!(engine.start_fundraising(RoundType::Seed), Err(SimError::GameOver { .. })));
    assert!(matches!(
        engine.submit_command(PlayerCommand::Resume),
        Err(SimError::GameOver { .. })
    ));
    assert!(!engine.accept_funding_offer("offer-001"));
    assert!(Arc::ptr_eq(&state, &engine.snapshot()));
}

#[test]
fn solvent_company_keeps_playing() {
    let mut engine = make_engine("engine-solvent", 1);
    engine.run_ticks(365).unwrap();
    let state = engine.state();
    assert!(!state.game_over);
    assert!(state.money() > 0.0);
    assert_eq!(state.current_time(), 365.0);
}

#[test]
fn draining_the_journal_keeps_sequence_numbers_running() {
    let mut engine = make_engine("engine-drain", 1);
    engine.run_ticks(3).unwrap();

    let first = engine.drain_event_log();
    assert!(!first.is_empty());
    assert!(engine.event_log().is_empty());

    engine.run_ticks(1).unwrap();
    let second = engine.event_log();
    assert_eq!(second[0].seq, first.last().unwrap().seq + 1);
    assert!(second.windows(2).all(|w| w[0].seq + 1 == w[1].seq));
}

#[test]
fn game_speed_is_a_bare_number_on_the_wire() {
    let mut engine = make_engine("engine-speed-json", 1);
    engine.set_game_speed(GameSpeed::X2).unwrap();

    let value: serde_json::Value = serde_json::from_str(&engine.state().to_json().unwrap()).unwrap();
    assert_eq!(value["clock"]["speed"], 2);

    let command: PlayerCommand = serde_json::from_str(r#"{"cmd":"set_speed","speed":4}"#).unwrap();
    assert_eq!(command, PlayerCommand::SetSpeed { speed: GameSpeed::X4 });
    assert!(serde_json::from_str::<PlayerCommand>(r#"{"cmd":"set_speed","speed":3}"#).is_err());
}
