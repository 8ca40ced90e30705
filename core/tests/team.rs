use runway_core::{
    engine::SimEngine,
    error::SimError,
    team_subsystem::{
        adjust_productivity, team_productivity, total_monthly_salary, Candidate, Employee,
        ExperienceLevel, Role,
    },
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn make_engine(run_id: &str, seed: u64) -> SimEngine {
    let mut engine = SimEngine::build_test(run_id.into(), seed).unwrap();
    engine.select_product("test_pair").unwrap();
    engine
}

fn employee(id: &str, role: Role, productivity: f64, onboarded: bool) -> Employee {
    Employee {
        id: id.into(),
        name: format!("Test {id}"),
        role,
        salary: 5_000.0,
        productivity,
        hire_date: 0.0,
        onboarding_complete: onboarded,
    }
}

fn candidate(id: &str, role: Role) -> Candidate {
    Candidate {
        id: id.into(),
        name: format!("Candidate {id}"),
        role,
        expected_salary: 6_000.0,
        productivity: 0.7,
        experience_level: ExperienceLevel::Mid,
    }
}

// ── Productivity model ───────────────────────────────────────────────────────

#[test]
fn productivity_is_weighted_by_role() {
    let roster = vec![
        employee("eng", Role::Engineer, 1.0, true),
        employee("des", Role::Designer, 1.0, true),
        employee("sal", Role::Sales, 1.0, true),
        employee("mkt", Role::Marketing, 1.0, true),
        employee("ops", Role::Operations, 1.0, true),
    ];
    let total = team_productivity(&roster);
    assert!((total - (1.0 + 0.7 + 0.5 + 0.4 + 0.3)).abs() < 1e-9, "total={total}");
}

#[test]
fn onboarding_employees_draw_salary_but_add_nothing() {
    let roster = vec![
        employee("a", Role::Engineer, 0.9, false),
        employee("b", Role::Engineer, 0.5, true),
    ];
    assert!((team_productivity(&roster) - 0.5).abs() < 1e-9);
    assert_eq!(total_monthly_salary(&roster), 10_000.0);
}

#[test]
fn productivity_adjustment_is_clamped() {
    let team = runway_core::team_subsystem::TeamState::from_employees(vec![
        employee("a", Role::Engineer, 0.95, true),
        employee("b", Role::Engineer, 0.05, true),
    ]);

    let up = adjust_productivity(&team, 0.2);
    assert_eq!(up.employees[0].productivity, 1.0);
    assert!((up.employees[1].productivity - 0.25).abs() < 1e-9);

    let down = adjust_productivity(&team, -0.5);
    assert_eq!(down.employees[1].productivity, 0.0);
    assert!((down.total_productivity - 0.45).abs() < 1e-9);
}

// ── Engine-level behaviour ───────────────────────────────────────────────────

/// The first tick fills the hiring pool to the configured size.
#[test]
fn candidate_pool_is_topped_up_each_tick() {
    let mut engine = make_engine("team-pool", 42);
    assert!(engine.state().team.candidate_pool.is_empty());

    engine.run_ticks(1).unwrap();
    let pool = &engine.state().team.candidate_pool;
    assert_eq!(pool.len(), engine.config().candidate_pool_size);
    for c in pool {
        assert!(c.id.starts_with("cand-"));
        assert!((0.4..=1.0).contains(&c.productivity), "productivity={}", c.productivity);
        assert!(c.expected_salary >= 4_000.0 && c.expected_salary <= 14_000.0);
    }

    let hired = pool[0].id.clone();
    engine.hire(&hired).unwrap();
    assert_eq!(engine.state().team.candidate_pool.len(), engine.config().candidate_pool_size - 1);

    engine.run_ticks(1).unwrap();
    assert_eq!(engine.state().team.candidate_pool.len(), engine.config().candidate_pool_size);
}

/// New hires become productive once the onboarding period has elapsed.
#[test]
fn onboarding_completes_after_configured_days() {
    let mut engine = make_engine("team-onboarding", 7);
    engine.seed_candidate(candidate("cand-dev", Role::Engineer)).unwrap();
    engine.hire("cand-dev").unwrap();

    let days = engine.config().onboarding_days as u64;
    engine.run_ticks(days - 1).unwrap();
    assert!(!engine.state().team.employees[0].onboarding_complete);
    assert_eq!(engine.state().team.total_productivity, 0.0);

    engine.run_ticks(1).unwrap();
    let state = engine.state();
    assert!(state.team.employees[0].onboarding_complete);
    assert!((state.team.total_productivity - 0.7).abs() < 1e-9);
    assert!(engine
        .event_log()
        .iter()
        .any(|e| e.event_type == "employee_onboarded"));
}

#[test]
fn onboarding_can_be_completed_early() {
    let mut engine = make_engine("team-early", 7);
    engine.seed_candidate(candidate("cand-pm", Role::Designer)).unwrap();
    engine.hire("cand-pm").unwrap();

    let state = engine.complete_onboarding("emp-pm").unwrap();
    assert!(state.team.employees[0].onboarding_complete);
    assert!((state.team.total_productivity - 0.7 * 0.7).abs() < 1e-9);
}

#[test]
fn firing_removes_salary_from_expenses() {
    let mut engine = make_engine("team-fire", 3);
    engine.seed_candidate(candidate("cand-x", Role::Sales)).unwrap();
    engine.hire("cand-x").unwrap();
    assert_eq!(engine.state().finance.monthly_expenses, 8_000.0);

    let state = engine.fire("emp-x").unwrap();
    assert!(state.team.employees.is_empty());
    assert_eq!(state.finance.monthly_expenses, 2_000.0);
}

/// Unknown ids are rejected and leave the snapshot untouched.
#[test]
fn unknown_ids_are_not_found_and_change_nothing() {
    let mut engine = make_engine("team-unknown", 3);
    let before = engine.snapshot();

    match engine.hire("cand-nobody") {
        Err(SimError::NotFound { kind, .. }) => assert_eq!(kind, "candidate"),
        other => panic!("expected NotFound, got {other:?}"),
    }
    assert!(matches!(engine.fire("emp-nobody"), Err(SimError::NotFound { .. })));

    assert_eq!(*engine.state(), *before);
    assert!(engine
        .event_log()
        .iter()
        .any(|e| e.event_type == "command_rejected"));
}
