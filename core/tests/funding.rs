use runway_core::{
    command::PlayerCommand,
    config::{Difficulty, GameConfig},
    engine::SimEngine,
    error::SimError,
    funding_subsystem::{
        accept_offer, offer_terms, start_round, CompanyProfile, FundingOffer, FundingRound,
        FundingState, FundingSubsystem, RoundStatus, RoundType,
    },
    product_subsystem::Milestone,
    rng::{FixedRng, RngBank, SubsystemSlot},
    snapshot::GameState,
    subsystem::{SimSubsystem, TickContext},
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn make_engine(run_id: &str) -> SimEngine {
    let mut engine = SimEngine::build_test(run_id.into(), 5).unwrap();
    engine.select_product("test_pair").unwrap();
    engine
}

fn start_seed(engine: &mut SimEngine, interest: f64) {
    engine
        .apply_command(PlayerCommand::StartFundraising {
            round_type: RoundType::Seed,
            investor_interest: Some(interest),
        })
        .unwrap();
}

fn company(stage: Milestone) -> CompanyProfile {
    CompanyProfile {
        stage,
        monthly_revenue: 20_000.0,
        maturity: 0.5,
        team_size: 6,
        product_market_fit: 0.3,
    }
}

fn first_offer(engine: &SimEngine) -> FundingOffer {
    engine.state().funding.active_round.as_ref().unwrap().offers[0].clone()
}

// ── Offer formula ────────────────────────────────────────────────────────────

#[test]
fn offers_stay_inside_round_brackets() {
    let rounds = [RoundType::Seed, RoundType::SeriesA, RoundType::SeriesB, RoundType::SeriesC];
    let stages = [
        Milestone::Idea,
        Milestone::Mvp,
        Milestone::Validated,
        Milestone::Growing,
        Milestone::Mature,
    ];
    for round in rounds {
        let b = round.bracket();
        for stage in stages {
            for interest in [0.0, 0.5, 1.0] {
                let (amount, equity, valuation) = offer_terms(round, interest, &company(stage));
                assert!(
                    (b.min_amount..=b.max_amount).contains(&amount),
                    "{round:?}/{stage:?}/{interest}: amount {amount}"
                );
                assert!(
                    (b.min_equity..=b.max_equity).contains(&equity),
                    "{round:?}/{stage:?}/{interest}: equity {equity}"
                );
                assert_eq!(amount, amount.round());
                assert_eq!(equity, (equity * 10.0).round() / 10.0);
                assert!(valuation > 0.0);
            }
        }
    }
}

#[test]
fn keener_investors_offer_more_for_less() {
    let (low_amount, low_equity, _) = offer_terms(RoundType::SeriesA, 0.1, &company(Milestone::Validated));
    let (high_amount, high_equity, _) = offer_terms(RoundType::SeriesA, 0.9, &company(Milestone::Validated));
    assert!(high_amount > low_amount);
    assert!(high_equity < low_equity);
}

#[test]
fn interest_draw_is_biased_by_difficulty_and_fit() {
    let easy = FundingSubsystem::new(Difficulty::Easy);
    let hard = FundingSubsystem::new(Difficulty::Hard);

    let drawn = easy.draw_interest(&mut FixedRng::constant(0.5), 0.5);
    assert!((drawn - 0.75).abs() < 1e-9, "drawn={drawn}");

    assert_eq!(hard.draw_interest(&mut FixedRng::constant(0.05), 0.0), 0.0);
    assert_eq!(easy.draw_interest(&mut FixedRng::constant(0.99), 1.0), 1.0);
}

// ── Round state machine ──────────────────────────────────────────────────────

#[test]
fn only_one_round_may_be_active() {
    let mut engine = make_engine("funding-single");
    start_seed(&mut engine, 0.5);
    let before = engine.state().funding.clone();

    let again = engine.start_fundraising(RoundType::Seed);
    assert!(matches!(again, Err(SimError::InvalidState(_))));
    assert_eq!(engine.state().funding, before);
}

#[test]
fn priced_rounds_need_an_earlier_raise() {
    let result = start_round(&FundingState::default(), RoundType::SeriesA, 0.5, 0.0);
    assert!(matches!(result, Err(SimError::InvalidState(_))));

    let funded = FundingState {
        total_raised: 500_000.0,
        ..FundingState::default()
    };
    assert!(start_round(&funded, RoundType::SeriesA, 0.5, 0.0).is_ok());
}

#[test]
fn drawn_interest_comes_from_the_funding_stream() {
    let bank = RngBank::new(5).with_source(SubsystemSlot::Funding, Box::new(FixedRng::constant(0.4)));
    let mut engine = SimEngine::build_test("funding-drawn".into(), 5)
        .unwrap()
        .with_rng_bank(bank);
    engine.select_product("test_pair").unwrap();

    let state = engine.start_fundraising(RoundType::Seed).unwrap();
    let round = state.funding.active_round.as_ref().unwrap();
    assert!((round.investor_interest - 0.4).abs() < 1e-9);
    assert_eq!(round.status, RoundStatus::InProgress);
}

/// The first offer lands thirty days into the round.
#[test]
fn first_offer_arrives_after_thirty_days() {
    let mut engine = make_engine("funding-offer");
    start_seed(&mut engine, 0.0);

    engine.run_ticks(29).unwrap();
    assert!(engine.state().funding.active_round.as_ref().unwrap().offers.is_empty());

    engine.run_ticks(1).unwrap();
    let offer = first_offer(&engine);
    // Idea stage, no interest: both terms hit the seed bracket edges.
    assert_eq!(offer.amount, 100_000.0);
    assert_eq!(offer.equity_percent, 40.0);
    assert_eq!(offer.expires_at, 60.0);

    engine.run_ticks(10).unwrap();
    assert_eq!(engine.state().funding.active_round.as_ref().unwrap().offers.len(), 1);
}

#[test]
fn accepting_an_offer_closes_the_round_with_exact_totals() {
    let mut engine = make_engine("funding-accept");
    start_seed(&mut engine, 0.5);
    engine.run_ticks(30).unwrap();

    let offer = first_offer(&engine);
    let money_before = engine.state().money();

    assert!(engine.accept_funding_offer(&offer.id));

    let state = engine.state();
    assert_eq!(state.money(), money_before + offer.amount);
    assert_eq!(state.funding.total_raised, offer.amount);
    assert_eq!(state.funding.total_equity, offer.equity_percent);
    assert!(state.funding.active_round.is_none());
    assert_eq!(state.funding.rounds.len(), 1);
    assert_eq!(state.funding.rounds[0].status, RoundStatus::Completed);

    // Nothing left to accept.
    assert!(!engine.accept_funding_offer(&offer.id));
}

#[test]
fn expired_offers_cannot_be_accepted() {
    let mut engine = make_engine("funding-expired");
    start_seed(&mut engine, 0.5);
    engine.run_ticks(30).unwrap();
    let offer = first_offer(&engine);

    engine.run_ticks(31).unwrap();
    assert!(engine.state().current_time() > offer.expires_at);

    let result = accept_offer(&engine.state().funding, &offer.id, engine.state().current_time());
    assert!(matches!(result, Err(SimError::InvalidState(_))));
    assert!(!engine.accept_funding_offer(&offer.id));
    assert_eq!(engine.state().funding.total_raised, 0.0);
}

/// With its only offer lapsed, the round fails at day 120 and is archived.
#[test]
fn round_fails_after_four_months_without_live_offers() {
    let mut engine = make_engine("funding-fail");
    start_seed(&mut engine, 0.5);

    engine.run_ticks(119).unwrap();
    assert!(engine.state().funding.active_round.is_some());

    engine.run_ticks(1).unwrap();
    let funding = &engine.state().funding;
    assert!(funding.active_round.is_none());
    assert_eq!(funding.rounds.len(), 1);
    assert_eq!(funding.rounds[0].status, RoundStatus::Failed);
    assert!(funding.rounds[0].offers.is_empty());
    assert!(engine.event_log().iter().any(|e| e.event_type == "round_failed"));

    // A new round may start after a failure.
    start_seed(&mut engine, 0.5);
}

#[test]
fn offer_expiring_today_survives_pruning() {
    let config = GameConfig::default_test();
    let state = GameState::new("funding-boundary".into(), &config);
    let offer = FundingOffer {
        id: "offer-001".into(),
        round_type: RoundType::Seed,
        amount: 200_000.0,
        valuation: 1_000_000.0,
        equity_percent: 20.0,
        expires_at: 120.0,
    };
    let prior = FundingState {
        active_round: Some(FundingRound {
            id: "round-001".into(),
            round_type: RoundType::Seed,
            status: RoundStatus::InProgress,
            started_at: 0.0,
            investor_interest: 0.5,
            offers: vec![offer],
        }),
        ..FundingState::default()
    };
    let ctx = TickContext { now: 120.0, delta: 1.0, state: &state };

    let step = FundingSubsystem::new(Difficulty::Medium)
        .update(&prior, &ctx, &mut FixedRng::constant(0.0))
        .unwrap();
    assert_eq!(step.state.active_round.unwrap().offers.len(), 1);

    let later = TickContext { now: 120.5, delta: 0.5, state: &state };
    let step = FundingSubsystem::new(Difficulty::Medium)
        .update(&prior, &later, &mut FixedRng::constant(0.0))
        .unwrap();
    assert!(step.state.active_round.is_none());
    assert_eq!(step.state.rounds[0].status, RoundStatus::Failed);
}

/// A refused Series A must leave the funding stream where it was.
#[test]
fn rejected_start_does_not_consume_a_funding_draw() {
    let mut clean = make_engine("funding-draw-clean");
    let mut refused = make_engine("funding-draw-refused");

    assert!(matches!(
        refused.start_fundraising(RoundType::SeriesA),
        Err(SimError::InvalidState(_))
    ));
    assert!(refused.state().funding.active_round.is_none());

    let a = clean.start_fundraising(RoundType::Seed).unwrap();
    let b = refused.start_fundraising(RoundType::Seed).unwrap();
    assert_eq!(
        a.funding.active_round.as_ref().unwrap().investor_interest,
        b.funding.active_round.as_ref().unwrap().investor_interest
    );
}

#[test]
fn non_finite_interest_counts_as_none() {
    let profile = company(Milestone::Mvp);
    assert_eq!(
        offer_terms(RoundType::Seed, f64::NAN, &profile),
        offer_terms(RoundType::Seed, 0.0, &profile)
    );
    assert_eq!(
        offer_terms(RoundType::SeriesA, f64::INFINITY, &profile),
        offer_terms(RoundType::SeriesA, 0.0, &profile)
    );

    let started = start_round(&FundingState::default(), RoundType::Seed, f64::NAN, 0.0).unwrap();
    assert_eq!(started.active_round.unwrap().investor_interest, 0.0);
}

#[test]
fn nan_interest_still_closes_with_exact_totals() {
    let mut engine = make_engine("funding-nan");
    start_seed(&mut engine, f64::NAN);
    engine.run_ticks(30).unwrap();

    let offer = first_offer(&engine);
    assert_eq!(offer.amount, 100_000.0);
    assert_eq!(offer.equity_percent, 40.0);

    let money_before = engine.state().money();
    assert!(engine.accept_funding_offer(&offer.id));
    let state = engine.state();
    assert_eq!(state.funding.total_raised, 100_000.0);
    assert_eq!(state.funding.total_equity, 40.0);
    assert_eq!(state.money(), money_before + 100_000.0);
}
