//! The simulation engine — the heart of Runway.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   0. Queued player commands
//!   1. Team subsystem       (onboarding, candidate pool, productivity)
//!   2. Product subsystem    (reads this tick's team)
//!   3. Finance subsystem    (reads this tick's milestone and team)
//!   4. Funding subsystem    (offer valuation reads this tick's finance)
//!   5. Narrative subsystem
//!   6. Game-over check      (money <= 0 ends the run for good)
//!
//! RULES:
//!   - Each subsystem owns one slice of GameState and returns its next value.
//!   - Later subsystems see earlier subsystems' output for the same tick.
//!   - Cross-slice effects (hiring cost, event effects, funding cash) are
//!     applied here, never inside a subsystem.
//!   - All randomness flows through the RngBank.
//!   - All state changes are recorded in the event log.
//!   - A published snapshot is never mutated; every change swaps in a new one.

use crate::{
    clock::GameSpeed,
    command::{PlayerCommand, QueuedCommand},
    config::GameConfig,
    error::{SimError, SimResult},
    event::{EventLogEntry, SimEvent},
    finance_subsystem::FinanceSubsystem,
    funding_subsystem::{self, FundingSubsystem, RoundType},
    narrative_subsystem::{self, EffectType, EventEffect, NarrativeSubsystem},
    product_subsystem::{self, Feature, ProductState, ProductSubsystem},
    rng::{RngBank, SubsystemSlot},
    snapshot::GameState,
    subsystem::{SimSubsystem, Step, TickContext},
    team_subsystem::{self, Candidate, TeamSubsystem},
    types::{Days, RunId},
};
use std::{collections::VecDeque, sync::Arc};

pub const OUT_OF_MONEY: &str = "Ran out of money";

pub struct SimEngine {
    pub run_id: RunId,
    seed:       u64,
    config:     GameConfig,
    rng_bank:   RngBank,
    state:      Arc<GameState>,
    team:       TeamSubsystem,
    product:    ProductSubsystem,
    finance:    FinanceSubsystem,
    funding:    FundingSubsystem,
    narrative:  NarrativeSubsystem,
    queue:      VecDeque<QueuedCommand>,
    commands_issued: u64,
    /// Journal entries not yet drained. `seq` keeps counting across drains.
    event_log:  Vec<EventLogEntry>,
    next_seq:   u64,
}

impl SimEngine {
    /// Initialize a run: empty team, no product, starting cash from config.
    pub fn new(run_id: RunId, seed: u64, config: GameConfig) -> SimResult<Self> {
        let state = GameState::new(run_id.clone(), &config);
        let mut engine = Self {
            seed,
            rng_bank:   RngBank::new(seed),
            state:      Arc::new(state),
            team:       TeamSubsystem::new(config.onboarding_days, config.candidate_pool_size),
            product:    ProductSubsystem,
            finance:    FinanceSubsystem::new(config.overhead_floor),
            funding:    FundingSubsystem::new(config.difficulty),
            narrative:  NarrativeSubsystem,
            queue:      VecDeque::new(),
            commands_issued: 0,
            event_log:  Vec::new(),
            next_seq:   0,
            config,
            run_id,
        };
        let init = SimEvent::RunInitialized {
            run_id: engine.run_id.clone(),
            seed,
        };
        engine.record("engine", 0.0, &[init])?;
        log::debug!("run {} initialized with seed {seed}", engine.run_id);
        Ok(engine)
    }

    /// Engine on the test config. Tests call this instead of loading data files.
    pub fn build_test(run_id: RunId, seed: u64) -> SimResult<Self> {
        Self::new(run_id, seed, GameConfig::default_test())
    }

    /// Swap in a prepared RNG bank, e.g. one with scripted streams.
    pub fn with_rng_bank(mut self, bank: RngBank) -> Self {
        self.rng_bank = bank;
        self
    }

    // ── Accessors ─────────────────────────────────────────────

    /// The current snapshot. Cheap to clone and safe to hold across ticks.
    pub fn snapshot(&self) -> Arc<GameState> {
        Arc::clone(&self.state)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Journal entries recorded since the last drain.
    pub fn event_log(&self) -> &[EventLogEntry] {
        &self.event_log
    }

    /// Hand the buffered journal to the caller and start a fresh buffer.
    /// Long-running drivers call this to keep memory flat.
    pub fn drain_event_log(&mut self) -> Vec<EventLogEntry> {
        std::mem::take(&mut self.event_log)
    }

    pub fn queued_commands(&self) -> usize {
        self.queue.len()
    }

    // ── Setup ─────────────────────────────────────────────────

    /// Bind a product template and install its feature backlog.
    /// Ticks do nothing until this has been called.
    pub fn select_product(&mut self, template_id: &str) -> SimResult<Arc<GameState>> {
        self.ensure_running()?;
        if let Some(existing) = &self.state.product.product_template_id {
            return Err(SimError::invalid(format!("product '{existing}' already selected")));
        }
        let template = self
            .config
            .template(template_id)
            .ok_or_else(|| SimError::not_found("product template", template_id))?;

        let features: Vec<Feature> = template
            .features
            .iter()
            .map(|f| Feature {
                id: f.id.clone(),
                name: f.name.clone(),
                description: f.description.clone(),
                progress: 0.0,
                priority: f.priority.max(1),
                base_complexity: f.base_complexity,
            })
            .collect();
        let revenue_per_sale = self.config.base_revenue_per_sale * template.revenue_potential;
        let event = SimEvent::ProductSelected {
            template_id: template.id.clone(),
            feature_count: features.len(),
        };

        let mut next = (*self.state).clone();
        next.product = ProductState::from_template(template_id, features);
        next.finance.revenue_per_sale = revenue_per_sale;
        self.refresh_finance(&mut next);

        log::info!("run {}: product '{template_id}' selected", self.run_id);
        self.record("engine", next.current_time(), &[event])?;
        self.state = Arc::new(next);
        Ok(self.snapshot())
    }

    /// Put a specific candidate in the hiring pool.
    pub fn seed_candidate(&mut self, candidate: Candidate) -> SimResult<Arc<GameState>> {
        self.ensure_running()?;
        let mut next = (*self.state).clone();
        next.team.candidate_pool.push(candidate);
        self.state = Arc::new(next);
        Ok(self.snapshot())
    }

    // ── Commands ──────────────────────────────────────────────

    /// Queue a command for the start of the next tick.
    pub fn submit_command(&mut self, command: PlayerCommand) -> SimResult<()> {
        self.ensure_running()?;
        self.commands_issued += 1;
        let queued = QueuedCommand {
            run_id:     self.run_id.clone(),
            queued_at:  self.state.current_time(),
            command_id: format!("cmd-{:05}", self.commands_issued),
            command,
        };
        log::debug!("queued {} ({})", queued.command_id, queued.command.type_name());
        self.queue.push_back(queued);
        Ok(())
    }

    /// Apply a command now. On error the snapshot is left untouched and
    /// the rejection is journaled.
    pub fn apply_command(&mut self, command: PlayerCommand) -> SimResult<Arc<GameState>> {
        self.ensure_running()?;
        self.dispatch(command).1
    }

    pub fn hire(&mut self, candidate_id: &str) -> SimResult<Arc<GameState>> {
        self.apply_command(PlayerCommand::Hire { candidate_id: candidate_id.into() })
    }

    pub fn fire(&mut self, employee_id: &str) -> SimResult<Arc<GameState>> {
        self.apply_command(PlayerCommand::Fire { employee_id: employee_id.into() })
    }

    pub fn complete_onboarding(&mut self, employee_id: &str) -> SimResult<Arc<GameState>> {
        self.apply_command(PlayerCommand::CompleteOnboarding { employee_id: employee_id.into() })
    }

    pub fn prioritize_feature(&mut self, feature_id: &str, priority: i64) -> SimResult<Arc<GameState>> {
        self.apply_command(PlayerCommand::PrioritizeFeature {
            feature_id: feature_id.into(),
            priority,
        })
    }

    pub fn start_fundraising(&mut self, round_type: RoundType) -> SimResult<Arc<GameState>> {
        self.apply_command(PlayerCommand::StartFundraising {
            round_type,
            investor_interest: None,
        })
    }

    /// Accept an offer on the active round. Returns whether the deal closed.
    pub fn accept_funding_offer(&mut self, offer_id: &str) -> bool {
        self.apply_command(PlayerCommand::AcceptFundingOffer { offer_id: offer_id.into() })
            .is_ok()
    }

    pub fn respond_to_event(&mut self, event_id: &str, option_id: &str) -> SimResult<Arc<GameState>> {
        self.apply_command(PlayerCommand::RespondToEvent {
            event_id: event_id.into(),
            option_id: option_id.into(),
        })
    }

    pub fn set_paused(&mut self, paused: bool) -> SimResult<Arc<GameState>> {
        let command = if paused { PlayerCommand::Pause } else { PlayerCommand::Resume };
        self.apply_command(command)
    }

    pub fn set_game_speed(&mut self, speed: GameSpeed) -> SimResult<Arc<GameState>> {
        self.apply_command(PlayerCommand::SetSpeed { speed })
    }

    // ── Ticking ───────────────────────────────────────────────

    /// Advance the simulation by `delta` days. This is the core simulation step.
    ///
    /// Queued commands are applied first. After that the tick is an identity
    /// while paused or before a product is selected. Once the game is over
    /// every tick is an identity.
    pub fn tick(&mut self, delta: Days) -> SimResult<Vec<SimEvent>> {
        if self.state.game_over {
            return Ok(Vec::new());
        }
        if !(delta.is_finite() && delta > 0.0) {
            return Err(SimError::invalid(format!("tick delta must be positive, got {delta}")));
        }

        let mut produced = Vec::new();
        while let Some(queued) = self.queue.pop_front() {
            let (events, result) = self.dispatch(queued.command);
            produced.extend(events);
            if let Err(err) = result {
                log::debug!("{} dropped: {err}", queued.command_id);
            }
        }

        if self.state.is_paused() || !self.state.has_product() {
            return Ok(produced);
        }

        let mut working = (*self.state).clone();
        let now = working.clock.advance(delta);
        let started = SimEvent::TickStarted { day: now };
        self.record("engine", now, std::slice::from_ref(&started))?;
        produced.push(started);

        let step = run(&self.team, &working.team, &working, delta, &mut self.rng_bank)?;
        self.record(self.team.name(), now, &step.events)?;
        produced.extend(step.events);
        working.team = step.state;

        let step = run(&self.product, &working.product, &working, delta, &mut self.rng_bank)?;
        self.record(self.product.name(), now, &step.events)?;
        produced.extend(step.events);
        working.product = step.state;

        let step = run(&self.finance, &working.finance, &working, delta, &mut self.rng_bank)?;
        self.record(self.finance.name(), now, &step.events)?;
        produced.extend(step.events);
        working.finance = step.state;

        let step = run(&self.funding, &working.funding, &working, delta, &mut self.rng_bank)?;
        self.record(self.funding.name(), now, &step.events)?;
        produced.extend(step.events);
        working.funding = step.state;

        let step = run(&self.narrative, &working.events, &working, delta, &mut self.rng_bank)?;
        self.record(self.narrative.name(), now, &step.events)?;
        produced.extend(step.events);
        working.events = step.state;

        let mut closing = Vec::new();
        if working.finance.money <= 0.0 {
            working.game_over = true;
            working.game_over_reason = Some(OUT_OF_MONEY.to_string());
            log::warn!("day={now:.1} game over: {OUT_OF_MONEY} (money={:.0})", working.finance.money);
            closing.push(SimEvent::GameOver {
                day: now,
                reason: OUT_OF_MONEY.to_string(),
            });
        }
        closing.push(SimEvent::TickCompleted { day: now });
        self.record("engine", now, &closing)?;
        produced.extend(closing);

        self.state = Arc::new(working);
        Ok(produced)
    }

    /// Run n one-day ticks. Used for testing and fast-forward.
    pub fn run_ticks(&mut self, n: u64) -> SimResult<()> {
        for _ in 0..n {
            self.tick(1.0)?;
        }
        Ok(())
    }

    // ── Internals ─────────────────────────────────────────────

    /// Apply one command and journal the outcome. Returns the journal
    /// events alongside the result so ticks can report them.
    fn dispatch(&mut self, command: PlayerCommand) -> (Vec<SimEvent>, SimResult<Arc<GameState>>) {
        let day = self.state.current_time();
        let mut next = (*self.state).clone();
        let mut events = vec![SimEvent::PlayerCommandReceived {
            day,
            command_type: command.type_name().to_string(),
        }];

        let outcome = match self.execute(&mut next, &command) {
            Ok(produced) => {
                events.extend(produced);
                self.refresh_finance(&mut next);
                Ok(next)
            }
            Err(err) => {
                log::warn!("day={day:.1} {} rejected: {err}", command.type_name());
                events.push(SimEvent::CommandRejected {
                    day,
                    command_type: command.type_name().to_string(),
                    reason: err.to_string(),
                });
                Err(err)
            }
        };

        if let Err(err) = self.record("command", day, &events) {
            return (events, Err(err));
        }
        let result = outcome.map(|next| {
            self.state = Arc::new(next);
            self.snapshot()
        });
        (events, result)
    }

    fn ensure_running(&self) -> SimResult<()> {
        if self.state.game_over {
            return Err(SimError::GameOver {
                reason: self
                    .state
                    .game_over_reason
                    .clone()
                    .unwrap_or_else(|| OUT_OF_MONEY.to_string()),
            });
        }
        Ok(())
    }

    /// Apply one command to `next`, returning the journal events it produced.
    fn execute(&mut self, next: &mut GameState, command: &PlayerCommand) -> SimResult<Vec<SimEvent>> {
        let day = next.current_time();
        let events = match command {
            PlayerCommand::Pause => {
                next.clock.pause();
                Vec::new()
            }
            PlayerCommand::Resume => {
                next.clock.resume();
                Vec::new()
            }
            PlayerCommand::SetSpeed { speed } => {
                next.clock.set_speed(*speed);
                Vec::new()
            }
            PlayerCommand::Hire { candidate_id } => {
                let discount = next.finance.adjustments.hiring_fraction(day);
                let (team, employee) = team_subsystem::hire(&next.team, candidate_id, day, discount)?;
                next.team = team;
                log::info!(
                    "day={day:.1} hired {} as {:?} at ${:.0}/mo",
                    employee.name, employee.role, employee.salary
                );
                vec![SimEvent::EmployeeHired {
                    day,
                    employee_id: employee.id,
                    role: employee.role,
                    salary: employee.salary,
                }]
            }
            PlayerCommand::Fire { employee_id } => {
                next.team = team_subsystem::fire(&next.team, employee_id)?;
                vec![SimEvent::EmployeeFired {
                    day,
                    employee_id: employee_id.clone(),
                }]
            }
            PlayerCommand::CompleteOnboarding { employee_id } => {
                next.team = team_subsystem::complete_onboarding(&next.team, employee_id)?;
                vec![SimEvent::EmployeeOnboarded {
                    day,
                    employee_id: employee_id.clone(),
                }]
            }
            PlayerCommand::PrioritizeFeature { feature_id, priority } => {
                next.product = product_subsystem::prioritize(&next.product, feature_id, *priority)?;
                let applied = next
                    .product
                    .features
                    .iter()
                    .find(|f| &f.id == feature_id)
                    .map_or(1, |f| f.priority);
                vec![SimEvent::FeatureReprioritized {
                    day,
                    feature_id: feature_id.clone(),
                    priority: applied,
                }]
            }
            PlayerCommand::StartFundraising { round_type, investor_interest } => {
                // A refused start must not consume a funding draw.
                funding_subsystem::can_start_round(&next.funding, *round_type)?;
                let interest = match investor_interest {
                    Some(value) => *value,
                    None => self.funding.draw_interest(
                        self.rng_bank.for_subsystem(SubsystemSlot::Funding),
                        next.product.product_market_fit,
                    ),
                };
                next.funding = funding_subsystem::start_round(&next.funding, *round_type, interest, day)?;
                let Some(round) = &next.funding.active_round else {
                    return Err(SimError::invalid("round did not start"));
                };
                log::info!(
                    "day={day:.1} fundraising: {:?} round opened, interest {:.2}",
                    round.round_type, round.investor_interest
                );
                vec![SimEvent::FundraisingStarted {
                    day,
                    round_id: round.id.clone(),
                    round_type: round.round_type,
                    investor_interest: round.investor_interest,
                }]
            }
            PlayerCommand::AcceptFundingOffer { offer_id } => {
                let round_id = next
                    .funding
                    .active_round
                    .as_ref()
                    .map(|r| r.id.clone())
                    .unwrap_or_default();
                let (funding, offer) = funding_subsystem::accept_offer(&next.funding, offer_id, day)?;
                next.funding = funding;
                next.finance = next.finance.with_cash(offer.amount);
                log::info!(
                    "day={day:.1} closed round {round_id}: ${:.0} for {:.1}%",
                    offer.amount, offer.equity_percent
                );
                vec![SimEvent::RoundCompleted {
                    day,
                    round_id,
                    amount: offer.amount,
                    equity_percent: offer.equity_percent,
                }]
            }
            PlayerCommand::RespondToEvent { event_id, option_id } => {
                let (events, effects) =
                    narrative_subsystem::resolve(&next.events, event_id, option_id, day)?;
                next.events = events;
                let mut produced = vec![SimEvent::NarrativeEventResolved {
                    day,
                    event_id: event_id.clone(),
                    option_id: option_id.clone(),
                }];
                for effect in &effects {
                    produced.extend(apply_effect(next, effect, day));
                }
                produced
            }
        };
        Ok(events)
    }

    /// Recompute derived finance figures without moving cash.
    fn refresh_finance(&self, state: &mut GameState) {
        state.finance = self.finance.recompute(
            &state.finance,
            &state.team,
            state.product.current_milestone,
            state.product.product_market_fit,
        );
    }

    fn record(&mut self, subsystem: &str, day: Days, events: &[SimEvent]) -> SimResult<()> {
        for event in events {
            let entry = EventLogEntry {
                seq:        self.next_seq,
                run_id:     self.run_id.clone(),
                day,
                subsystem:  subsystem.to_string(),
                event_type: event.type_name().to_string(),
                payload:    serde_json::to_string(event)?,
            };
            self.event_log.push(entry);
            self.next_seq += 1;
        }
        Ok(())
    }
}

/// Run one subsystem against the working snapshot.
fn run<S: SimSubsystem>(
    subsystem: &S,
    prior: &S::State,
    working: &GameState,
    delta: Days,
    rng_bank: &mut RngBank,
) -> SimResult<Step<S::State>> {
    let ctx = TickContext {
        now: working.current_time(),
        delta,
        state: working,
    };
    subsystem.update(prior, &ctx, rng_bank.for_subsystem(subsystem.slot()))
}

/// Apply a narrative effect to the company.
///
/// | type     | target                          | rule                               |
/// |----------|---------------------------------|------------------------------------|
/// | money    | cash                            | one-off delta                      |
/// | expense  | new-hire salary (if abs(v) < 1) | fractional change for 60 days      |
/// | expense  | recurring expense (otherwise)   | monthly delta                      |
/// | team     | every employee's productivity   | delta, clamped to [0, 1]           |
/// | product  | top active feature (v >= 0)     | +v progress points, capped at 100  |
/// | product  | development debt (v < 0)        | owed from future capacity          |
/// | revenue  | recurring revenue               | monthly delta                      |
/// | market   | product-market fit              | delta, clamped to [0, 1]           |
///
/// Returns the journal entries the effect causes: a product boost that
/// finishes a feature reports it here, since the next product tick no
/// longer sees that feature as active.
pub fn apply_effect(state: &mut GameState, effect: &EventEffect, now: Days) -> Vec<SimEvent> {
    let v = effect.value;
    let mut events = Vec::new();
    match effect.effect_type {
        EffectType::Money => state.finance = state.finance.with_cash(v),
        EffectType::Expense if v.abs() < 1.0 => {
            state.finance = state.finance.with_hiring_modifier(v, now)
        }
        EffectType::Expense => state.finance = state.finance.with_recurring_expense(v),
        EffectType::Team => state.team = team_subsystem::adjust_productivity(&state.team, v),
        EffectType::Product => {
            let next = product_subsystem::apply_progress_effect(&state.product, v);
            events = product_subsystem::completion_events(&state.product, &next, now);
            state.product = next;
        }
        EffectType::Revenue => state.finance = state.finance.with_recurring_revenue(v),
        EffectType::Market => {
            state.product = product_subsystem::apply_market_effect(&state.product, v)
        }
    }
    log::debug!("day={now:.1} effect {:?} {v}: {}", effect.effect_type, effect.description);
    events
}
