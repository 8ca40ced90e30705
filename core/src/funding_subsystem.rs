//! Funding subsystem — fundraising rounds, offers, and dilution.
//!
//! Round lifecycle:
//!   none → in_progress → { completed, failed }
//!
//! At most one round is active. Thirty days into a round the first offer
//! arrives; from day 120 on, expired offers are pruned and a round left
//! with none fails. Accepting an offer is a player command routed through
//! the engine, which also credits the cash.

use crate::{
    config::Difficulty,
    error::{SimError, SimResult},
    event::SimEvent,
    finance_subsystem::valuation,
    product_subsystem::Milestone,
    rng::{RandomSource, SubsystemSlot},
    subsystem::{SimSubsystem, Step, TickContext},
    types::{Days, EntityId},
};
use serde::{Deserialize, Serialize};

pub const OFFER_DELAY_DAYS: Days = 30.0;
pub const ROUND_TIMEOUT_DAYS: Days = 120.0;
pub const OFFER_VALIDITY_DAYS: Days = 30.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum RoundType {
    Seed,
    SeriesA,
    SeriesB,
    SeriesC,
}

/// Offer terms for one round type: raw values linear in investor
/// interest, then clamped to the bracket.
#[derive(Debug, Clone, Copy)]
pub struct Bracket {
    pub min_amount: f64,
    pub max_amount: f64,
    pub min_equity: f64,
    pub max_equity: f64,
    base_amount: f64,
    amount_per_interest: f64,
    base_equity: f64,
    equity_per_interest: f64,
}

impl RoundType {
    pub fn bracket(&self) -> Bracket {
        match self {
            Self::Seed => Bracket {
                min_amount: 100_000.0,
                max_amount: 1_000_000.0,
                min_equity: 10.0,
                max_equity: 40.0,
                base_amount: 300_000.0,
                amount_per_interest: 700_000.0,
                base_equity: 30.0,
                equity_per_interest: 15.0,
            },
            Self::SeriesA => Bracket {
                min_amount: 2_000_000.0,
                max_amount: 10_000_000.0,
                min_equity: 5.0,
                max_equity: 25.0,
                base_amount: 2_000_000.0,
                amount_per_interest: 8_000_000.0,
                base_equity: 20.0,
                equity_per_interest: 10.0,
            },
            Self::SeriesB => Bracket {
                min_amount: 10_000_000.0,
                max_amount: 50_000_000.0,
                min_equity: 3.0,
                max_equity: 20.0,
                base_amount: 10_000_000.0,
                amount_per_interest: 40_000_000.0,
                base_equity: 15.0,
                equity_per_interest: 10.0,
            },
            Self::SeriesC => Bracket {
                min_amount: 50_000_000.0,
                max_amount: 200_000_000.0,
                min_equity: 2.0,
                max_equity: 15.0,
                base_amount: 50_000_000.0,
                amount_per_interest: 150_000_000.0,
                base_equity: 10.0,
                equity_per_interest: 7.0,
            },
        }
    }

    /// Priced rounds need a closed round behind them.
    pub fn requires_prior_raise(&self) -> bool {
        !matches!(self, Self::Seed)
    }
}

fn amount_multiplier(stage: Milestone) -> f64 {
    match stage {
        Milestone::Idea      => 0.3,
        Milestone::Mvp       => 0.5,
        Milestone::Validated => 0.75,
        Milestone::Growing   => 0.95,
        Milestone::Mature    => 1.0,
    }
}

fn equity_multiplier(stage: Milestone) -> f64 {
    match stage {
        Milestone::Idea      => 1.5,
        Milestone::Mvp       => 1.2,
        Milestone::Validated => 1.0,
        Milestone::Growing   => 0.9,
        Milestone::Mature    => 0.8,
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RoundStatus {
    InProgress,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FundingOffer {
    pub id: EntityId,
    pub round_type: RoundType,
    pub amount: f64,
    pub valuation: f64,
    pub equity_percent: f64,
    pub expires_at: Days,
}

impl FundingOffer {
    pub fn is_expired(&self, now: Days) -> bool {
        self.expires_at < now
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FundingRound {
    pub id: EntityId,
    pub round_type: RoundType,
    pub status: RoundStatus,
    pub started_at: Days,
    pub investor_interest: f64,
    pub offers: Vec<FundingOffer>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FundingState {
    pub active_round: Option<FundingRound>,
    /// Closed rounds, completed or failed, oldest first.
    pub rounds: Vec<FundingRound>,
    pub total_equity: f64,
    pub total_raised: f64,
    /// Counter behind round and offer ids.
    #[serde(default)]
    pub issued: u64,
}

impl FundingState {
    fn next_id(&mut self, prefix: &str) -> EntityId {
        self.issued += 1;
        format!("{prefix}-{:03}", self.issued)
    }
}

/// What the offer formula reads from the rest of the company.
#[derive(Debug, Clone, Copy)]
pub struct CompanyProfile {
    pub stage: Milestone,
    pub monthly_revenue: f64,
    pub maturity: f64,
    pub team_size: usize,
    pub product_market_fit: f64,
}

/// Offer terms before an id is assigned: (amount, equity_percent, valuation).
pub fn offer_terms(round_type: RoundType, investor_interest: f64, company: &CompanyProfile) -> (f64, f64, f64) {
    let b = round_type.bracket();
    let interest = clamp_interest(investor_interest);

    let raw_amount = b.base_amount + interest * b.amount_per_interest;
    let raw_equity = b.base_equity - interest * b.equity_per_interest;

    let amount = raw_amount * (0.8 + interest * 0.4) * amount_multiplier(company.stage);
    let equity = raw_equity * (1.2 - interest * 0.4) * equity_multiplier(company.stage);

    let amount = amount.clamp(b.min_amount, b.max_amount).round();
    let equity = (equity.clamp(b.min_equity, b.max_equity) * 10.0).round() / 10.0;
    let value = valuation(
        company.monthly_revenue,
        company.maturity,
        company.team_size,
        company.product_market_fit,
        Some(company.stage),
    )
    .round();
    (amount, equity, value)
}

/// Interest in [0, 1]. Non-finite input counts as no interest at all.
fn clamp_interest(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Whether a round of `round_type` may open now. Fails if one is already
/// running or if a priced round is attempted before any money has been raised.
pub fn can_start_round(prior: &FundingState, round_type: RoundType) -> SimResult<()> {
    if let Some(active) = &prior.active_round {
        return Err(SimError::invalid(format!(
            "round {} is already in progress",
            active.id
        )));
    }
    if round_type.requires_prior_raise() && prior.total_raised <= 0.0 {
        return Err(SimError::invalid(format!(
            "{round_type:?} requires a completed earlier round"
        )));
    }
    Ok(())
}

/// Open a new round; see [`can_start_round`] for when this is refused.
pub fn start_round(
    prior: &FundingState,
    round_type: RoundType,
    investor_interest: f64,
    now: Days,
) -> SimResult<FundingState> {
    can_start_round(prior, round_type)?;
    let mut next = prior.clone();
    let id = next.next_id("round");
    next.active_round = Some(FundingRound {
        id,
        round_type,
        status: RoundStatus::InProgress,
        started_at: now,
        investor_interest: clamp_interest(investor_interest),
        offers: Vec::new(),
    });
    Ok(next)
}

/// Close the active round on `offer_id`. The caller credits the cash.
pub fn accept_offer(
    prior: &FundingState,
    offer_id: &str,
    now: Days,
) -> SimResult<(FundingState, FundingOffer)> {
    let round = prior
        .active_round
        .as_ref()
        .filter(|r| r.status == RoundStatus::InProgress)
        .ok_or_else(|| SimError::invalid("no funding round in progress"))?;
    let offer = round
        .offers
        .iter()
        .find(|o| o.id == offer_id)
        .ok_or_else(|| SimError::not_found("offer", offer_id))?;
    if offer.is_expired(now) {
        return Err(SimError::invalid(format!("offer {offer_id} expired at day {:.1}", offer.expires_at)));
    }

    let offer = offer.clone();
    let mut closed = round.clone();
    closed.status = RoundStatus::Completed;

    let mut next = prior.clone();
    next.total_raised += offer.amount;
    next.total_equity += offer.equity_percent;
    next.active_round = None;
    next.rounds.push(closed);
    Ok((next, offer))
}

pub struct FundingSubsystem {
    difficulty: Difficulty,
}

impl FundingSubsystem {
    pub fn new(difficulty: Difficulty) -> Self {
        Self { difficulty }
    }

    /// Investor interest for a new round: a uniform draw nudged by
    /// difficulty and product-market fit.
    pub fn draw_interest(&self, rng: &mut dyn RandomSource, product_market_fit: f64) -> f64 {
        let roll = rng.next_f64();
        (roll + self.difficulty.investor_interest_bias() + 0.2 * product_market_fit.clamp(0.0, 1.0))
            .clamp(0.0, 1.0)
    }
}

impl SimSubsystem for FundingSubsystem {
    type State = FundingState;

    fn name(&self) -> &'static str { "funding" }

    fn slot(&self) -> SubsystemSlot { SubsystemSlot::Funding }

    fn update(
        &self,
        prior: &FundingState,
        ctx: &TickContext<'_>,
        _rng: &mut dyn RandomSource,
    ) -> SimResult<Step<FundingState>> {
        let Some(active) = prior.active_round.as_ref() else {
            return Ok(Step::quiet(prior.clone()));
        };
        if active.status != RoundStatus::InProgress {
            return Ok(Step::quiet(prior.clone()));
        }

        let mut next = prior.clone();
        let mut round = active.clone();
        let mut events = Vec::new();
        let elapsed = ctx.now - round.started_at;

        if elapsed >= OFFER_DELAY_DAYS && round.offers.is_empty() {
            let state = ctx.state;
            let company = CompanyProfile {
                stage: state.product.current_milestone,
                monthly_revenue: state.finance.monthly_revenue,
                maturity: state.product.maturity,
                team_size: state.team.headcount(),
                product_market_fit: state.product.product_market_fit,
            };
            let (amount, equity_percent, value) =
                offer_terms(round.round_type, round.investor_interest, &company);
            let offer = FundingOffer {
                id: next.next_id("offer"),
                round_type: round.round_type,
                amount,
                valuation: value,
                equity_percent,
                expires_at: ctx.now + OFFER_VALIDITY_DAYS,
            };
            log::info!(
                "day={:.1} funding: {:?} offer ${:.0} for {:.1}% (valuation ${:.0})",
                ctx.now, round.round_type, amount, equity_percent, value
            );
            events.push(SimEvent::FundingOfferReceived {
                day: ctx.now,
                round_id: round.id.clone(),
                offer_id: offer.id.clone(),
                amount,
                equity_percent,
                valuation: value,
            });
            round.offers.push(offer);
        }

        if elapsed >= ROUND_TIMEOUT_DAYS {
            let (expired, live): (Vec<_>, Vec<_>) =
                round.offers.into_iter().partition(|o| o.is_expired(ctx.now));
            for offer in expired {
                events.push(SimEvent::FundingOfferExpired {
                    day: ctx.now,
                    round_id: round.id.clone(),
                    offer_id: offer.id,
                });
            }
            round.offers = live;

            if round.offers.is_empty() {
                log::info!("day={:.1} funding: round {} failed", ctx.now, round.id);
                round.status = RoundStatus::Failed;
                events.push(SimEvent::RoundFailed {
                    day: ctx.now,
                    round_id: round.id.clone(),
                });
                next.rounds.push(round);
                next.active_round = None;
                return Ok(Step::new(next, events));
            }
        }

        next.active_round = Some(round);
        Ok(Step::new(next, events))
    }
}
