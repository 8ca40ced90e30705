//! Finance subsystem — burn, runway, expenses, revenue, valuation.
//!
//! The formulas are free functions with no state and no failure modes:
//! non-finite inputs are treated as zero and results are floored where
//! a negative value would be meaningless.
//!
//! Execution: every tick, after the product subsystem (revenue depends
//! on this tick's milestone) and before funding (offer valuation depends
//! on this tick's revenue).

use crate::{
    error::SimResult,
    event::SimEvent,
    product_subsystem::Milestone,
    rng::{RandomSource, SubsystemSlot},
    subsystem::{SimSubsystem, Step, TickContext},
    team_subsystem::{Employee, Role, TeamState},
    types::{Days, DAYS_PER_MONTH},
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_OVERHEAD_FLOOR: f64 = 2_000.0;
pub const OFFICE_COST_PER_HEAD: f64 = 500.0;
pub const DEFAULT_REVENUE_PER_SALE: f64 = 1_000.0;
/// Marketers per salesperson beyond which marketing stops helping.
pub const MAX_MARKETING_RATIO: f64 = 2.0;
/// How long an event-driven hiring discount lasts.
pub const HIRING_DISCOUNT_DAYS: Days = 60.0;

fn finite(x: f64) -> f64 {
    if x.is_finite() { x } else { 0.0 }
}

/// Sum of salaries plus office overhead, which scales with headcount
/// above a fixed floor.
pub fn monthly_expenses(employees: &[Employee], overhead_floor: f64) -> f64 {
    let salaries: f64 = employees.iter().map(|e| finite(e.salary).max(0.0)).sum();
    let office = finite(overhead_floor).max(employees.len() as f64 * OFFICE_COST_PER_HEAD);
    salaries + office
}

/// Monthly revenue. Sales only start to work once there is an MVP.
pub fn revenue(
    stage: Milestone,
    product_market_fit: f64,
    sales_count: usize,
    marketing_count: usize,
    base_revenue_per_sale: f64,
) -> f64 {
    let stage_multiplier = match stage {
        Milestone::Idea      => return 0.0,
        Milestone::Mvp       => 0.3,
        Milestone::Validated => 0.6,
        Milestone::Growing   => 0.9,
        Milestone::Mature    => 1.0,
    };
    let marketers_per_seller = if sales_count > 0 {
        marketing_count as f64 / sales_count as f64
    } else {
        0.0
    };
    let marketing_multiplier = 1.0 + marketers_per_seller.min(MAX_MARKETING_RATIO) * 0.25;
    let fit_multiplier = 0.5 + finite(product_market_fit).clamp(0.0, 1.0) * 0.5;

    finite(base_revenue_per_sale).max(0.0)
        * sales_count as f64
        * stage_multiplier
        * marketing_multiplier
        * fit_multiplier
}

/// Company valuation. `stage` applies a maturity premium or discount;
/// without it the raw sum is returned.
pub fn valuation(
    monthly_revenue: f64,
    maturity: f64,
    team_size: usize,
    growth_trajectory: f64,
    stage: Option<Milestone>,
) -> f64 {
    let base = finite(monthly_revenue) * 10.0
        + finite(maturity) * 500_000.0
        + team_size as f64 * 50_000.0
        + finite(growth_trajectory) * 1_000_000.0;
    let stage_multiplier = match stage {
        None                       => 1.0,
        Some(Milestone::Idea)      => 0.5,
        Some(Milestone::Mvp)       => 0.7,
        Some(Milestone::Validated) => 0.9,
        Some(Milestone::Growing)   => 1.1,
        Some(Milestone::Mature)    => 1.3,
    };
    base * stage_multiplier
}

pub fn burn_rate(monthly_expenses: f64, monthly_revenue: f64) -> f64 {
    (finite(monthly_expenses) - finite(monthly_revenue)).max(0.0)
}

/// Months of cash left. `None` means unbounded (nothing is burning).
pub fn runway(money: f64, burn_rate: f64) -> Option<f64> {
    if burn_rate > 0.0 {
        Some(finite(money) / burn_rate)
    } else {
        None
    }
}

/// True when the runway is finite and shorter than `months`.
pub fn runway_below(runway: Option<f64>, months: f64) -> bool {
    runway.is_some_and(|r| r < months)
}

/// A temporary percentage change to the salary of new hires.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HiringModifier {
    /// Signed fraction, e.g. -0.2 for 20% cheaper hires.
    pub fraction: f64,
    pub expires_at: Days,
}

/// Lasting changes to the books created by narrative event responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Adjustments {
    /// Added to monthly expenses (e.g. a retention raise).
    pub recurring_expense: f64,
    /// Added to monthly revenue (e.g. a signed contract).
    pub recurring_revenue: f64,
    pub hiring_modifiers: Vec<HiringModifier>,
}

impl Adjustments {
    /// Combined salary multiplier delta for a hire made at `now`,
    /// clamped so a hire never costs less than 10% or more than 200%.
    pub fn hiring_fraction(&self, now: Days) -> f64 {
        self.hiring_modifiers
            .iter()
            .filter(|m| m.expires_at >= now)
            .map(|m| m.fraction)
            .sum::<f64>()
            .clamp(-0.9, 1.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FinanceState {
    pub money: f64,
    pub monthly_expenses: f64,
    pub monthly_revenue: f64,
    pub burn_rate: f64,
    /// Months; `None` = unbounded.
    pub runway: Option<f64>,
    /// Template-adjusted revenue per salesperson.
    pub revenue_per_sale: f64,
    pub adjustments: Adjustments,
}

impl FinanceState {
    /// Books for a company with no staff yet.
    pub fn initial(money: f64, overhead_floor: f64, revenue_per_sale: f64) -> Self {
        let expenses = monthly_expenses(&[], overhead_floor);
        let burn = burn_rate(expenses, 0.0);
        Self {
            money,
            monthly_expenses: expenses,
            monthly_revenue: 0.0,
            burn_rate: burn,
            runway: runway(money, burn),
            revenue_per_sale,
            adjustments: Adjustments::default(),
        }
    }

    /// Apply a one-off cash delta and refresh runway.
    pub fn with_cash(&self, delta: f64) -> Self {
        let mut next = self.clone();
        next.money += finite(delta);
        next.runway = runway(next.money, next.burn_rate);
        next
    }

    pub fn with_recurring_expense(&self, delta: f64) -> Self {
        let mut next = self.clone();
        next.adjustments.recurring_expense += finite(delta);
        next
    }

    pub fn with_recurring_revenue(&self, delta: f64) -> Self {
        let mut next = self.clone();
        next.adjustments.recurring_revenue += finite(delta);
        next
    }

    pub fn with_hiring_modifier(&self, fraction: f64, now: Days) -> Self {
        let mut next = self.clone();
        next.adjustments.hiring_modifiers.push(HiringModifier {
            fraction: finite(fraction),
            expires_at: now + HIRING_DISCOUNT_DAYS,
        });
        next
    }
}

pub struct FinanceSubsystem {
    overhead_floor: f64,
}

impl FinanceSubsystem {
    pub fn new(overhead_floor: f64) -> Self {
        Self { overhead_floor }
    }

    /// Recompute the derived monthly figures without moving any cash.
    /// Used after player commands so the returned snapshot is consistent.
    pub fn recompute(
        &self,
        prior: &FinanceState,
        team: &TeamState,
        stage: Milestone,
        product_market_fit: f64,
    ) -> FinanceState {
        let mut next = prior.clone();

        let expenses = monthly_expenses(&team.employees, self.overhead_floor)
            + prior.adjustments.recurring_expense;
        next.monthly_expenses = expenses.max(0.0);

        let sales = team.onboarded_count(Role::Sales);
        let marketing = team.onboarded_count(Role::Marketing);
        let earned = revenue(stage, product_market_fit, sales, marketing, prior.revenue_per_sale)
            + prior.adjustments.recurring_revenue;
        next.monthly_revenue = earned.max(0.0);

        next.burn_rate = burn_rate(next.monthly_expenses, next.monthly_revenue);
        next.runway = runway(next.money, next.burn_rate);
        next
    }
}

impl SimSubsystem for FinanceSubsystem {
    type State = FinanceState;

    fn name(&self) -> &'static str { "finance" }

    fn slot(&self) -> SubsystemSlot { SubsystemSlot::Finance }

    fn update(
        &self,
        prior: &FinanceState,
        ctx: &TickContext<'_>,
        _rng: &mut dyn RandomSource,
    ) -> SimResult<Step<FinanceState>> {
        let product = &ctx.state.product;
        let mut next = self.recompute(
            prior,
            &ctx.state.team,
            product.current_milestone,
            product.product_market_fit,
        );

        next.adjustments
            .hiring_modifiers
            .retain(|m| m.expires_at >= ctx.now);

        // Cash moves by the net monthly flow, prorated to the days elapsed.
        let net = next.monthly_revenue - next.monthly_expenses;
        next.money += net * ctx.delta / DAYS_PER_MONTH;
        next.runway = runway(next.money, next.burn_rate);

        let previous = ctx.now - ctx.delta;
        let mut events = Vec::new();
        if ctx.state.clock.crossed_month(previous, ctx.now) {
            log::info!(
                "day={:.1} finance: money={:.0} expenses={:.0} revenue={:.0} runway={:?}",
                ctx.now, next.money, next.monthly_expenses, next.monthly_revenue, next.runway
            );
            events.push(SimEvent::MonthClosed {
                day: ctx.now,
                money: next.money,
                monthly_expenses: next.monthly_expenses,
                monthly_revenue: next.monthly_revenue,
                burn_rate: next.burn_rate,
                runway: next.runway,
            });
        }

        Ok(Step::new(next, events))
    }
}
