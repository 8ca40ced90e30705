//! The game snapshot — complete simulation state as one immutable value.
//!
//! The engine never mutates a published snapshot. Each tick or command
//! builds a new `GameState` and swaps it in whole, so readers holding an
//! `Arc<GameState>` always see a consistent picture.

use crate::{
    clock::{GameSpeed, SimClock},
    config::GameConfig,
    error::SimResult,
    finance_subsystem::FinanceState,
    funding_subsystem::FundingState,
    narrative_subsystem::EventState,
    product_subsystem::ProductState,
    team_subsystem::TeamState,
    types::{Days, RunId},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub run_id: RunId,
    /// Money, burn, runway and the monthly figures sit at the top level.
    #[serde(flatten)]
    pub finance: FinanceState,
    pub clock: SimClock,
    pub team: TeamState,
    pub product: ProductState,
    pub funding: FundingState,
    pub events: EventState,
    pub game_over: bool,
    pub game_over_reason: Option<String>,
}

impl GameState {
    /// Starting position: no staff, no product, untouched cap table.
    pub fn new(run_id: RunId, config: &GameConfig) -> Self {
        Self {
            run_id,
            finance: FinanceState::initial(
                config.starting_money,
                config.overhead_floor,
                config.base_revenue_per_sale,
            ),
            clock: SimClock::new(config.start_date),
            team: TeamState::default(),
            product: ProductState::default(),
            funding: FundingState::default(),
            events: EventState::default(),
            game_over: false,
            game_over_reason: None,
        }
    }

    pub fn current_time(&self) -> Days {
        self.clock.current_time
    }

    pub fn is_paused(&self) -> bool {
        self.clock.paused
    }

    pub fn game_speed(&self) -> GameSpeed {
        self.clock.speed
    }

    pub fn money(&self) -> f64 {
        self.finance.money
    }

    pub fn runway(&self) -> Option<f64> {
        self.finance.runway
    }

    pub fn has_product(&self) -> bool {
        self.product.product_template_id.is_some()
    }

    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> SimResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
