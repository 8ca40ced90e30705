//! The simulation journal — a typed record of everything that changed.
//!
//! RULE: Every state change a subsystem or player command makes is
//! announced as a SimEvent. The engine appends them to the in-memory
//! event log in emission order, one TickStarted/TickCompleted pair per tick.
//!
//! These are journal entries, not the narrative GameEvents the player
//! responds to (see narrative_subsystem).

use crate::{
    funding_subsystem::RoundType,
    narrative_subsystem::EventType,
    product_subsystem::Milestone,
    team_subsystem::Role,
    types::{Days, EntityId, RunId},
};
use serde::{Deserialize, Serialize};

/// Every event emitted during simulation.
/// Variants are appended — never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    // ── Engine events ──────────────────────────────
    TickStarted {
        day: Days,
    },
    TickCompleted {
        day: Days,
    },
    RunInitialized {
        run_id: RunId,
        seed: u64,
    },
    ProductSelected {
        template_id: String,
        feature_count: usize,
    },
    GameOver {
        day: Days,
        reason: String,
    },

    // ── Player command events ──────────────────────
    PlayerCommandReceived {
        day: Days,
        command_type: String,
    },
    CommandRejected {
        day: Days,
        command_type: String,
        reason: String,
    },

    // ── Team events ────────────────────────────────
    EmployeeHired {
        day: Days,
        employee_id: EntityId,
        role: Role,
        salary: f64,
    },
    EmployeeFired {
        day: Days,
        employee_id: EntityId,
    },
    EmployeeOnboarded {
        day: Days,
        employee_id: EntityId,
    },
    CandidatesAdded {
        day: Days,
        count: usize,
    },

    // ── Product events ─────────────────────────────
    FeatureReprioritized {
        day: Days,
        feature_id: EntityId,
        priority: u32,
    },
    FeatureCompleted {
        day: Days,
        feature_id: EntityId,
    },
    MilestoneReached {
        day: Days,
        from: Milestone,
        to: Milestone,
    },

    // ── Finance events ─────────────────────────────
    MonthClosed {
        day: Days,
        money: f64,
        monthly_expenses: f64,
        monthly_revenue: f64,
        burn_rate: f64,
        runway: Option<f64>,
    },

    // ── Funding events ─────────────────────────────
    FundraisingStarted {
        day: Days,
        round_id: EntityId,
        round_type: RoundType,
        investor_interest: f64,
    },
    FundingOfferReceived {
        day: Days,
        round_id: EntityId,
        offer_id: EntityId,
        amount: f64,
        equity_percent: f64,
        valuation: f64,
    },
    FundingOfferExpired {
        day: Days,
        round_id: EntityId,
        offer_id: EntityId,
    },
    RoundCompleted {
        day: Days,
        round_id: EntityId,
        amount: f64,
        equity_percent: f64,
    },
    RoundFailed {
        day: Days,
        round_id: EntityId,
    },

    // ── Narrative events ───────────────────────────
    NarrativeEventTriggered {
        day: Days,
        event_id: EntityId,
        category: EventType,
        title: String,
    },
    NarrativeEventExpired {
        day: Days,
        event_id: EntityId,
    },
    NarrativeEventResolved {
        day: Days,
        event_id: EntityId,
        option_id: String,
    },
}

impl SimEvent {
    /// Stable string name for the variant. Used for the event_type column
    /// of the log.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::TickStarted { .. }             => "tick_started",
            Self::TickCompleted { .. }           => "tick_completed",
            Self::RunInitialized { .. }          => "run_initialized",
            Self::ProductSelected { .. }         => "product_selected",
            Self::GameOver { .. }                => "game_over",
            Self::PlayerCommandReceived { .. }   => "player_command_received",
            Self::CommandRejected { .. }         => "command_rejected",
            Self::EmployeeHired { .. }           => "employee_hired",
            Self::EmployeeFired { .. }           => "employee_fired",
            Self::EmployeeOnboarded { .. }       => "employee_onboarded",
            Self::CandidatesAdded { .. }         => "candidates_added",
            Self::FeatureReprioritized { .. }    => "feature_reprioritized",
            Self::FeatureCompleted { .. }        => "feature_completed",
            Self::MilestoneReached { .. }        => "milestone_reached",
            Self::MonthClosed { .. }             => "month_closed",
            Self::FundraisingStarted { .. }      => "fundraising_started",
            Self::FundingOfferReceived { .. }    => "funding_offer_received",
            Self::FundingOfferExpired { .. }     => "funding_offer_expired",
            Self::RoundCompleted { .. }          => "round_completed",
            Self::RoundFailed { .. }             => "round_failed",
            Self::NarrativeEventTriggered { .. } => "narrative_event_triggered",
            Self::NarrativeEventExpired { .. }   => "narrative_event_expired",
            Self::NarrativeEventResolved { .. }  => "narrative_event_resolved",
        }
    }
}

/// One entry of the in-memory event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub seq: u64,
    pub run_id: RunId,
    pub day: Days,
    pub subsystem: String,
    pub event_type: String,
    pub payload: String, // JSON-serialized SimEvent
}
