use serde::{Deserialize, Serialize};
use crate::{
    clock::GameSpeed,
    funding_subsystem::RoundType,
    types::{Days, EntityId, RunId},
};

/// All player-issued commands.
/// Variants are appended — never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum PlayerCommand {
    // ── Clock control ─────────────────────────────
    Pause,
    Resume,
    SetSpeed { speed: GameSpeed },

    // ── Team ──────────────────────────────────────
    Hire { candidate_id: EntityId },
    Fire { employee_id: EntityId },
    /// External onboarding trigger; the configured delay also completes it.
    CompleteOnboarding { employee_id: EntityId },

    // ── Product ───────────────────────────────────
    PrioritizeFeature { feature_id: EntityId, priority: i64 },

    // ── Funding ───────────────────────────────────
    StartFundraising {
        round_type: RoundType,
        /// Overrides the drawn investor interest when present.
        #[serde(default)]
        investor_interest: Option<f64>,
    },
    AcceptFundingOffer { offer_id: EntityId },

    // ── Narrative events ──────────────────────────
    RespondToEvent { event_id: EntityId, option_id: String },
}

impl PlayerCommand {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Pause                   => "pause",
            Self::Resume                  => "resume",
            Self::SetSpeed { .. }         => "set_speed",
            Self::Hire { .. }             => "hire",
            Self::Fire { .. }             => "fire",
            Self::CompleteOnboarding { .. } => "complete_onboarding",
            Self::PrioritizeFeature { .. } => "prioritize_feature",
            Self::StartFundraising { .. } => "start_fundraising",
            Self::AcceptFundingOffer { .. } => "accept_funding_offer",
            Self::RespondToEvent { .. }   => "respond_to_event",
        }
    }
}

/// A queued player command with its submission time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedCommand {
    pub run_id:     RunId,
    pub queued_at:  Days,
    pub command_id: String,
    pub command:    PlayerCommand,
}
