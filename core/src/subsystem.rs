//! Subsystem trait.
//!
//! RULE: Every subsystem implements SimSubsystem.
//! A subsystem owns exactly one slice of GameState and computes the
//! next value of that slice from the prior one. It never writes to
//! another subsystem's slice; cross-slice effects are routed by the engine.
//! Execution order is fixed and documented in engine.rs.

use crate::{
    error::SimResult,
    event::SimEvent,
    rng::{RandomSource, SubsystemSlot},
    snapshot::GameState,
    types::Days,
};

/// Read-only view of the tick in progress.
///
/// `state` is the working snapshot: slices owned by subsystems that
/// already ran this tick hold their new values, later slices still
/// hold the prior tick's values.
pub struct TickContext<'a> {
    /// Elapsed days after this tick's advance.
    pub now:   Days,
    /// Days advanced by this tick.
    pub delta: Days,
    pub state: &'a GameState,
}

/// The next value of a subsystem's slice plus the journal entries it produced.
#[derive(Debug)]
pub struct Step<S> {
    pub state:  S,
    pub events: Vec<SimEvent>,
}

impl<S> Step<S> {
    pub fn new(state: S, events: Vec<SimEvent>) -> Self {
        Self { state, events }
    }

    pub fn quiet(state: S) -> Self {
        Self { state, events: Vec::new() }
    }
}

/// The contract every subsystem must fulfill.
pub trait SimSubsystem: Send {
    /// The slice of GameState this subsystem owns.
    type State;

    /// Unique stable name for this subsystem.
    fn name(&self) -> &'static str;

    /// RNG stream this subsystem draws from.
    fn slot(&self) -> SubsystemSlot;

    /// Called once per tick by the engine. Must not mutate `prior`.
    fn update(
        &self,
        prior: &Self::State,
        ctx: &TickContext<'_>,
        rng: &mut dyn RandomSource,
    ) -> SimResult<Step<Self::State>>;
}
