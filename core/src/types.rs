//! Shared primitive types used across the entire simulation.

/// In-game time in days elapsed since the run started.
/// Fractional values are allowed; the driver may advance by partial days.
pub type Days = f64;

/// A stable, unique identifier for any entity in the simulation.
pub type EntityId = String;

/// The canonical run identifier.
pub type RunId = String;

/// Days in one accounting month. Monthly figures are prorated by this.
pub const DAYS_PER_MONTH: Days = 30.0;
