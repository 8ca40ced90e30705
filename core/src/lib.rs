//! Runway — a deterministic startup-lifecycle simulation.
//!
//! The engine advances a single `GameState` snapshot through fixed-order
//! subsystems (team, product, finance, funding, narrative) and records
//! every change in a typed journal. See `engine` for the tick order.

pub mod clock;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod finance_subsystem;
pub mod funding_subsystem;
pub mod name_generator;
pub mod narrative_subsystem;
pub mod product_subsystem;
pub mod rng;
pub mod snapshot;
pub mod subsystem;
pub mod team_subsystem;
pub mod types;
