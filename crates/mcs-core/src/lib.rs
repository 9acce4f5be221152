//! MCS Core - Shared types for crowd-sensing simulations
//!
//! This crate defines the data model threaded between:
//! - the mobility and task generators
//! - the candidate matcher
//! - the run store and the `mcs-sim` CLI
//!
//! Key types:
//! - SimulationParameters (one immutable set per run)
//! - UserMovementEvent, Task, SimulationResult
//! - Error types

pub mod error;
pub mod types;

pub use error::*;
pub use types::*;
