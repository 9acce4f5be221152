//! MCS Simulation Engine
//!
//! Crowd-sensing simulator: synthetic users random-walk around a city,
//! sensing tasks are scattered over the same area and time window, and
//! every task is matched against the users that were close enough while
//! it was open.
//!
//! ```text
//! SimulationParameters
//!   └─► mobility   (random walk per user)
//!         └─► tasks      (uniform over the movement bounding box)
//!               └─► matcher    (time window, then distance, distinct users)
//!                     └─► store      (best-effort text tables)
//! ```
//!
//! [`session::SimulationSession`] owns a run and drives the phases in order.

pub mod config;
pub mod error;
pub mod geo;
pub mod matcher;
pub mod mobility;
#[cfg(feature = "async")]
pub mod runner;
pub mod session;
pub mod store;
pub mod tasks;

pub use config::{GeneratorConfig, SimulationWindow};
pub use error::{PersistenceError, StoreResult};
pub use geo::distance_meters;
pub use matcher::{CandidateMatcher, compute_candidates};
pub use session::{RunState, SessionBuilder, SimulationSession};
pub use store::{RunId, RunStore, SavedRun};

pub use mcs_core::{
    LocomotionType, McsError, PlatformType, Result, SimulationParameters, SimulationResult, Task,
    UserMovementEvent,
};
