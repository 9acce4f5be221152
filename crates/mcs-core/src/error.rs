//! Error types for crowd-sensing simulations

use thiserror::Error;

/// Simulation result type
pub type Result<T> = std::result::Result<T, McsError>;

/// Errors raised by the simulation phases
#[derive(Error, Debug, Clone, PartialEq)]
pub enum McsError {
    /// Parameters failed validation or could not be parsed
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// Mobility or task synthesis failed; nothing was published
    #[error("Generation failed: {0}")]
    Generation(String),

    /// A phase was requested before its predecessor succeeded
    #[error("Phase order violation: {0}")]
    PhaseOrder(String),

    /// Candidate matching hit malformed input; no results were published
    #[error("Computation failed: {0}")]
    Computation(String),
}

impl McsError {
    /// Create an invalid-parameters error
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParameters(msg.into())
    }

    /// Create a generation error
    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    /// Create a phase-order error
    pub fn phase_order(msg: impl Into<String>) -> Self {
        Self::PhaseOrder(msg.into())
    }

    /// Create a computation error
    pub fn computation(msg: impl Into<String>) -> Self {
        Self::Computation(msg.into())
    }
}
