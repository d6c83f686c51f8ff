//! Engine error taxonomy.
//!
//! Every error is local and recoverable: it rejects the single offending
//! operation and leaves the game state unchanged (the documented exception
//! being `InsufficientFunds`, which still clears the pending offer).

use thiserror::Error;

/// Errors surfaced by engine operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Operation attempted in the wrong turn-engine state.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// Permit purchase violating a quantity, holding, or funds constraint.
    #[error("invalid trade: {0}")]
    InvalidTrade(String),

    /// Investment accepted without the funds to cover it. The offer is
    /// cleared regardless; the turn is not retried.
    #[error("insufficient funds: need ₹{needed:.0}, have ₹{available:.0}")]
    InsufficientFunds {
        /// Purchase price of the offered equipment.
        needed: f64,
        /// The industry's earnings at the time of the decision.
        available: f64,
    },
}
