//! Simulation error definitions.
//!
//! Every failure the engine can report is local and recoverable: the caller
//! re-issues a corrected command and the prior state is left intact. There
//! are no fatal error paths.

use thiserror::Error;

/// Errors surfaced by the simulation engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    /// The requested configuration violates a structural invariant
    /// (non-power-of-two sizes, associativity not dividing the line count,
    /// negative tag width). Raised synchronously from `configure`/`set_mode`;
    /// the change is rejected and the previous configuration kept.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Which invariant was violated.
        reason: String,
    },

    /// The address fed into the parse phase is not a binary numeral that
    /// fits the configured address width. The pipeline cursor is left
    /// unadvanced and no history entry is recorded.
    #[error("invalid address {address:?}: {reason}")]
    InvalidAddress {
        /// The offending input string.
        address: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl SimError {
    /// Shorthand constructor for configuration errors.
    pub(crate) fn config(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    /// Shorthand constructor for address errors.
    pub(crate) fn address(address: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAddress {
            address: address.into(),
            reason: reason.into(),
        }
    }
}
