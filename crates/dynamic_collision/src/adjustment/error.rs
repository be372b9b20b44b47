//! Adjustment failures
//!
//! None of these are fatal. Every public operation of the handler catches
//! them, logs them and carries on; the next tick simply tries again.

use crate::physics::{CloneError, HullError, ShapeQueryError};

/// Reasons an adjustment did not happen
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum AdjustError {
    /// Something the adjustment needs is not loaded
    #[error("{0} unavailable")]
    Unavailable(&'static str),

    /// The adjustment does not apply to this controller
    #[error("not applicable: {0}")]
    NotApplicable(&'static str),

    /// Live shape layout differs from the captured snapshot
    #[error("topology mismatch: expected {expected}, found {found}")]
    TopologyMismatch {
        /// Count captured at setup
        expected: usize,
        /// Count found now
        found: usize,
    },

    /// Shape introspection failed
    #[error(transparent)]
    ShapeQuery(#[from] ShapeQueryError),

    /// Hull rebuild failed
    #[error(transparent)]
    Hull(#[from] HullError),

    /// Creature shape clone failed
    #[error(transparent)]
    Clone(#[from] CloneError),
}

impl AdjustError {
    /// Whether this is an expected skip rather than a sign of broken data
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::NotApplicable(_))
    }
}

/// Result type for adjustment operations
pub type AdjustResult<T = ()> = Result<T, AdjustError>;
