//! Error types shared by every engine operation.

use thiserror::Error;

/// Convenience alias used throughout the engine.
pub type Result<T> = std::result::Result<T, DuffingError>;

/// Reasons a simulation request cannot produce numeric output.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DuffingError {
    /// The computation needs a forcing period but the forcing frequency is zero.
    #[error("{operation} unavailable: forcing frequency is zero, so there is no forcing period")]
    DegenerateParameter {
        /// Name of the computation that was requested.
        operation: &'static str,
    },

    /// The integrator could not produce a finite solution.
    #[error("Numerical divergence at t = {t}: {reason}")]
    NumericalDivergence {
        /// Time at which the integrator gave up.
        t: f64,
        /// What went wrong.
        reason: String,
    },

    /// Output times are not usable as an integration grid.
    #[error("Invalid time grid: {message}")]
    InvalidTimeGrid {
        /// Description of the problem.
        message: String,
    },

    /// A network needs at least one oscillator.
    #[error("Network must contain at least one oscillator")]
    InvalidNetworkSize,

    /// State vector length differs from the system dimension.
    #[error("Dimension mismatch: expected {expected}, actual {actual}")]
    DimensionMismatch {
        /// Dimension of the system.
        expected: usize,
        /// Length of the provided state.
        actual: usize,
    },
}

impl DuffingError {
    pub fn unforced(operation: &'static str) -> Self {
        Self::DegenerateParameter { operation }
    }

    pub fn divergence(t: f64, reason: impl Into<String>) -> Self {
        Self::NumericalDivergence {
            t,
            reason: reason.into(),
        }
    }

    pub fn invalid_grid(message: impl Into<String>) -> Self {
        Self::InvalidTimeGrid {
            message: message.into(),
        }
    }

    /// True for the "unavailable" outcome callers render as an annotation.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::DegenerateParameter { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failure() {
        let err = DuffingError::unforced("Poincare section");
        assert!(err.is_unavailable());
        assert!(err.to_string().starts_with("Poincare section unavailable"));

        let err = DuffingError::divergence(3.5, "non-finite state");
        assert!(!err.is_unavailable());
        assert_eq!(
            err.to_string(),
            "Numerical divergence at t = 3.5: non-finite state"
        );

        let err = DuffingError::DimensionMismatch {
            expected: 2,
            actual: 3,
        };
        assert_eq!(err.to_string(), "Dimension mismatch: expected 2, actual 3");
    }
}
