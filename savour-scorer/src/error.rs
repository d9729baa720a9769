//! Error types raised while configuring the smart-score combiner.

use thiserror::Error;

/// Errors raised when smart-score weights fail validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeightsError {
    /// A weight was negative or not finite.
    #[error("weight {name} must be finite and non-negative, got {value}")]
    InvalidWeight {
        /// Component the weight applies to.
        name: &'static str,
        /// Rejected value.
        value: f32,
    },
    /// The weights did not sum to one.
    #[error("weights must sum to 1, got {sum}")]
    BadTotal {
        /// Observed total.
        sum: f64,
    },
}
