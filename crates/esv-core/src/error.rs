//! Error types for model construction and access.

use crate::params::ParamKind;
use thiserror::Error;

/// Errors raised while building or reading a [`crate::ValuationModel`].
#[derive(Debug, Error)]
pub enum ModelError {
    /// A parameter was read before any value was assigned.
    #[error("model parameter '{0}' has not been set")]
    MissingParam(String),

    /// A parameter holds a value of the wrong kind.
    #[error("model parameter '{name}' is a {found} value, expected {expected}")]
    ParamKind {
        name: String,
        expected: ParamKind,
        found: ParamKind,
    },

    /// A series parameter does not span the model horizon.
    #[error("series parameter '{name}' has {found} entries, expected {expected}")]
    SeriesLength {
        name: String,
        expected: usize,
        found: usize,
    },

    /// The time horizon was empty or unset when it was needed.
    #[error("time horizon must contain at least one period")]
    EmptyHorizon,

    /// The model was handed to a solver without an objective.
    #[error("objective has not been set")]
    MissingObjective,
}
