//! Error types for the valuation optimizer lifecycle.

use crate::optimizer::LifecycleStage;
use esv_core::{ModelError, ParamKind};
use esv_solver::{SolverError, TerminationStatus};
use thiserror::Error;

/// Errors surfaced by the optimizer lifecycle and its concrete variants.
///
/// A non-optimal termination is the same [`SolveFailed`](Self::SolveFailed)
/// error from every entry point; callers branch on the variant, not on which
/// method happened to raise it.
#[derive(Debug, Error)]
pub enum ValuationError {
    /// The solver ran but did not terminate optimal.
    #[error("solver terminated with {status} status; no results were produced")]
    SolveFailed { status: TerminationStatus },

    /// Results were requested before a successful solve.
    #[error("results requested before a successful solve")]
    ResultsNotReady,

    /// A parameter override named something outside the variant's schema.
    #[error("unknown model parameter '{name}'")]
    UnknownParameter { name: String },

    /// A parameter override carried a value of the wrong kind.
    #[error("model parameter '{name}' expects a {expected} value")]
    ParameterKind { name: String, expected: ParamKind },

    /// An operation arrived out of lifecycle order.
    #[error("{operation} is not valid in the {stage} stage")]
    Lifecycle {
        operation: &'static str,
        stage: LifecycleStage,
    },

    /// Solver dispatch or transport failure.
    #[error(transparent)]
    Solver(#[from] SolverError),

    /// Model construction or access failure.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Results table assembly failure.
    #[error("results assembly failed: {0}")]
    Results(#[from] polars::prelude::PolarsError),
}

/// Result type alias for lifecycle operations.
pub type ValuationResult<T> = Result<T, ValuationError>;
