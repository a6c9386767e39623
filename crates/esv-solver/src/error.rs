//! Error types for solver dispatch and remote communication.

use thiserror::Error;

/// Errors that can occur while dispatching a solve.
#[derive(Debug, Error)]
pub enum SolverError {
    /// Unknown solver ID.
    #[error("unknown solver: {0}")]
    UnknownSolver(String),

    /// The solver cannot run in-process in this build.
    #[error("solver {solver} is not usable locally: {hint}")]
    BackendUnavailable {
        solver: crate::SolverId,
        hint: String,
    },

    /// The remote solving service could not be reached.
    #[error("remote solving service at {endpoint} is unavailable: {source}")]
    Unavailable {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    /// Timed out waiting for the solver.
    #[error("solver timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// The remote service broke the wire contract.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The model is not in a solvable state.
    #[error("invalid model: {0}")]
    InvalidModel(#[from] esv_core::ModelError),

    /// Wire serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic IO error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for solver operations.
pub type SolverResult<T> = Result<T, SolverError>;
