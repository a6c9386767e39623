//! Solve outcomes: termination status and extracted variable values.

use esv_core::{VarId, VarVec};
use serde::{Deserialize, Serialize};

/// The solver's verdict on a solve attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationStatus {
    /// Optimal solution found.
    Optimal,
    /// Problem is infeasible.
    Infeasible,
    /// Problem is unbounded.
    Unbounded,
    /// Solver timed out.
    Timeout,
    /// Solver reported an error.
    Error,
    /// Status unknown.
    Unknown,
}

impl TerminationStatus {
    /// Check if this status represents a successful solve.
    pub fn is_success(&self) -> bool {
        matches!(self, TerminationStatus::Optimal)
    }

    /// Check if this status represents a failure.
    pub fn is_failure(&self) -> bool {
        !self.is_success() && !matches!(self, TerminationStatus::Unknown)
    }
}

impl std::fmt::Display for TerminationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminationStatus::Optimal => write!(f, "optimal"),
            TerminationStatus::Infeasible => write!(f, "infeasible"),
            TerminationStatus::Unbounded => write!(f, "unbounded"),
            TerminationStatus::Timeout => write!(f, "timeout"),
            TerminationStatus::Error => write!(f, "error"),
            TerminationStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// Per-solve options set by the caller.
#[derive(Debug, Clone, Default)]
pub struct SolveOptions {
    /// Emit solve progress at info level instead of debug.
    pub verbose: bool,
}

impl SolveOptions {
    /// Options for a quiet solve (trace suppressed).
    pub fn quiet() -> Self {
        Self { verbose: false }
    }

    /// Options for a verbose solve.
    pub fn verbose() -> Self {
        Self { verbose: true }
    }
}

/// Result of one solve attempt.
///
/// Variable values are stored as a flat per-column vector in declaration
/// order; they are present only when the termination status is optimal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveOutcome {
    /// Termination status reported by the solver.
    pub status: TerminationStatus,
    /// Objective value (meaningless unless optimal).
    pub objective: f64,
    /// Solve time in milliseconds.
    pub solve_time_ms: u64,
    /// Solver message (populated on failures).
    pub message: Option<String>,
    values: Vec<f64>,
}

impl SolveOutcome {
    /// An optimal outcome carrying the full value vector.
    pub fn optimal(objective: f64, values: Vec<f64>, solve_time_ms: u64) -> Self {
        Self {
            status: TerminationStatus::Optimal,
            objective,
            solve_time_ms,
            message: None,
            values,
        }
    }

    /// A failed outcome with no values.
    pub fn failed(status: TerminationStatus, solve_time_ms: u64, message: Option<String>) -> Self {
        Self {
            status,
            objective: 0.0,
            solve_time_ms,
            message,
            values: Vec::new(),
        }
    }

    /// Check if the outcome is optimal.
    pub fn is_optimal(&self) -> bool {
        self.status.is_success()
    }

    /// Value of a single variable.
    pub fn value(&self, var: VarId) -> f64 {
        self.values.get(var.index()).copied().unwrap_or(0.0)
    }

    /// Values of a per-period variable block, in period order.
    pub fn series(&self, vars: &VarVec) -> Vec<f64> {
        vars.iter().map(|var| self.value(var)).collect()
    }

    /// The raw per-column value vector.
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}
