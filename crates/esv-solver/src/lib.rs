//! Solver boundary for valuation models.
//!
//! This crate owns everything between a populated [`esv_core::ValuationModel`]
//! and a [`SolveOutcome`]: solver identities, in-process LP dispatch, and the
//! JSON-lines protocol spoken with a remote solve-management service.
//!
//! # Architecture
//!
//! ```text
//! ValuationModel ──local──> good_lp backend (in-process)
//!                ──remote─> ModelPayload ──TCP/JSON──> solve service
//!                <─────────────────────── JobReply ───
//! ```
//!
//! Local solves run the Clarabel pure-Rust backend by default; HiGHS is
//! available behind the `solver-highs` feature. The remote path serializes the
//! model into a flat [`protocol::ModelPayload`], submits one request line, and
//! blocks for one reply line under an explicit timeout — an unreachable or
//! silent service surfaces as a typed error instead of a hung call.
//!
//! # Protocol Version
//!
//! The wire protocol is versioned to keep clients and services compatible.
//! Breaking changes increment [`PROTOCOL_VERSION`].

pub mod error;
pub mod local;
pub mod outcome;
pub mod protocol;
pub mod remote;

pub use error::{SolverError, SolverResult};
pub use outcome::{SolveOptions, SolveOutcome, TerminationStatus};
pub use protocol::{JobReply, JobRequest, ModelPayload};
pub use remote::RemoteClient;

use esv_core::ValuationModel;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Protocol version for remote-solve compatibility checking.
/// Increment when making breaking changes to the wire schema.
pub const PROTOCOL_VERSION: i32 = 1;

/// Solver backends a valuation model can be handed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverId {
    /// Clarabel - pure-Rust interior-point solver for conic programs.
    ///
    /// Always available; the default local backend.
    ///
    /// **Algorithm:** Homogeneous self-dual interior-point method
    /// **Reference:** Goulart, P., Chen, Y., & Schwan, M. (2024). Clarabel:
    /// An interior-point solver for conic programs with quadratic objectives.
    /// [github.com/oxfordcontrol/Clarabel.rs](https://github.com/oxfordcontrol/Clarabel.rs)
    Clarabel,

    /// HiGHS - high-performance LP/MIP solver.
    ///
    /// **Algorithm:** Dual revised simplex, interior-point (LP)
    /// **Reference:** Huangfu, Q., & Hall, J. A. J. (2018). Parallelizing the
    /// dual revised simplex method. *Mathematical Programming Computation*,
    /// 10(1), 119-142.
    /// **DOI:** [10.1007/s12532-017-0130-5](https://doi.org/10.1007/s12532-017-0130-5)
    Highs,

    /// CBC - COIN-OR Branch and Cut.
    ///
    /// Not linked in-process; this identity is submitted with remote jobs so
    /// the solve service picks its CBC installation.
    ///
    /// **Algorithm:** Branch-and-cut with LP relaxation
    /// **Reference:** COIN-OR Foundation. [github.com/coin-or/Cbc](https://github.com/coin-or/Cbc)
    Cbc,
}

impl SolverId {
    /// Get the display name for this solver.
    pub fn display_name(&self) -> &'static str {
        match self {
            SolverId::Clarabel => "Clarabel",
            SolverId::Highs => "HiGHS",
            SolverId::Cbc => "CBC",
        }
    }

    /// Get a description of what this solver does.
    pub fn description(&self) -> &'static str {
        match self {
            SolverId::Clarabel => "Conic interior-point (pure Rust)",
            SolverId::Highs => "LP/MIP high-performance",
            SolverId::Cbc => "MIP branch-and-cut (remote jobs)",
        }
    }

    /// Get all known solver IDs.
    pub fn all() -> &'static [SolverId] {
        &[SolverId::Clarabel, SolverId::Highs, SolverId::Cbc]
    }
}

impl std::fmt::Display for SolverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for SolverId {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "clarabel" => Ok(SolverId::Clarabel),
            "highs" => Ok(SolverId::Highs),
            "cbc" => Ok(SolverId::Cbc),
            _ => Err(SolverError::UnknownSolver(s.to_string())),
        }
    }
}

/// Remote solve-service configuration.
///
/// The job solver is the identity submitted with the remote job; it defaults
/// to CBC but is an ordinary field, not a hardcoded constant. The timeout
/// bounds the whole submit-and-wait exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub endpoint: String,
    pub job_solver: SolverId,
    pub timeout: Duration,
}

impl RemoteConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            job_solver: SolverId::Cbc,
            timeout: Duration::from_secs(300),
        }
    }

    pub fn with_job_solver(mut self, solver: SolverId) -> Self {
        self.job_solver = solver;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// The resolved solver choice for a valuation run.
#[derive(Debug, Clone, PartialEq)]
pub enum SolverSpec {
    /// Solve in-process with a local backend.
    Local(SolverId),
    /// Submit to a remote solve-management service.
    Remote(RemoteConfig),
}

impl Default for SolverSpec {
    fn default() -> Self {
        SolverSpec::Local(SolverId::Clarabel)
    }
}

impl std::fmt::Display for SolverSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolverSpec::Local(id) => write!(f, "{}", id),
            SolverSpec::Remote(cfg) => write!(f, "remote({})", cfg.endpoint),
        }
    }
}

/// Solve a populated model with the configured solver.
///
/// This is the single dispatch point used by the optimizer lifecycle. A
/// solver that runs but terminates non-optimal returns an `Ok` outcome with
/// that status; transport and configuration failures return `Err`.
pub fn solve(
    model: &ValuationModel,
    spec: &SolverSpec,
    options: &SolveOptions,
) -> SolverResult<SolveOutcome> {
    match spec {
        SolverSpec::Local(id) => local::solve_local(model, *id, options),
        SolverSpec::Remote(cfg) => remote::solve_remote(model, cfg, options),
    }
}

/// Solver IDs usable in-process in this build.
pub fn available_backends() -> Vec<SolverId> {
    let mut backends = vec![SolverId::Clarabel];
    #[cfg(feature = "solver-highs")]
    backends.push(SolverId::Highs);
    backends
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn solver_id_parsing() {
        assert_eq!(SolverId::from_str("clarabel").unwrap(), SolverId::Clarabel);
        assert_eq!(SolverId::from_str("CBC").unwrap(), SolverId::Cbc);
        assert!(matches!(
            SolverId::from_str("glpk"),
            Err(SolverError::UnknownSolver(_))
        ));
    }

    #[test]
    fn default_spec_is_local_clarabel() {
        assert_eq!(SolverSpec::default(), SolverSpec::Local(SolverId::Clarabel));
    }

    #[test]
    fn remote_config_builder() {
        let cfg = RemoteConfig::new("solve.example.org:7421")
            .with_job_solver(SolverId::Highs)
            .with_timeout(Duration::from_secs(30));
        assert_eq!(cfg.job_solver, SolverId::Highs);
        assert_eq!(cfg.timeout, Duration::from_secs(30));
    }

    #[test]
    fn clarabel_always_available() {
        assert!(available_backends().contains(&SolverId::Clarabel));
    }
}
