//! Wire types for the remote solve-management service.
//!
//! One JSON request line in, one JSON reply line out. The model travels as a
//! flat [`ModelPayload`] built from the domain model, not as the domain model
//! itself, so the wire schema can stay stable while the model type evolves.

use crate::error::{SolverError, SolverResult};
use crate::outcome::{SolveOutcome, TerminationStatus};
use crate::{SolverId, PROTOCOL_VERSION};
use esv_core::{ModelError, Relation, Sense, ValuationModel};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// JSON cannot carry infinities, so unbounded columns are clamped to this on
/// the wire.
const WIRE_BOUND: f64 = 1e12;

/// A sparse linear expression in wire form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireExpr {
    /// Column positions of the terms.
    pub vars: Vec<usize>,
    /// Coefficients, parallel to `vars`.
    pub coefs: Vec<f64>,
    pub constant: f64,
}

impl WireExpr {
    fn from_expr(expr: &esv_core::LinExpr) -> Self {
        let mut vars = Vec::with_capacity(expr.terms().len());
        let mut coefs = Vec::with_capacity(expr.terms().len());
        for (var, coef) in expr.terms() {
            vars.push(var.index());
            coefs.push(*coef);
        }
        Self {
            vars,
            coefs,
            constant: expr.constant_term(),
        }
    }
}

/// One decision-variable column in wire form, bounds clamped finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireColumn {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
}

/// One constraint row in wire form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireRow {
    pub name: String,
    pub expr: WireExpr,
    pub relation: Relation,
    pub rhs: f64,
}

/// Flat, self-contained description of one linear program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPayload {
    pub columns: Vec<WireColumn>,
    pub rows: Vec<WireRow>,
    pub sense: Sense,
    pub objective: WireExpr,
}

impl ModelPayload {
    /// Build the wire payload from a populated model.
    pub fn from_model(model: &ValuationModel) -> SolverResult<Self> {
        let (sense, objective) = model
            .objective()
            .ok_or(SolverError::InvalidModel(ModelError::MissingObjective))?;

        let columns = model
            .columns()
            .iter()
            .map(|column| WireColumn {
                name: column.name.clone(),
                lower: clamp_bound(column.lower),
                upper: clamp_bound(column.upper),
            })
            .collect();

        let rows = model
            .rows()
            .iter()
            .map(|row| WireRow {
                name: row.name.clone(),
                expr: WireExpr::from_expr(&row.expr),
                relation: row.relation,
                rhs: row.rhs,
            })
            .collect();

        Ok(Self {
            columns,
            rows,
            sense,
            objective: WireExpr::from_expr(objective),
        })
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }
}

fn clamp_bound(bound: f64) -> f64 {
    if bound.is_finite() {
        bound
    } else if bound.is_sign_negative() {
        -WIRE_BOUND
    } else {
        WIRE_BOUND
    }
}

/// A job submission to the remote solve-management service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRequest {
    pub protocol_version: i32,
    /// Solver identity the service should run the job with.
    pub solver: SolverId,
    /// Wall-clock budget the service should grant the job.
    pub timeout_seconds: u64,
    /// Ask the service to retain solver trace output with the job record.
    pub verbose: bool,
    pub model: ModelPayload,
}

impl JobRequest {
    pub fn new(
        model: &ValuationModel,
        solver: SolverId,
        timeout: Duration,
        verbose: bool,
    ) -> SolverResult<Self> {
        Ok(Self {
            protocol_version: PROTOCOL_VERSION,
            solver,
            timeout_seconds: timeout.as_secs(),
            verbose,
            model: ModelPayload::from_model(model)?,
        })
    }
}

/// The service's reply to one job submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReply {
    pub protocol_version: i32,
    pub status: TerminationStatus,
    pub objective: f64,
    pub solve_time_ms: u64,
    /// Per-column values, in submission order; empty unless optimal.
    #[serde(default)]
    pub values: Vec<f64>,
    #[serde(default)]
    pub message: Option<String>,
}

impl JobReply {
    /// Reject replies from an incompatible service version.
    pub fn check_protocol(&self) -> SolverResult<()> {
        if self.protocol_version != PROTOCOL_VERSION {
            return Err(SolverError::Protocol(format!(
                "service speaks protocol v{}, this client expects v{}",
                self.protocol_version, PROTOCOL_VERSION
            )));
        }
        Ok(())
    }

    pub fn into_outcome(self) -> SolveOutcome {
        if self.status.is_success() {
            SolveOutcome::optimal(self.objective, self.values, self.solve_time_ms)
        } else {
            SolveOutcome::failed(self.status, self.solve_time_ms, self.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use esv_core::LinExpr;

    fn sample_model() -> ValuationModel {
        let mut model = ValuationModel::new();
        let x = model.add_variable("x", 0.0, f64::INFINITY);
        model.constrain("floor", LinExpr::from(x), Relation::Ge, 1.0);
        model.minimize(LinExpr::from(x));
        model
    }

    #[test]
    fn payload_clamps_infinite_bounds() {
        let payload = ModelPayload::from_model(&sample_model()).unwrap();
        assert_eq!(payload.columns[0].lower, 0.0);
        assert_eq!(payload.columns[0].upper, WIRE_BOUND);
    }

    #[test]
    fn request_round_trips_through_json() {
        let request = JobRequest::new(
            &sample_model(),
            SolverId::Cbc,
            Duration::from_secs(60),
            true,
        )
        .unwrap();

        let line = serde_json::to_string(&request).unwrap();
        let back: JobRequest = serde_json::from_str(&line).unwrap();
        assert_eq!(back.protocol_version, PROTOCOL_VERSION);
        assert_eq!(back.solver, SolverId::Cbc);
        assert_eq!(back.timeout_seconds, 60);
        assert_eq!(back.model, request.model);
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let reply = JobReply {
            protocol_version: PROTOCOL_VERSION + 1,
            status: TerminationStatus::Optimal,
            objective: 0.0,
            solve_time_ms: 0,
            values: Vec::new(),
            message: None,
        };
        assert!(matches!(
            reply.check_protocol(),
            Err(SolverError::Protocol(_))
        ));
    }

    #[test]
    fn non_optimal_reply_becomes_failed_outcome() {
        let reply = JobReply {
            protocol_version: PROTOCOL_VERSION,
            status: TerminationStatus::Infeasible,
            objective: 0.0,
            solve_time_ms: 7,
            values: Vec::new(),
            message: Some("no feasible point".to_string()),
        };
        let outcome = reply.into_outcome();
        assert_eq!(outcome.status, TerminationStatus::Infeasible);
        assert_eq!(outcome.message.as_deref(), Some("no feasible point"));
    }
}
