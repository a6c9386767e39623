//! In-process LP dispatch via good_lp backends.
//!
//! Lowers a [`ValuationModel`] into a good_lp problem and solves it with the
//! selected backend. Infeasible and unbounded resolutions come back as
//! non-optimal [`SolveOutcome`]s rather than transport errors, so the
//! lifecycle layer classifies every termination the same way.

use crate::error::{SolverError, SolverResult};
use crate::outcome::{SolveOptions, SolveOutcome, TerminationStatus};
use crate::SolverId;
use esv_core::{LinExpr, ModelError, Relation, Sense, ValuationModel};
use good_lp::{
    constraint, variable, variables, Expression, ResolutionError, Solution, SolverModel, Variable,
};
use std::time::Instant;
use tracing::{debug, info};

/// Solve a model with a locally linked backend.
pub fn solve_local(
    model: &ValuationModel,
    id: SolverId,
    options: &SolveOptions,
) -> SolverResult<SolveOutcome> {
    if options.verbose {
        info!(
            solver = %id,
            columns = model.num_columns(),
            rows = model.num_rows(),
            "solving valuation model"
        );
    } else {
        debug!(
            solver = %id,
            columns = model.num_columns(),
            rows = model.num_rows(),
            "solving valuation model"
        );
    }

    match id {
        SolverId::Clarabel => solve_clarabel(model, options),
        #[cfg(feature = "solver-highs")]
        SolverId::Highs => solve_highs(model, options),
        #[cfg(not(feature = "solver-highs"))]
        SolverId::Highs => Err(SolverError::BackendUnavailable {
            solver: id,
            hint: "build with the solver-highs feature".to_string(),
        }),
        SolverId::Cbc => Err(SolverError::BackendUnavailable {
            solver: id,
            hint: "CBC is a remote job solver; configure a remote endpoint".to_string(),
        }),
    }
}

fn solve_clarabel(model: &ValuationModel, options: &SolveOptions) -> SolverResult<SolveOutcome> {
    use good_lp::solvers::clarabel::clarabel;

    let started = Instant::now();
    let (sense, objective, vars, handles) = lower_columns(model)?;
    let objective_expr = lower_expr(objective, &handles);

    let mut problem = match sense {
        Sense::Minimize => vars.minimise(objective_expr),
        Sense::Maximize => vars.maximise(objective_expr),
    }
    .using(clarabel);

    for row in model.rows() {
        let lhs = lower_expr(&row.expr, &handles);
        problem = problem.with(match row.relation {
            Relation::Le => constraint!(lhs <= row.rhs),
            Relation::Ge => constraint!(lhs >= row.rhs),
            Relation::Eq => constraint!(lhs == row.rhs),
        });
    }

    match problem.solve() {
        Ok(solution) => Ok(extract(&solution, &handles, objective, started, options)),
        Err(err) => Ok(failure_outcome(err, started)),
    }
}

#[cfg(feature = "solver-highs")]
fn solve_highs(model: &ValuationModel, options: &SolveOptions) -> SolverResult<SolveOutcome> {
    use good_lp::solvers::highs::highs;

    let started = Instant::now();
    let (sense, objective, vars, handles) = lower_columns(model)?;
    let objective_expr = lower_expr(objective, &handles);

    let mut problem = match sense {
        Sense::Minimize => vars.minimise(objective_expr),
        Sense::Maximize => vars.maximise(objective_expr),
    }
    .using(highs);

    for row in model.rows() {
        let lhs = lower_expr(&row.expr, &handles);
        problem = problem.with(match row.relation {
            Relation::Le => constraint!(lhs <= row.rhs),
            Relation::Ge => constraint!(lhs >= row.rhs),
            Relation::Eq => constraint!(lhs == row.rhs),
        });
    }

    match problem.solve() {
        Ok(solution) => Ok(extract(&solution, &handles, objective, started, options)),
        Err(err) => Ok(failure_outcome(err, started)),
    }
}

/// Declare one good_lp variable per model column, preserving order.
fn lower_columns(
    model: &ValuationModel,
) -> SolverResult<(Sense, &LinExpr, good_lp::ProblemVariables, Vec<Variable>)> {
    let (sense, objective) = model
        .objective()
        .ok_or(SolverError::InvalidModel(ModelError::MissingObjective))?;

    let mut vars = variables!();
    let mut handles = Vec::with_capacity(model.num_columns());
    for column in model.columns() {
        let mut definition = variable();
        if column.lower.is_finite() {
            definition = definition.min(column.lower);
        }
        if column.upper.is_finite() {
            definition = definition.max(column.upper);
        }
        handles.push(vars.add(definition));
    }
    Ok((sense, objective, vars, handles))
}

/// Rebuild a sparse model expression against the good_lp variable handles.
fn lower_expr(expr: &LinExpr, handles: &[Variable]) -> Expression {
    let mut lowered = Expression::from(expr.constant_term());
    for (var, coef) in expr.terms() {
        lowered += *coef * handles[var.index()];
    }
    lowered
}

fn extract(
    solution: &impl Solution,
    handles: &[Variable],
    objective: &LinExpr,
    started: Instant,
    options: &SolveOptions,
) -> SolveOutcome {
    let values: Vec<f64> = handles.iter().map(|v| solution.value(*v)).collect();
    let objective_value = objective.evaluate(&values);
    let elapsed = started.elapsed().as_millis() as u64;

    if options.verbose {
        info!(
            objective = objective_value,
            solve_time_ms = elapsed,
            "solver reported an optimal solution"
        );
    } else {
        debug!(
            objective = objective_value,
            solve_time_ms = elapsed,
            "solver reported an optimal solution"
        );
    }

    SolveOutcome::optimal(objective_value, values, elapsed)
}

fn failure_outcome(err: ResolutionError, started: Instant) -> SolveOutcome {
    let elapsed = started.elapsed().as_millis() as u64;
    match err {
        ResolutionError::Infeasible => SolveOutcome::failed(
            TerminationStatus::Infeasible,
            elapsed,
            Some("problem is infeasible".to_string()),
        ),
        ResolutionError::Unbounded => SolveOutcome::failed(
            TerminationStatus::Unbounded,
            elapsed,
            Some("problem is unbounded".to_string()),
        ),
        other => SolveOutcome::failed(
            TerminationStatus::Error,
            elapsed,
            Some(format!("{:?}", other)),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use esv_core::LinExpr;

    fn options() -> SolveOptions {
        SolveOptions::quiet()
    }

    #[test]
    fn minimizes_a_trivial_model() {
        let mut model = ValuationModel::new();
        let x = model.add_variable("x", 0.0, f64::INFINITY);
        model.constrain("floor", LinExpr::from(x), Relation::Ge, 1.0);
        model.minimize(LinExpr::from(x));

        let outcome = solve_local(&model, SolverId::Clarabel, &options()).unwrap();
        assert_eq!(outcome.status, TerminationStatus::Optimal);
        assert!((outcome.value(x) - 1.0).abs() < 1e-6);
        assert!((outcome.objective - 1.0).abs() < 1e-6);
    }

    #[test]
    fn maximization_respects_bounds() {
        let mut model = ValuationModel::new();
        let x = model.add_variable("x", 0.0, 3.0);
        model.maximize(2.0 * x);

        let outcome = solve_local(&model, SolverId::Clarabel, &options()).unwrap();
        assert_eq!(outcome.status, TerminationStatus::Optimal);
        assert!((outcome.objective - 6.0).abs() < 1e-6);
    }

    #[test]
    fn infeasible_model_reports_status_not_error() {
        let mut model = ValuationModel::new();
        let x = model.add_variable("x", f64::NEG_INFINITY, f64::INFINITY);
        model.constrain("floor", LinExpr::from(x), Relation::Ge, 1.0);
        model.constrain("ceiling", LinExpr::from(x), Relation::Le, 0.0);
        model.minimize(LinExpr::from(x));

        let outcome = solve_local(&model, SolverId::Clarabel, &options()).unwrap();
        assert_eq!(outcome.status, TerminationStatus::Infeasible);
        assert!(outcome.values().is_empty());
    }

    #[test]
    fn unbounded_model_is_not_optimal() {
        let mut model = ValuationModel::new();
        let x = model.add_variable("x", 0.0, f64::INFINITY);
        model.maximize(LinExpr::from(x));

        let outcome = solve_local(&model, SolverId::Clarabel, &options()).unwrap();
        assert!(!outcome.is_optimal());
        assert!(matches!(
            outcome.status,
            TerminationStatus::Unbounded | TerminationStatus::Error
        ));
    }

    #[test]
    fn missing_objective_is_an_invalid_model() {
        let mut model = ValuationModel::new();
        model.add_variable("x", 0.0, 1.0);

        assert!(matches!(
            solve_local(&model, SolverId::Clarabel, &options()),
            Err(SolverError::InvalidModel(ModelError::MissingObjective))
        ));
    }

    #[test]
    fn cbc_is_remote_only() {
        let mut model = ValuationModel::new();
        let x = model.add_variable("x", 0.0, 1.0);
        model.minimize(LinExpr::from(x));

        assert!(matches!(
            solve_local(&model, SolverId::Cbc, &options()),
            Err(SolverError::BackendUnavailable { .. })
        ));
    }

    #[test]
    fn equality_constraints_pin_variables() {
        let mut model = ValuationModel::new();
        let x = model.add_variable("x", 0.0, 10.0);
        let y = model.add_variable("y", 0.0, 10.0);
        let mut balance = LinExpr::from(x);
        balance.add_term(y, 1.0);
        model.constrain("balance", balance, Relation::Eq, 4.0);
        model.minimize(3.0 * x + 1.0 * y);

        let outcome = solve_local(&model, SolverId::Clarabel, &options()).unwrap();
        assert_eq!(outcome.status, TerminationStatus::Optimal);
        assert!((outcome.value(y) - 4.0).abs() < 1e-5);
        assert!(outcome.value(x).abs() < 1e-5);
    }
}
