//! The optimizer lifecycle contract shared by every valuation model.
//!
//! Concrete variants supply the model-construction hooks; the provided
//! methods drive the single-use lifecycle
//!
//! ```text
//! created ─> instantiated ─> populated ─> results-ready
//!                 │               │              ^
//!                 └──── any failure ────> failed (terminal)
//! ```
//!
//! An instance is not restartable: once it reaches `results-ready` or
//! `failed`, further lifecycle calls are rejected with a typed error.

use crate::error::{ValuationError, ValuationResult};
use esv_core::{ParamOverrides, ParamSchema, ValuationModel};
use esv_solver::{SolveOptions, SolveOutcome, SolverSpec};
use polars::prelude::DataFrame;
use tracing::{error, info};

/// Progress of one optimizer instance through its single-use lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleStage {
    Created,
    Instantiated,
    Populated,
    ResultsReady,
    Failed,
}

impl std::fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleStage::Created => write!(f, "created"),
            LifecycleStage::Instantiated => write!(f, "instantiated"),
            LifecycleStage::Populated => write!(f, "populated"),
            LifecycleStage::ResultsReady => write!(f, "results-ready"),
            LifecycleStage::Failed => write!(f, "failed"),
        }
    }
}

/// State owned uniformly by every optimizer variant: the model, the solver
/// choice, the declared parameter schema, the results slot, and the stage.
///
/// Construction is pure in-memory setup: no I/O, no network access.
#[derive(Debug)]
pub struct OptimizerCore {
    model: ValuationModel,
    solver: SolverSpec,
    schema: ParamSchema,
    results: Option<DataFrame>,
    stage: LifecycleStage,
}

impl OptimizerCore {
    pub fn new(solver: SolverSpec, schema: ParamSchema) -> Self {
        Self {
            model: ValuationModel::new(),
            solver,
            schema,
            results: None,
            stage: LifecycleStage::Created,
        }
    }

    pub fn model(&self) -> &ValuationModel {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut ValuationModel {
        &mut self.model
    }

    pub fn solver(&self) -> &SolverSpec {
        &self.solver
    }

    pub fn schema(&self) -> &ParamSchema {
        &self.schema
    }

    pub fn stage(&self) -> LifecycleStage {
        self.stage
    }

    /// The results table, present only after a successful solve.
    pub fn results(&self) -> Option<&DataFrame> {
        self.results.as_ref()
    }

    fn expect_stage(
        &self,
        expected: LifecycleStage,
        operation: &'static str,
    ) -> ValuationResult<()> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(ValuationError::Lifecycle {
                operation,
                stage: self.stage,
            })
        }
    }

    fn advance(&mut self, stage: LifecycleStage) {
        self.stage = stage;
    }

    fn mark_failed(&mut self) {
        self.stage = LifecycleStage::Failed;
    }

    /// Store the results table exactly once and finish the lifecycle.
    fn store_results(&mut self, frame: DataFrame) {
        self.results = Some(frame);
        self.stage = LifecycleStage::ResultsReady;
    }

    fn apply_overrides(&mut self, overrides: &ParamOverrides) -> ValuationResult<()> {
        match self.stage {
            LifecycleStage::Created | LifecycleStage::Instantiated => {}
            stage => {
                return Err(ValuationError::Lifecycle {
                    operation: "apply_parameters",
                    stage,
                })
            }
        }

        for (name, value) in overrides.iter() {
            match self.schema.kind_of(name) {
                None => {
                    error!(param = name, "rejecting unknown parameter override");
                    return Err(ValuationError::UnknownParameter {
                        name: name.to_string(),
                    });
                }
                Some(kind) if kind != value.kind() => {
                    return Err(ValuationError::ParameterKind {
                        name: name.to_string(),
                        expected: kind,
                    });
                }
                Some(_) => {
                    info!(param = name, value = %value, "setting model parameter");
                    self.model.set_param(name, value.clone());
                }
            }
        }
        Ok(())
    }
}

/// Lifecycle contract for valuation optimizers.
///
/// Every concrete variant supplies the five construction hooks; the provided
/// methods are the uniform run/solve/results pipeline consumed by callers.
/// The solver and results are reached through [`OptimizerCore`], so variants
/// carry no orchestration code of their own.
pub trait Optimizer {
    /// Shared lifecycle state.
    fn core(&self) -> &OptimizerCore;
    fn core_mut(&mut self) -> &mut OptimizerCore;

    /// Assign default parameter values onto the model.
    ///
    /// Implementations go through [`ValuationModel::set_default`], so the
    /// method is idempotent and never clobbers a caller's override.
    fn set_model_param(&mut self) -> ValuationResult<()>;

    /// Declare decision variables. Parameters are already set when this runs;
    /// ordering within [`populate`](Self::populate) is the variant's
    /// responsibility.
    fn set_model_var(&mut self) -> ValuationResult<()>;

    /// One-time mapping of optimizer configuration onto model structures
    /// (time horizon, input series). Runs inside
    /// [`instantiate_model`](Self::instantiate_model).
    fn instantiate(&mut self) -> ValuationResult<()>;

    /// Build parameters, variables, objective, and constraints into a
    /// complete, solvable model. Runs inside
    /// [`populate_model`](Self::populate_model), which rejects a second call.
    fn populate(&mut self) -> ValuationResult<()>;

    /// Consume the solved outcome and build the results table, computing any
    /// derived quantities along the way. Invoked only after an optimal
    /// termination.
    fn process_results(&mut self, outcome: &SolveOutcome) -> ValuationResult<DataFrame>;

    /// Instantiate the model. Valid once, in the `created` stage.
    fn instantiate_model(&mut self) -> ValuationResult<()> {
        self.core()
            .expect_stage(LifecycleStage::Created, "instantiate_model")?;
        match self.instantiate() {
            Ok(()) => {
                self.core_mut().advance(LifecycleStage::Instantiated);
                Ok(())
            }
            Err(err) => {
                self.core_mut().mark_failed();
                Err(err)
            }
        }
    }

    /// Populate the model. Valid once, after instantiation.
    fn populate_model(&mut self) -> ValuationResult<()> {
        self.core()
            .expect_stage(LifecycleStage::Instantiated, "populate_model")?;
        match self.populate() {
            Ok(()) => {
                self.core_mut().advance(LifecycleStage::Populated);
                Ok(())
            }
            Err(err) => {
                self.core_mut().mark_failed();
                Err(err)
            }
        }
    }

    /// Solve the populated model with solver trace suppressed.
    fn solve_model(&mut self) -> ValuationResult<()> {
        self.solve_with(SolveOptions::quiet())
    }

    /// Solve the populated model with explicit options.
    ///
    /// On an optimal termination this immediately and synchronously runs
    /// [`process_results`](Self::process_results) and stores the table; any
    /// other termination is logged, drives the instance to `failed`, and
    /// surfaces as [`ValuationError::SolveFailed`]. No partial results are
    /// ever exposed.
    fn solve_with(&mut self, options: SolveOptions) -> ValuationResult<()> {
        self.core()
            .expect_stage(LifecycleStage::Populated, "solve_model")?;

        let dispatched = esv_solver::solve(self.core().model(), self.core().solver(), &options);
        let outcome = match dispatched {
            Ok(outcome) => outcome,
            Err(err) => {
                self.core_mut().mark_failed();
                return Err(err.into());
            }
        };

        if !outcome.status.is_success() {
            error!(
                status = %outcome.status,
                "an optimal solution could not be obtained (infeasible problem?)"
            );
            self.core_mut().mark_failed();
            return Err(ValuationError::SolveFailed {
                status: outcome.status,
            });
        }

        match self.process_results(&outcome) {
            Ok(frame) => {
                self.core_mut().store_results(frame);
                Ok(())
            }
            Err(err) => {
                self.core_mut().mark_failed();
                Err(err)
            }
        }
    }

    /// Convenience orchestration: instantiate, populate, solve verbosely, and
    /// hand back the results table. Use when no steps are needed between
    /// constructing the model and solving it.
    fn run(&mut self) -> ValuationResult<DataFrame> {
        self.instantiate_model()?;
        self.populate_model()?;
        self.solve_with(SolveOptions::verbose())?;
        self.get_results().map(|frame| frame.clone())
    }

    /// The results table. Fails with [`ValuationError::ResultsNotReady`]
    /// until a solve has completed optimally.
    fn get_results(&self) -> ValuationResult<&DataFrame> {
        self.core().results().ok_or(ValuationError::ResultsNotReady)
    }

    /// Bulk-assign named parameter overrides ahead of population.
    ///
    /// Every override is validated against the variant's declared schema and
    /// logged; unknown names and kind mismatches are rejected instead of
    /// silently attached to the model.
    fn apply_parameters(&mut self, overrides: &ParamOverrides) -> ValuationResult<()> {
        self.core_mut().apply_overrides(overrides)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use esv_core::{LinExpr, Relation, VarId};
    use esv_solver::TerminationStatus;
    use polars::prelude::{NamedFrom, Series};

    /// Smallest possible variant: minimize x subject to x >= floor.
    struct FloorModel {
        core: OptimizerCore,
        infeasible: bool,
        x: Option<VarId>,
    }

    impl FloorModel {
        fn new() -> Self {
            Self {
                core: OptimizerCore::new(SolverSpec::default(), ParamSchema::new().scalar("floor")),
                infeasible: false,
                x: None,
            }
        }

        fn infeasible() -> Self {
            Self {
                infeasible: true,
                ..Self::new()
            }
        }
    }

    impl Optimizer for FloorModel {
        fn core(&self) -> &OptimizerCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut OptimizerCore {
            &mut self.core
        }

        fn set_model_param(&mut self) -> ValuationResult<()> {
            self.core_mut().model_mut().set_default("floor", 1.0);
            Ok(())
        }

        fn set_model_var(&mut self) -> ValuationResult<()> {
            let x = self
                .core_mut()
                .model_mut()
                .add_variable("x", 0.0, f64::INFINITY);
            self.x = Some(x);
            Ok(())
        }

        fn instantiate(&mut self) -> ValuationResult<()> {
            self.core_mut().model_mut().set_horizon(1)?;
            Ok(())
        }

        fn populate(&mut self) -> ValuationResult<()> {
            self.set_model_param()?;
            self.set_model_var()?;

            let x = self.x.expect("variable declared");
            let floor = self.core().model().scalar("floor")?;
            let infeasible = self.infeasible;
            let model = self.core_mut().model_mut();
            model.constrain("floor", LinExpr::from(x), Relation::Ge, floor);
            if infeasible {
                model.constrain("ceiling", LinExpr::from(x), Relation::Le, floor - 1.0);
            }
            model.minimize(LinExpr::from(x));
            Ok(())
        }

        fn process_results(&mut self, outcome: &SolveOutcome) -> ValuationResult<DataFrame> {
            let x = self.x.expect("variable declared");
            let frame = DataFrame::new(vec![
                Series::new("x", vec![outcome.value(x)]),
                Series::new("objective", vec![outcome.objective]),
            ])?;
            Ok(frame)
        }
    }

    #[test]
    fn run_solves_a_trivially_feasible_model() {
        let mut optimizer = FloorModel::new();
        let frame = optimizer.run().unwrap();

        assert_eq!(frame.height(), 1);
        let x = frame.column("x").unwrap().f64().unwrap().get(0).unwrap();
        assert!((x - 1.0).abs() < 1e-6);
        assert_eq!(optimizer.core().stage(), LifecycleStage::ResultsReady);
    }

    #[test]
    fn results_are_not_ready_before_any_solve() {
        let optimizer = FloorModel::new();
        assert!(matches!(
            optimizer.get_results(),
            Err(ValuationError::ResultsNotReady)
        ));
    }

    #[test]
    fn infeasible_solve_fails_and_never_exposes_results() {
        let mut optimizer = FloorModel::infeasible();
        match optimizer.run() {
            Err(ValuationError::SolveFailed {
                status: TerminationStatus::Infeasible,
            }) => {}
            other => panic!("expected SolveFailed(infeasible), got {:?}", other.err()),
        }
        assert_eq!(optimizer.core().stage(), LifecycleStage::Failed);
        assert!(matches!(
            optimizer.get_results(),
            Err(ValuationError::ResultsNotReady)
        ));
    }

    #[test]
    fn solve_model_surfaces_the_same_typed_error_as_run() {
        let mut optimizer = FloorModel::infeasible();
        optimizer.instantiate_model().unwrap();
        optimizer.populate_model().unwrap();
        assert!(matches!(
            optimizer.solve_model(),
            Err(ValuationError::SolveFailed { .. })
        ));
    }

    #[test]
    fn populate_twice_is_rejected() {
        let mut optimizer = FloorModel::new();
        optimizer.instantiate_model().unwrap();
        optimizer.populate_model().unwrap();
        assert!(matches!(
            optimizer.populate_model(),
            Err(ValuationError::Lifecycle {
                operation: "populate_model",
                stage: LifecycleStage::Populated,
            })
        ));
    }

    #[test]
    fn solve_before_populate_is_rejected() {
        let mut optimizer = FloorModel::new();
        assert!(matches!(
            optimizer.solve_model(),
            Err(ValuationError::Lifecycle {
                operation: "solve_model",
                ..
            })
        ));
    }

    #[test]
    fn overrides_survive_default_assignment() {
        let mut optimizer = FloorModel::new();
        optimizer.instantiate_model().unwrap();
        optimizer
            .apply_parameters(&ParamOverrides::new().set("floor", 2.5))
            .unwrap();
        optimizer.populate_model().unwrap();
        optimizer.solve_model().unwrap();

        let frame = optimizer.get_results().unwrap();
        let x = frame.column("x").unwrap().f64().unwrap().get(0).unwrap();
        assert!((x - 2.5).abs() < 1e-6);
    }

    #[test]
    fn unknown_overrides_are_rejected() {
        let mut optimizer = FloorModel::new();
        assert!(matches!(
            optimizer.apply_parameters(&ParamOverrides::new().set("ceiling", 2.0)),
            Err(ValuationError::UnknownParameter { .. })
        ));
    }

    #[test]
    fn mistyped_overrides_are_rejected() {
        let mut optimizer = FloorModel::new();
        assert!(matches!(
            optimizer.apply_parameters(&ParamOverrides::new().set("floor", vec![1.0, 2.0])),
            Err(ValuationError::ParameterKind { .. })
        ));
    }

    #[test]
    fn overrides_after_population_are_rejected() {
        let mut optimizer = FloorModel::new();
        optimizer.instantiate_model().unwrap();
        optimizer.populate_model().unwrap();
        assert!(matches!(
            optimizer.apply_parameters(&ParamOverrides::new().set("floor", 2.0)),
            Err(ValuationError::Lifecycle {
                operation: "apply_parameters",
                ..
            })
        ));
    }

    #[test]
    fn default_assignment_is_idempotent() {
        let mut optimizer = FloorModel::new();
        optimizer.instantiate_model().unwrap();
        optimizer.set_model_param().unwrap();
        let first = optimizer.core().model().scalar("floor").unwrap();
        optimizer.set_model_param().unwrap();
        let second = optimizer.core().model().scalar("floor").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn instance_is_single_use() {
        let mut optimizer = FloorModel::new();
        optimizer.run().unwrap();
        assert!(matches!(
            optimizer.instantiate_model(),
            Err(ValuationError::Lifecycle { .. })
        ));
        assert!(matches!(
            optimizer.solve_model(),
            Err(ValuationError::Lifecycle { .. })
        ));
    }
}
