//! The mutable mathematical-program representation owned by one optimizer.

use crate::error::ModelError;
use crate::expr::{LinExpr, Relation, Sense, VarId, VarVec};
use crate::params::{ParamKind, ParamValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bounds and name of one decision-variable column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
}

/// One linear constraint row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowConstraint {
    pub name: String,
    pub expr: LinExpr,
    pub relation: Relation,
    pub rhs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ParamSlot {
    value: ParamValue,
    overridden: bool,
}

/// An in-memory linear program under construction.
///
/// The model is mutated in place through the optimizer lifecycle: parameters
/// first, then variable columns, then constraint rows and the objective.
/// It is serializable so the remote solving service can receive it whole.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValuationModel {
    horizon: usize,
    params: BTreeMap<String, ParamSlot>,
    columns: Vec<ColumnSpec>,
    rows: Vec<RowConstraint>,
    objective: Option<(Sense, LinExpr)>,
}

impl ValuationModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the number of periods the model spans. Must precede any
    /// [`add_series`](Self::add_series) call.
    pub fn set_horizon(&mut self, periods: usize) -> Result<(), ModelError> {
        if periods == 0 {
            return Err(ModelError::EmptyHorizon);
        }
        self.horizon = periods;
        Ok(())
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Assign a default parameter value. Leaves any explicit override in
    /// place, which makes default assignment safe to repeat.
    pub fn set_default(&mut self, name: &str, value: impl Into<ParamValue>) {
        let slot = self.params.entry(name.to_string()).or_insert(ParamSlot {
            value: ParamValue::Scalar(0.0),
            overridden: false,
        });
        if !slot.overridden {
            slot.value = value.into();
        }
    }

    /// Assign a parameter value explicitly, shadowing later defaults.
    pub fn set_param(&mut self, name: &str, value: impl Into<ParamValue>) {
        self.params.insert(
            name.to_string(),
            ParamSlot {
                value: value.into(),
                overridden: true,
            },
        );
    }

    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name).map(|slot| &slot.value)
    }

    /// Scalar parameter accessor; fails typed on absence or kind mismatch.
    pub fn scalar(&self, name: &str) -> Result<f64, ModelError> {
        match self.param(name) {
            Some(ParamValue::Scalar(value)) => Ok(*value),
            Some(other) => Err(ModelError::ParamKind {
                name: name.to_string(),
                expected: ParamKind::Scalar,
                found: other.kind(),
            }),
            None => Err(ModelError::MissingParam(name.to_string())),
        }
    }

    /// Series parameter accessor; checks the horizon length when one is set.
    pub fn series(&self, name: &str) -> Result<&[f64], ModelError> {
        match self.param(name) {
            Some(ParamValue::Series(values)) => {
                if self.horizon > 0 && values.len() != self.horizon {
                    return Err(ModelError::SeriesLength {
                        name: name.to_string(),
                        expected: self.horizon,
                        found: values.len(),
                    });
                }
                Ok(values)
            }
            Some(other) => Err(ModelError::ParamKind {
                name: name.to_string(),
                expected: ParamKind::Series,
                found: other.kind(),
            }),
            None => Err(ModelError::MissingParam(name.to_string())),
        }
    }

    /// Declare a single decision variable with the given bounds.
    pub fn add_variable(&mut self, name: &str, lower: f64, upper: f64) -> VarId {
        let id = VarId(self.columns.len());
        self.columns.push(ColumnSpec {
            name: name.to_string(),
            lower,
            upper,
        });
        id
    }

    /// Declare one variable per period, named `name[t]`.
    pub fn add_series(&mut self, name: &str, lower: f64, upper: f64) -> Result<VarVec, ModelError> {
        if self.horizon == 0 {
            return Err(ModelError::EmptyHorizon);
        }
        let first = self.columns.len();
        for t in 0..self.horizon {
            self.columns.push(ColumnSpec {
                name: format!("{}[{}]", name, t),
                lower,
                upper,
            });
        }
        Ok(VarVec {
            name: name.to_string(),
            first,
            len: self.horizon,
        })
    }

    /// Add a named constraint row.
    pub fn constrain(
        &mut self,
        name: impl Into<String>,
        expr: LinExpr,
        relation: Relation,
        rhs: f64,
    ) {
        self.rows.push(RowConstraint {
            name: name.into(),
            expr,
            relation,
            rhs,
        });
    }

    pub fn minimize(&mut self, expr: LinExpr) {
        self.objective = Some((Sense::Minimize, expr));
    }

    pub fn maximize(&mut self, expr: LinExpr) {
        self.objective = Some((Sense::Maximize, expr));
    }

    /// Objective sense and expression, if one has been set.
    pub fn objective(&self) -> Option<(Sense, &LinExpr)> {
        self.objective.as_ref().map(|(sense, expr)| (*sense, expr))
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn rows(&self) -> &[RowConstraint] {
        &self.rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }
}
