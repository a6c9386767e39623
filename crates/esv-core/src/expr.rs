//! Linear expressions over model decision variables.
//!
//! [`LinExpr`] is the sparse building block for objectives and constraint
//! rows: a list of `(variable, coefficient)` terms plus a constant. It stays
//! deliberately small — enough operator support to write formulations
//! readably, nothing more.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// Handle to a single decision-variable column of a model.
///
/// Indices are assigned in declaration order and are stable for the lifetime
/// of the model, so they double as column positions in solver value vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VarId(pub(crate) usize);

impl VarId {
    /// Column position of this variable.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A named, contiguous block of per-period variable columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarVec {
    pub(crate) name: String,
    pub(crate) first: usize,
    pub(crate) len: usize,
}

impl VarVec {
    /// Variable for period `t`. Panics if `t` is outside the horizon.
    pub fn at(&self, t: usize) -> VarId {
        assert!(t < self.len, "period {} outside horizon {}", t, self.len);
        VarId(self.first + t)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate the block in period order.
    pub fn iter(&self) -> impl Iterator<Item = VarId> + '_ {
        (self.first..self.first + self.len).map(VarId)
    }
}

/// Sparse linear expression: Σ coefficient·variable + constant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinExpr {
    terms: Vec<(VarId, f64)>,
    constant: f64,
}

impl LinExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expression consisting of a constant only.
    pub fn constant(value: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    /// Append `coef * var` to the expression.
    pub fn add_term(&mut self, var: VarId, coef: f64) {
        self.terms.push((var, coef));
    }

    /// Shift the expression by a constant.
    pub fn add_constant(&mut self, value: f64) {
        self.constant += value;
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    pub fn constant_term(&self) -> f64 {
        self.constant
    }

    /// Evaluate against a flat per-column value vector.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coef)| coef * values.get(var.index()).copied().unwrap_or(0.0))
            .sum::<f64>()
            + self.constant
    }
}

impl From<VarId> for LinExpr {
    fn from(var: VarId) -> Self {
        Self {
            terms: vec![(var, 1.0)],
            constant: 0.0,
        }
    }
}

impl Add for LinExpr {
    type Output = LinExpr;

    fn add(mut self, rhs: LinExpr) -> LinExpr {
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
        self
    }
}

impl Add<VarId> for LinExpr {
    type Output = LinExpr;

    fn add(mut self, rhs: VarId) -> LinExpr {
        self.add_term(rhs, 1.0);
        self
    }
}

impl Add<f64> for LinExpr {
    type Output = LinExpr;

    fn add(mut self, rhs: f64) -> LinExpr {
        self.constant += rhs;
        self
    }
}

impl AddAssign for LinExpr {
    fn add_assign(&mut self, rhs: LinExpr) {
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
    }
}

impl Sub for LinExpr {
    type Output = LinExpr;

    fn sub(mut self, rhs: LinExpr) -> LinExpr {
        self.terms
            .extend(rhs.terms.into_iter().map(|(var, coef)| (var, -coef)));
        self.constant -= rhs.constant;
        self
    }
}

impl Sub<VarId> for LinExpr {
    type Output = LinExpr;

    fn sub(mut self, rhs: VarId) -> LinExpr {
        self.add_term(rhs, -1.0);
        self
    }
}

impl Sub<f64> for LinExpr {
    type Output = LinExpr;

    fn sub(mut self, rhs: f64) -> LinExpr {
        self.constant -= rhs;
        self
    }
}

impl Mul<f64> for LinExpr {
    type Output = LinExpr;

    fn mul(mut self, rhs: f64) -> LinExpr {
        for (_, coef) in &mut self.terms {
            *coef *= rhs;
        }
        self.constant *= rhs;
        self
    }
}

impl Mul<VarId> for f64 {
    type Output = LinExpr;

    fn mul(self, rhs: VarId) -> LinExpr {
        LinExpr {
            terms: vec![(rhs, self)],
            constant: 0.0,
        }
    }
}

impl Neg for LinExpr {
    type Output = LinExpr;

    fn neg(self) -> LinExpr {
        self * -1.0
    }
}

/// Constraint relation between a row expression and its right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    Le,
    Ge,
    Eq,
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Relation::Le => write!(f, "<="),
            Relation::Ge => write!(f, ">="),
            Relation::Eq => write!(f, "=="),
        }
    }
}

/// Objective direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sense {
    Minimize,
    Maximize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expression_arithmetic() {
        let x = VarId(0);
        let y = VarId(1);

        let expr = (2.0 * x + 3.0) - (1.0 * y) * 2.0;
        assert_eq!(expr.terms(), &[(x, 2.0), (y, -2.0)]);
        assert_eq!(expr.constant_term(), 3.0);
    }

    #[test]
    fn evaluate_uses_column_positions() {
        let x = VarId(0);
        let y = VarId(2);
        let expr = 1.5 * x + 1.0 * y + 0.5;
        assert_eq!(expr.evaluate(&[2.0, 99.0, 4.0]), 1.5 * 2.0 + 4.0 + 0.5);
    }

    #[test]
    fn var_vec_indexing() {
        let block = VarVec {
            name: "soc".to_string(),
            first: 3,
            len: 4,
        };
        assert_eq!(block.at(0).index(), 3);
        assert_eq!(block.at(3).index(), 6);
        let collected: Vec<usize> = block.iter().map(VarId::index).collect();
        assert_eq!(collected, vec![3, 4, 5, 6]);
    }

    #[test]
    #[should_panic(expected = "outside horizon")]
    fn var_vec_out_of_range_panics() {
        let block = VarVec {
            name: "soc".to_string(),
            first: 0,
            len: 2,
        };
        let _ = block.at(2);
    }
}
