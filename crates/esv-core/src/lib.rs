//! # esv-core: Valuation Model Core
//!
//! Provides the in-memory mathematical-program representation mutated by the
//! valuation optimizer lifecycle, plus typed parameter handling.
//!
//! ## Design
//!
//! A [`ValuationModel`] is a linear program under construction: decision
//! variable columns with bounds, sparse linear constraint rows, an objective,
//! and a set of named parameters. The model is owned exclusively by one
//! optimizer instance and is serializable, so it can be shipped whole to a
//! remote solving service.
//!
//! Parameters carry an overridden flag: [`ValuationModel::set_default`] never
//! clobbers a value applied through [`ValuationModel::set_param`], which is
//! what lets a caller override defaults before the model is populated.
//!
//! ```rust
//! use esv_core::{LinExpr, Relation, ValuationModel};
//!
//! let mut model = ValuationModel::new();
//! model.set_horizon(4).unwrap();
//! let x = model.add_variable("x", 0.0, f64::INFINITY);
//! model.constrain("floor", LinExpr::from(x), Relation::Ge, 1.0);
//! model.minimize(LinExpr::from(x));
//! ```

pub mod error;
pub mod expr;
pub mod model;
pub mod params;

pub use error::ModelError;
pub use expr::{LinExpr, Relation, Sense, VarId, VarVec};
pub use model::{ColumnSpec, RowConstraint, ValuationModel};
pub use params::{ParamKind, ParamOverrides, ParamSchema, ParamValue};
