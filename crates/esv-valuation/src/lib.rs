//! # esv-valuation: Storage Valuation Optimizers
//!
//! The lifecycle contract for energy-storage valuation models, plus the
//! concrete valuation variants built on it.
//!
//! ## Lifecycle
//!
//! Every valuation model implements [`Optimizer`]: five construction hooks
//! supplied by the variant, with the run/solve/results pipeline provided
//! uniformly on top. An instance moves through
//! `created → instantiated → populated → results-ready` exactly once;
//! any failure is terminal and no partial results are ever exposed.
//!
//! | Variant | Question it answers |
//! |---------|---------------------|
//! | [`ArbitrageValuation`] | What is price arbitrage worth over this horizon? |
//! | [`PeakShavingValuation`] | How far can storage cut the billed demand peak? |
//!
//! ## Example
//!
//! ```ignore
//! use esv_valuation::{ArbitrageValuation, Optimizer};
//! use esv_solver::SolverSpec;
//!
//! let prices = vec![12.0, 55.0, 9.0, 61.0];
//! let mut study = ArbitrageValuation::new(prices, SolverSpec::default());
//! let results = study.run()?;
//! println!("{}", results);
//! ```

pub mod arbitrage;
pub mod error;
pub mod optimizer;
pub mod peak_shaving;
pub mod results;

pub use arbitrage::{ArbitrageSummary, ArbitrageValuation};
pub use error::{ValuationError, ValuationResult};
pub use optimizer::{LifecycleStage, Optimizer, OptimizerCore};
pub use peak_shaving::{PeakShavingSummary, PeakShavingValuation};
pub use results::{write_csv, write_parquet};
