//! Merchant energy arbitrage valuation.
//!
//! Schedules a storage device against an hourly price series: charge when
//! energy is cheap, discharge when it is expensive, subject to power and
//! state-of-charge limits with efficiency losses. The LP relaxation treats
//! power as continuous, which is the standard formulation for storage
//! scheduling at this resolution.

use crate::error::ValuationResult;
use crate::optimizer::{Optimizer, OptimizerCore};
use esv_core::{LinExpr, ParamSchema, Relation, VarVec};
use esv_solver::{SolveOutcome, SolverSpec};
use polars::prelude::{DataFrame, NamedFrom, Series};

#[derive(Debug, Clone)]
struct ArbitrageVars {
    charge: VarVec,
    discharge: VarVec,
    soc: VarVec,
}

/// Derived quantities computed alongside the results table.
#[derive(Debug, Clone, Copy)]
pub struct ArbitrageSummary {
    /// Revenue from discharging, $.
    pub gross_revenue: f64,
    /// Cost of charging energy, $.
    pub charging_cost: f64,
    /// Gross revenue minus charging cost, $.
    pub net_revenue: f64,
}

/// Energy arbitrage valuation model.
///
/// One model period per price entry. Battery parameters are schema-declared
/// and overridable ahead of population:
///
/// | Parameter | Default | Meaning |
/// |-----------|---------|---------|
/// | `power_rating_mw` | 1.0 | Charge/discharge power limit |
/// | `energy_capacity_mwh` | 4.0 | Usable energy capacity |
/// | `charge_efficiency` | 0.92 | Grid-to-storage efficiency |
/// | `discharge_efficiency` | 0.92 | Storage-to-grid efficiency |
/// | `retention` | 1.0 | Per-period self-discharge retention |
/// | `soc_initial_frac` | 0.5 | Starting state of charge, fraction |
/// | `soc_min_frac` | 0.0 | State-of-charge floor, fraction |
/// | `soc_max_frac` | 1.0 | State-of-charge ceiling, fraction |
/// | `cycle_cost_per_mwh` | 0.0 | Throughput penalty, $/MWh |
/// | `price` | input series | Energy price, $/MWh |
pub struct ArbitrageValuation {
    core: OptimizerCore,
    prices: Vec<f64>,
    vars: Option<ArbitrageVars>,
    summary: Option<ArbitrageSummary>,
}

impl ArbitrageValuation {
    pub fn new(prices: Vec<f64>, solver: SolverSpec) -> Self {
        let schema = ParamSchema::new()
            .scalar("power_rating_mw")
            .scalar("energy_capacity_mwh")
            .scalar("charge_efficiency")
            .scalar("discharge_efficiency")
            .scalar("retention")
            .scalar("soc_initial_frac")
            .scalar("soc_min_frac")
            .scalar("soc_max_frac")
            .scalar("cycle_cost_per_mwh")
            .series("price");
        Self {
            core: OptimizerCore::new(solver, schema),
            prices,
            vars: None,
            summary: None,
        }
    }

    /// Derived revenue figures, present once results are ready.
    pub fn summary(&self) -> Option<&ArbitrageSummary> {
        self.summary.as_ref()
    }
}

impl Optimizer for ArbitrageValuation {
    fn core(&self) -> &OptimizerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut OptimizerCore {
        &mut self.core
    }

    fn instantiate(&mut self) -> ValuationResult<()> {
        let periods = self.prices.len();
        let prices = self.prices.clone();
        let model = self.core_mut().model_mut();
        model.set_horizon(periods)?;
        model.set_default("price", prices);
        Ok(())
    }

    fn set_model_param(&mut self) -> ValuationResult<()> {
        let model = self.core_mut().model_mut();
        model.set_default("power_rating_mw", 1.0);
        model.set_default("energy_capacity_mwh", 4.0);
        model.set_default("charge_efficiency", 0.92);
        model.set_default("discharge_efficiency", 0.92);
        model.set_default("retention", 1.0);
        model.set_default("soc_initial_frac", 0.5);
        model.set_default("soc_min_frac", 0.0);
        model.set_default("soc_max_frac", 1.0);
        model.set_default("cycle_cost_per_mwh", 0.0);
        Ok(())
    }

    fn set_model_var(&mut self) -> ValuationResult<()> {
        let model = self.core().model();
        let power = model.scalar("power_rating_mw")?;
        let energy = model.scalar("energy_capacity_mwh")?;
        let soc_min = model.scalar("soc_min_frac")? * energy;
        let soc_max = model.scalar("soc_max_frac")? * energy;

        let model = self.core_mut().model_mut();
        let charge = model.add_series("charge_mw", 0.0, power)?;
        let discharge = model.add_series("discharge_mw", 0.0, power)?;
        let soc = model.add_series("soc_mwh", soc_min, soc_max)?;
        self.vars = Some(ArbitrageVars {
            charge,
            discharge,
            soc,
        });
        Ok(())
    }

    fn populate(&mut self) -> ValuationResult<()> {
        self.set_model_param()?;
        self.set_model_var()?;

        let vars = self.vars.clone().expect("variables declared in set_model_var");
        let model = self.core().model();
        let eta_c = model.scalar("charge_efficiency")?;
        let eta_d = model.scalar("discharge_efficiency")?;
        let retention = model.scalar("retention")?;
        let energy = model.scalar("energy_capacity_mwh")?;
        let soc_start = model.scalar("soc_initial_frac")? * energy;
        let cycle_cost = model.scalar("cycle_cost_per_mwh")?;
        let prices = model.series("price")?.to_vec();
        let periods = model.horizon();

        let model = self.core_mut().model_mut();
        for t in 0..periods {
            // soc[t] = retention * soc[t-1] + eta_c * charge[t] - discharge[t] / eta_d
            let mut balance = LinExpr::from(vars.soc.at(t));
            balance.add_term(vars.charge.at(t), -eta_c);
            balance.add_term(vars.discharge.at(t), 1.0 / eta_d);
            let rhs = if t == 0 {
                retention * soc_start
            } else {
                balance.add_term(vars.soc.at(t - 1), -retention);
                0.0
            };
            model.constrain(format!("soc_balance[{}]", t), balance, Relation::Eq, rhs);
        }

        // End the horizon at least as charged as it began, so the valuation
        // does not monetize stored energy it started with.
        model.constrain(
            "soc_terminal",
            LinExpr::from(vars.soc.at(periods - 1)),
            Relation::Ge,
            soc_start,
        );

        let mut objective = LinExpr::new();
        for t in 0..periods {
            objective.add_term(vars.discharge.at(t), prices[t] - cycle_cost);
            objective.add_term(vars.charge.at(t), -(prices[t] + cycle_cost));
        }
        model.maximize(objective);
        Ok(())
    }

    fn process_results(&mut self, outcome: &SolveOutcome) -> ValuationResult<DataFrame> {
        let vars = self.vars.clone().expect("variables declared in set_model_var");
        let prices = self.core().model().series("price")?.to_vec();

        let charge = outcome.series(&vars.charge);
        let discharge = outcome.series(&vars.discharge);
        let soc = outcome.series(&vars.soc);

        let periods: Vec<u32> = (0..prices.len() as u32).collect();
        let revenue: Vec<f64> = (0..prices.len())
            .map(|t| prices[t] * (discharge[t] - charge[t]))
            .collect();

        let gross_revenue: f64 = (0..prices.len()).map(|t| prices[t] * discharge[t]).sum();
        let charging_cost: f64 = (0..prices.len()).map(|t| prices[t] * charge[t]).sum();
        self.summary = Some(ArbitrageSummary {
            gross_revenue,
            charging_cost,
            net_revenue: gross_revenue - charging_cost,
        });

        let frame = DataFrame::new(vec![
            Series::new("period", periods),
            Series::new("price_per_mwh", prices),
            Series::new("charge_mw", charge),
            Series::new("discharge_mw", discharge),
            Series::new("soc_mwh", soc),
            Series::new("revenue", revenue),
        ])?;
        Ok(frame)
    }
}
