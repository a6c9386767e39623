//! Behind-the-meter peak shaving valuation.
//!
//! Dispatches a storage device against a metered load series to reduce the
//! billed demand peak: discharge into the peak periods, recharge in the
//! valleys. The billed peak is a single decision variable forced to cover the
//! net load in every period.

use crate::error::ValuationResult;
use crate::optimizer::{Optimizer, OptimizerCore};
use esv_core::{LinExpr, ParamSchema, Relation, VarId, VarVec};
use esv_solver::{SolveOutcome, SolverSpec};
use polars::prelude::{DataFrame, NamedFrom, Series};

#[derive(Debug, Clone)]
struct PeakVars {
    charge: VarVec,
    discharge: VarVec,
    soc: VarVec,
    peak: VarId,
}

/// Derived quantities computed alongside the results table.
#[derive(Debug, Clone, Copy)]
pub struct PeakShavingSummary {
    /// Highest metered load before storage, MW.
    pub raw_peak_mw: f64,
    /// Billed peak after storage dispatch, MW.
    pub billed_peak_mw: f64,
    /// Peak reduction achieved, MW.
    pub reduction_mw: f64,
}

/// Demand-charge reduction valuation model.
///
/// One model period per load entry. Shares the battery parameter set with
/// the arbitrage model and adds the tariff terms `demand_charge_per_mw` and
/// `energy_price_per_mwh`.
pub struct PeakShavingValuation {
    core: OptimizerCore,
    load: Vec<f64>,
    vars: Option<PeakVars>,
    summary: Option<PeakShavingSummary>,
}

impl PeakShavingValuation {
    pub fn new(load: Vec<f64>, solver: SolverSpec) -> Self {
        let schema = ParamSchema::new()
            .scalar("power_rating_mw")
            .scalar("energy_capacity_mwh")
            .scalar("charge_efficiency")
            .scalar("discharge_efficiency")
            .scalar("retention")
            .scalar("soc_initial_frac")
            .scalar("soc_min_frac")
            .scalar("soc_max_frac")
            .scalar("demand_charge_per_mw")
            .scalar("energy_price_per_mwh")
            .series("load");
        Self {
            core: OptimizerCore::new(solver, schema),
            load,
            vars: None,
            summary: None,
        }
    }

    /// Peak figures, present once results are ready.
    pub fn summary(&self) -> Option<&PeakShavingSummary> {
        self.summary.as_ref()
    }
}

impl Optimizer for PeakShavingValuation {
    fn core(&self) -> &OptimizerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut OptimizerCore {
        &mut self.core
    }

    fn instantiate(&mut self) -> ValuationResult<()> {
        let periods = self.load.len();
        let load = self.load.clone();
        let model = self.core_mut().model_mut();
        model.set_horizon(periods)?;
        model.set_default("load", load);
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
        model.set_default("demand_charge_per_mw", 10.0);
        model.set_default("energy_price_per_mwh", 0.0);
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
        let peak = model.add_variable("peak_mw", 0.0, f64::INFINITY);
        self.vars = Some(PeakVars {
            charge,
            discharge,
            soc,
            peak,
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
        let demand_charge = model.scalar("demand_charge_per_mw")?;
        let energy_price = model.scalar("energy_price_per_mwh")?;
        let load = model.series("load")?.to_vec();
        let periods = model.horizon();

        let model = self.core_mut().model_mut();
        for t in 0..periods {
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

            // Net load stays nonnegative: the battery never exports.
            let mut net_floor = LinExpr::from(vars.charge.at(t));
            net_floor.add_term(vars.discharge.at(t), -1.0);
            model.constrain(format!("net_nonneg[{}]", t), net_floor, Relation::Ge, -load[t]);

            // peak >= load[t] + charge[t] - discharge[t]
            let mut cover = LinExpr::from(vars.peak);
            cover.add_term(vars.charge.at(t), -1.0);
            cover.add_term(vars.discharge.at(t), 1.0);
            model.constrain(format!("peak_cover[{}]", t), cover, Relation::Ge, load[t]);
        }

        model.constrain(
            "soc_terminal",
            LinExpr::from(vars.soc.at(periods - 1)),
            Relation::Ge,
            soc_start,
        );

        let mut objective = LinExpr::from(vars.peak) * demand_charge;
        for t in 0..periods {
            objective.add_term(vars.charge.at(t), energy_price);
            objective.add_term(vars.discharge.at(t), -energy_price);
        }
        objective.add_constant(energy_price * load.iter().sum::<f64>());
        model.minimize(objective);
        Ok(())
    }

    fn process_results(&mut self, outcome: &SolveOutcome) -> ValuationResult<DataFrame> {
        let vars = self.vars.clone().expect("variables declared in set_model_var");
        let load = self.core().model().series("load")?.to_vec();

        let charge = outcome.series(&vars.charge);
        let discharge = outcome.series(&vars.discharge);
        let soc = outcome.series(&vars.soc);
        let net_load: Vec<f64> = (0..load.len())
            .map(|t| load[t] + charge[t] - discharge[t])
            .collect();

        let raw_peak_mw = load.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let billed_peak_mw = outcome.value(vars.peak);
        self.summary = Some(PeakShavingSummary {
            raw_peak_mw,
            billed_peak_mw,
            reduction_mw: raw_peak_mw - billed_peak_mw,
        });

        let periods: Vec<u32> = (0..load.len() as u32).collect();
        let frame = DataFrame::new(vec![
            Series::new("period", periods),
            Series::new("load_mw", load),
            Series::new("charge_mw", charge),
            Series::new("discharge_mw", discharge),
            Series::new("soc_mwh", soc),
            Series::new("net_load_mw", net_load),
        ])?;
        Ok(frame)
    }
}
