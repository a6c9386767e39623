//! End-to-end peak shaving valuation tests against the default local solver.

use esv_core::ParamOverrides;
use esv_solver::SolverSpec;
use esv_valuation::{Optimizer, PeakShavingValuation};

fn lossless_battery() -> ParamOverrides {
    ParamOverrides::new()
        .set("power_rating_mw", 2.0)
        .set("energy_capacity_mwh", 4.0)
        .set("charge_efficiency", 1.0)
        .set("discharge_efficiency", 1.0)
        .set("demand_charge_per_mw", 10.0)
        .set("energy_price_per_mwh", 0.0)
}

#[test]
fn billed_peak_drops_by_the_power_rating() {
    let load = vec![2.0, 2.0, 6.0, 2.0];
    let mut study = PeakShavingValuation::new(load, SolverSpec::default());
    study.apply_parameters(&lossless_battery()).unwrap();

    let frame = study.run().unwrap();
    assert_eq!(frame.height(), 4);

    // The 6 MW hour can only be served down to 6 - 2 = 4 MW.
    let summary = study.summary().expect("summary after solve");
    assert!((summary.raw_peak_mw - 6.0).abs() < 1e-9);
    assert!((summary.billed_peak_mw - 4.0).abs() < 1e-3);
    assert!((summary.reduction_mw - 2.0).abs() < 1e-3);

    let net = frame.column("net_load_mw").unwrap().f64().unwrap();
    for t in 0..frame.height() {
        let value = net.get(t).unwrap();
        assert!(value >= -1e-6, "net load went negative at period {}", t);
        assert!(value <= 4.0 + 1e-3, "net load exceeded the billed peak");
    }
}

#[test]
fn flat_load_leaves_nothing_to_shave() {
    let load = vec![3.0, 3.0, 3.0];
    let mut study = PeakShavingValuation::new(load, SolverSpec::default());
    study.apply_parameters(&lossless_battery()).unwrap();
    study.run().unwrap();

    let summary = study.summary().expect("summary after solve");
    assert!((summary.billed_peak_mw - 3.0).abs() < 1e-3);
    assert!(summary.reduction_mw.abs() < 1e-3);
}

#[test]
fn discharge_concentrates_on_the_peak_period() {
    let load = vec![1.0, 5.0, 1.0];
    let mut study = PeakShavingValuation::new(load, SolverSpec::default());
    study.apply_parameters(&lossless_battery()).unwrap();

    let frame = study.run().unwrap();
    let discharge = frame.column("discharge_mw").unwrap().f64().unwrap();
    let peak_discharge = discharge.get(1).unwrap();
    assert!((peak_discharge - 2.0).abs() < 1e-3);
}
