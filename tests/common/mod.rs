//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use bess_arbitrage::dispatch::{DispatchReport, Engine, GoodLpSolver, SimulationConfig};
use bess_arbitrage::market::{PriceSeries, VolatilityProfile};

/// Tolerance for bound and balance checks (MWh / MW).
pub const TOL: f64 = 1e-6;

/// Three-hour toy battery: 10 MWh, 5 MW, lossless, no wear.
pub fn toy_config() -> SimulationConfig {
    SimulationConfig {
        capacity_mwh: 10.0,
        max_power_mw: 5.0,
        efficiency: 1.0,
        degradation_cost: 0.0,
        horizon_hours: 3,
        ..SimulationConfig::default()
    }
}

/// Cheap, expensive, cheap.
pub fn toy_prices() -> PriceSeries {
    PriceSeries::from_values(vec![10.0, 100.0, 10.0]).unwrap()
}

/// Default battery over `hours` of the given market.
pub fn short_config(volatility: VolatilityProfile, hours: usize) -> SimulationConfig {
    SimulationConfig {
        volatility,
        horizon_hours: hours,
        ..SimulationConfig::default()
    }
}

/// Runs `config` with the default simplex backend and unwraps the report.
pub fn solve(config: &SimulationConfig) -> DispatchReport {
    let result = Engine::new(GoodLpSolver::default()).run(config).unwrap();
    assert!(result.status().is_optimal(), "status {}", result.status());
    result.into_report().unwrap()
}

/// Same as [`solve`] against caller-supplied prices.
pub fn solve_with_prices(config: &SimulationConfig, prices: &PriceSeries) -> DispatchReport {
    let result = Engine::new(GoodLpSolver::default())
        .run_with_prices(config, prices)
        .unwrap();
    assert!(result.status().is_optimal(), "status {}", result.status());
    result.into_report().unwrap()
}

/// Asserts every bound and balance invariant of the schedule.
pub fn assert_schedule_invariants(config: &SimulationConfig, report: &DispatchReport) {
    let s = report.schedule();
    assert_eq!(s.charge().len(), config.horizon_hours);
    assert_eq!(s.discharge().len(), config.horizon_hours);
    assert_eq!(s.state_of_charge().len(), config.horizon_hours + 1);
    assert!(s.state_of_charge()[0].abs() <= TOL);

    for t in 0..config.horizon_hours {
        let (c, d) = (s.charge()[t], s.discharge()[t]);
        assert!((-TOL..=config.max_power_mw + TOL).contains(&c), "charge[{t}] = {c}");
        assert!((-TOL..=config.max_power_mw + TOL).contains(&d), "discharge[{t}] = {d}");

        let soc_next = s.state_of_charge()[t + 1];
        assert!(
            (-TOL..=config.capacity_mwh + TOL).contains(&soc_next),
            "soc[{}] = {soc_next}",
            t + 1
        );

        let expected = s.state_of_charge()[t] + c * config.efficiency - d / config.efficiency;
        assert!(
            (soc_next - expected).abs() <= TOL,
            "balance violated at hour {t}: {soc_next} vs {expected}"
        );
    }
}
