//! Integration tests for degradation-cost sweeps.

mod common;

use std::time::Duration;

use approx::assert_relative_eq;

use bess_arbitrage::dispatch::{GoodLpSolver, SolveStatus, TimeLimited};
use bess_arbitrage::market::{PriceSeries, VolatilityProfile};
use bess_arbitrage::sweep::degradation_sweep;

#[test]
fn higher_wear_never_increases_cycling() {
    let cfg = common::short_config(VolatilityProfile::Normal, 168);
    let prices = PriceSeries::generate(168, cfg.volatility.params(), cfg.seed);
    let costs = [0.0, 5.0, 10.0, 20.0, 40.0, 80.0, 160.0];

    let points = degradation_sweep(&cfg, &prices, &costs, &GoodLpSolver::default()).unwrap();
    assert_eq!(points.len(), costs.len());
    assert!(points.iter().all(|p| p.status == SolveStatus::Optimal));

    for pair in points.windows(2) {
        assert!(
            pair[1].discharged_mwh <= pair[0].discharged_mwh + 1e-6,
            "discharge rose from {:.4} at cost {} to {:.4} at cost {}",
            pair[0].discharged_mwh,
            pair[0].degradation_cost,
            pair[1].discharged_mwh,
            pair[1].degradation_cost
        );
        assert!(pair[1].cycles_used <= pair[0].cycles_used);
        let (a, b) = (pair[0].objective.unwrap(), pair[1].objective.unwrap());
        assert!(b <= a + 1e-6, "profit rose from {a} to {b}");
    }
}

#[test]
fn free_cycling_on_volatile_market_discharges_something() {
    let cfg = common::short_config(VolatilityProfile::Extreme, 72);
    let prices = PriceSeries::generate(72, cfg.volatility.params(), cfg.seed);
    let points = degradation_sweep(&cfg, &prices, &[0.0], &GoodLpSolver::default()).unwrap();
    assert!(points[0].discharged_mwh > 1.0);
    assert!(points[0].objective.unwrap() > 0.0);
}

#[test]
fn prohibitive_wear_idles_the_battery() {
    let cfg = common::short_config(VolatilityProfile::Low, 48);
    let prices = PriceSeries::generate(48, cfg.volatility.params(), cfg.seed);
    let cost = prices.max_forward_spread() + 0.5;

    let points = degradation_sweep(&cfg, &prices, &[cost], &GoodLpSolver::default()).unwrap();
    assert!(points[0].discharged_mwh.abs() <= 1e-9);
    assert_eq!(points[0].cycles_used, 0);
}

#[test]
fn long_grid_matches_points_solved_alone() {
    let cfg = common::short_config(VolatilityProfile::Crisis, 48);
    let prices = PriceSeries::generate(48, cfg.volatility.params(), cfg.seed);
    let solver = TimeLimited::new(GoodLpSolver::default(), Duration::from_secs(30));
    let costs: Vec<f64> = (0..96).map(|i| f64::from(i) * 2.5).collect();

    let grid = degradation_sweep(&cfg, &prices, &costs, &solver).unwrap();
    assert_eq!(grid.len(), costs.len());

    for (point, &cost) in grid.iter().zip(&costs) {
        let alone = degradation_sweep(&cfg, &prices, &[cost], &solver).unwrap();
        assert_eq!(point.degradation_cost, cost);
        assert_eq!(point.status, alone[0].status, "cost {cost}");
        assert_eq!(point.status, SolveStatus::Optimal, "cost {cost}");
        assert_relative_eq!(
            point.objective.unwrap(),
            alone[0].objective.unwrap(),
            epsilon = 1e-6,
            max_relative = 1e-9
        );
    }
}
