//! Degradation-cost sweeps over one fixed price series.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use serde::Serialize;

use crate::dispatch::{Engine, LpSolver, SimulationConfig, SolveStatus};
use crate::error::EngineError;
use crate::market::PriceSeries;

/// Outcome of one wear-cost setting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepPoint {
    pub degradation_cost: f64,
    pub status: SolveStatus,
    /// Net profit, `None` unless the solve was optimal.
    pub objective: Option<f64>,
    /// Total discharged energy (MWh), zero for failed solves.
    pub discharged_mwh: f64,
    pub cycles_used: u64,
}

impl fmt::Display for SweepPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.objective {
            Some(objective) => write!(
                f,
                "cost={:>7.2} | discharged={:>9.2} MWh | cycles={:>3} | profit={:>12.2}",
                self.degradation_cost, self.discharged_mwh, self.cycles_used, objective
            ),
            None => write!(f, "cost={:>7.2} | {}", self.degradation_cost, self.status),
        }
    }
}

/// Solves the dispatch once per entry of `costs`, all against `prices`.
///
/// At most [`thread::available_parallelism`] scoped workers run at once,
/// each pulling the next cost from a shared index, so a long grid never has
/// more solves in flight than the machine has cores. Results come back in
/// input order.
///
/// # Arguments
///
/// * `config` - Base configuration; only `degradation_cost` varies
/// * `prices` - Shared price series (length must equal `config.horizon_hours`)
/// * `costs` - Wear costs to evaluate
/// * `solver` - Backend shared by every run
///
/// # Errors
///
/// Returns the first [`EngineError`] in input order if any run fails with a
/// configuration error or an internal defect.
pub fn degradation_sweep<S>(
    config: &SimulationConfig,
    prices: &PriceSeries,
    costs: &[f64],
    solver: &S,
) -> Result<Vec<SweepPoint>, EngineError>
where
    S: LpSolver + Sync,
{
    let workers = thread::available_parallelism().map_or(1, NonZeroUsize::get);
    sweep_with_workers(config, prices, costs, solver, workers)
}

pub(crate) fn sweep_with_workers<S>(
    config: &SimulationConfig,
    prices: &PriceSeries,
    costs: &[f64],
    solver: &S,
    workers: usize,
) -> Result<Vec<SweepPoint>, EngineError>
where
    S: LpSolver + Sync,
{
    let engine = Engine::new(solver);
    let next = AtomicUsize::new(0);
    let workers = workers.clamp(1, costs.len().max(1));

    let mut slots: Vec<Option<Result<SweepPoint, EngineError>>> =
        (0..costs.len()).map(|_| None).collect();

    thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let (engine, next) = (&engine, &next);
                scope.spawn(move || {
                    let mut solved = Vec::new();
                    loop {
                        let i = next.fetch_add(1, Ordering::Relaxed);
                        let Some(&cost) = costs.get(i) else {
                            break;
                        };
                        solved.push((i, sweep_point(engine, config, prices, cost)));
                    }
                    solved
                })
            })
            .collect();

        for handle in handles {
            // a panicked worker leaves its slots empty
            if let Ok(solved) = handle.join() {
                for (i, outcome) in solved {
                    slots[i] = Some(outcome);
                }
            }
        }
    });

    slots
        .into_iter()
        .zip(costs)
        .map(|(slot, &cost)| {
            slot.unwrap_or_else(|| {
                Ok(SweepPoint {
                    degradation_cost: cost,
                    status: SolveStatus::SolverError("sweep worker panicked".into()),
                    objective: None,
                    discharged_mwh: 0.0,
                    cycles_used: 0,
                })
            })
        })
        .collect()
}

fn sweep_point<S: LpSolver>(
    engine: &Engine<&S>,
    config: &SimulationConfig,
    prices: &PriceSeries,
    cost: f64,
) -> Result<SweepPoint, EngineError> {
    let run_config = SimulationConfig {
        degradation_cost: cost,
        ..config.clone()
    };
    let result = engine.run_with_prices(&run_config, prices)?;

    let point = match result.report() {
        Some(report) => SweepPoint {
            degradation_cost: cost,
            status: result.status().clone(),
            objective: Some(report.objective()),
            discharged_mwh: report.schedule().total_discharge(),
            cycles_used: report.cycles_used(),
        },
        None => SweepPoint {
            degradation_cost: cost,
            status: result.status().clone(),
            objective: None,
            discharged_mwh: 0.0,
            cycles_used: 0,
        },
    };
    tracing::debug!(cost, discharged_mwh = point.discharged_mwh, "sweep point solved");
    Ok(point)
}
