//! Run driver: price generation, model build, solve and post-processing.

use std::fmt;

use super::model::DispatchModel;
use super::report::DispatchReport;
use super::solver::{LpSolver, SolveOutcome};
use super::types::{OptimizationResult, SimulationConfig, SolveStatus};
use crate::error::EngineError;
use crate::market::PriceSeries;

/// Lifecycle of a single run. Stages only move forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStage {
    Configured,
    PriceGenerated,
    ModelBuilt,
    Solved(SolveStatus),
    ResultReady,
    Failed,
}

impl RunStage {
    fn rank(&self) -> u8 {
        match self {
            Self::Configured => 0,
            Self::PriceGenerated => 1,
            Self::ModelBuilt => 2,
            Self::Solved(_) => 3,
            Self::ResultReady | Self::Failed => 4,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ResultReady | Self::Failed)
    }

    /// Whether a run in this stage may move to `next`.
    ///
    /// A solved run may only become `ResultReady` when the solve was optimal.
    pub fn can_advance_to(&self, next: &RunStage) -> bool {
        match (self, next) {
            (Self::Solved(status), Self::ResultReady) => status.is_optimal(),
            _ if self.is_terminal() => false,
            (_, Self::Failed) => true,
            _ => next.rank() == self.rank() + 1,
        }
    }
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configured => f.write_str("configured"),
            Self::PriceGenerated => f.write_str("price-generated"),
            Self::ModelBuilt => f.write_str("model-built"),
            Self::Solved(status) => write!(f, "solved[{status}]"),
            Self::ResultReady => f.write_str("result-ready"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

struct RunTracker {
    stage: RunStage,
}

impl RunTracker {
    fn start() -> Self {
        tracing::debug!(stage = %RunStage::Configured, "run stage");
        Self {
            stage: RunStage::Configured,
        }
    }

    fn advance(&mut self, next: RunStage) {
        debug_assert!(
            self.stage.can_advance_to(&next),
            "illegal run transition {} -> {}",
            self.stage,
            next
        );
        tracing::debug!(from = %self.stage, to = %next, "run stage");
        self.stage = next;
    }
}

/// Optimization engine generic over the LP backend.
///
/// Holds no per-run state: one engine may serve any number of runs,
/// concurrently if `S: Sync`.
#[derive(Debug, Clone, Default)]
pub struct Engine<S: LpSolver> {
    solver: S,
}

impl<S: LpSolver> Engine<S> {
    pub fn new(solver: S) -> Self {
        Self { solver }
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    /// Generates prices for `config` and optimizes the dispatch against them.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Configuration`] listing every invalid field, or
    /// [`EngineError::Defect`] if an internal consistency check fails.
    /// Solve failures are not errors: they come back as a status-only
    /// [`OptimizationResult`].
    pub fn run(&self, config: &SimulationConfig) -> Result<OptimizationResult, EngineError> {
        check_config(config)?;
        let mut tracker = RunTracker::start();

        let prices = PriceSeries::generate(config.horizon_hours, config.volatility.params(), config.seed);
        tracker.advance(RunStage::PriceGenerated);

        self.optimize(config, &prices, tracker)
    }

    /// Optimizes the dispatch against caller-supplied prices.
    ///
    /// # Errors
    ///
    /// Same as [`Engine::run`]; additionally a price series whose length
    /// differs from `config.horizon_hours` is reported as a defect.
    pub fn run_with_prices(
        &self,
        config: &SimulationConfig,
        prices: &PriceSeries,
    ) -> Result<OptimizationResult, EngineError> {
        check_config(config)?;
        let mut tracker = RunTracker::start();
        tracker.advance(RunStage::PriceGenerated);
        self.optimize(config, prices, tracker)
    }

    fn optimize(
        &self,
        config: &SimulationConfig,
        prices: &PriceSeries,
        mut tracker: RunTracker,
    ) -> Result<OptimizationResult, EngineError> {
        let model = match DispatchModel::build(config, prices) {
            Ok(model) => model,
            Err(defect) => {
                tracker.advance(RunStage::Failed);
                return Err(defect.into());
            }
        };
        tracker.advance(RunStage::ModelBuilt);

        let outcome = self.solver.solve(model.program());
        tracker.advance(RunStage::Solved(outcome.status()));

        let (values, objective) = match outcome {
            SolveOutcome::Optimal { values, objective } => (values, objective),
            SolveOutcome::Infeasible => {
                tracing::error!(
                    solver = self.solver.name(),
                    "solver reported infeasible although the idle schedule is always feasible"
                );
                tracker.advance(RunStage::Failed);
                return Ok(OptimizationResult::failed(SolveStatus::Infeasible));
            }
            other => {
                let status = other.status();
                tracing::warn!(solver = self.solver.name(), %status, "solve did not reach optimality");
                tracker.advance(RunStage::Failed);
                return Ok(OptimizationResult::failed(status));
            }
        };

        let report = match DispatchReport::from_solution(config, prices, model.layout(), &values, objective) {
            Ok(report) => report,
            Err(defect) => {
                tracker.advance(RunStage::Failed);
                return Err(defect.into());
            }
        };
        tracker.advance(RunStage::ResultReady);

        tracing::info!(
            horizon_hours = config.horizon_hours,
            volatility = config.volatility.tag(),
            objective = report.objective(),
            cycles = report.cycles_used(),
            roi_pct = report.estimated_roi_pct(),
            "dispatch optimized"
        );
        Ok(OptimizationResult::optimal(report))
    }
}

fn check_config(config: &SimulationConfig) -> Result<(), EngineError> {
    let errors = config.validate();
    if !errors.is_empty() {
        return Err(EngineError::Configuration(errors));
    }
    for (field, value, range) in config.outside_ui_ranges() {
        tracing::warn!(
            field,
            value,
            min = range.start(),
            max = range.end(),
            "value outside the usual range, running anyway"
        );
    }
    Ok(())
}
