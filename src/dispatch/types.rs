//! Core dispatch types: run configuration, schedule, and result records.

use std::fmt;
use std::ops::RangeInclusive;

use serde::Serialize;

use super::report::DispatchReport;
use crate::error::ConfigError;
use crate::market::VolatilityProfile;

/// Default horizon: 30 days of hourly trading.
pub const DEFAULT_HORIZON_HOURS: usize = 30 * 24;

/// Longest accepted horizon: one leap year of hourly trading.
pub const MAX_HORIZON_HOURS: usize = 366 * 24;

/// Default random seed.
pub const DEFAULT_SEED: u64 = 42;

/// Parameter ranges offered by interactive front ends. Sane values outside
/// them are still accepted.
pub const UI_CAPACITY_MWH: RangeInclusive<f64> = 10.0..=200.0;
pub const UI_MAX_POWER_MW: RangeInclusive<f64> = 1.0..=50.0;
pub const UI_EFFICIENCY: RangeInclusive<f64> = 0.5..=1.0;
pub const UI_DEGRADATION_COST: RangeInclusive<f64> = 0.0..=50.0;

/// Everything one optimization run needs to know.
///
/// # Examples
///
/// ```
/// use bess_arbitrage::dispatch::types::SimulationConfig;
///
/// let cfg = SimulationConfig::default();
/// assert_eq!(cfg.horizon_hours, 720);
/// assert!(cfg.validate().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationConfig {
    /// Usable energy capacity (MWh).
    pub capacity_mwh: f64,
    /// Charge and discharge power limit (MW).
    pub max_power_mw: f64,
    /// One-way efficiency applied on the way in and on the way out.
    pub efficiency: f64,
    /// Wear cost per discharged MWh.
    pub degradation_cost: f64,
    /// Market volatility preset driving the synthetic prices.
    pub volatility: VolatilityProfile,
    /// Number of hourly steps to optimize.
    pub horizon_hours: usize,
    /// Seed for the price generator.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            capacity_mwh: 50.0,
            max_power_mw: 10.0,
            efficiency: 0.9,
            degradation_cost: 10.0,
            volatility: VolatilityProfile::Normal,
            horizon_hours: DEFAULT_HORIZON_HOURS,
            seed: DEFAULT_SEED,
        }
    }
}

impl SimulationConfig {
    /// Checks physical sanity of every field and returns all violations.
    ///
    /// Returns an empty vector if the configuration can be run.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if !(self.capacity_mwh.is_finite() && self.capacity_mwh > 0.0) {
            errors.push(ConfigError::new("battery.capacity_mwh", "must be finite and > 0"));
        }
        if !(self.max_power_mw.is_finite() && self.max_power_mw > 0.0) {
            errors.push(ConfigError::new("battery.max_power_mw", "must be finite and > 0"));
        }
        if !(self.efficiency > 0.0 && self.efficiency <= 1.0) {
            errors.push(ConfigError::new("battery.efficiency", "must be in (0, 1]"));
        }
        if !(self.degradation_cost.is_finite() && self.degradation_cost >= 0.0) {
            errors.push(ConfigError::new(
                "battery.degradation_cost_per_mwh",
                "must be finite and >= 0",
            ));
        }
        if self.horizon_hours == 0 {
            errors.push(ConfigError::new("market.horizon_hours", "must be > 0"));
        } else if self.horizon_hours > MAX_HORIZON_HOURS {
            errors.push(ConfigError::new(
                "market.horizon_hours",
                format!("must be <= {MAX_HORIZON_HOURS}"),
            ));
        }

        errors
    }

    /// Fields whose values lie outside the interactive ranges, as
    /// `(field, value, range)`.
    pub fn outside_ui_ranges(&self) -> Vec<(&'static str, f64, RangeInclusive<f64>)> {
        [
            ("battery.capacity_mwh", self.capacity_mwh, UI_CAPACITY_MWH),
            ("battery.max_power_mw", self.max_power_mw, UI_MAX_POWER_MW),
            ("battery.efficiency", self.efficiency, UI_EFFICIENCY),
            (
                "battery.degradation_cost_per_mwh",
                self.degradation_cost,
                UI_DEGRADATION_COST,
            ),
        ]
        .into_iter()
        .filter(|(_, value, range)| !range.contains(value))
        .collect()
    }
}

/// Outcome tag of one solve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message")]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    SolverError(String),
}

impl SolveStatus {
    pub fn is_optimal(&self) -> bool {
        matches!(self, Self::Optimal)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Optimal => f.write_str("Optimal"),
            Self::Infeasible => f.write_str("Infeasible"),
            Self::Unbounded => f.write_str("Unbounded"),
            Self::SolverError(msg) => write!(f, "SolverError ({msg})"),
        }
    }
}

/// Hour-indexed charge, discharge and state-of-charge trajectories.
///
/// `charge` and `discharge` hold one value per hour (MW, held for the whole
/// hour); `state_of_charge` holds one more value than the horizon, index `t`
/// being the energy stored at the start of hour `t`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchSchedule {
    charge: Vec<f64>,
    discharge: Vec<f64>,
    state_of_charge: Vec<f64>,
}

impl DispatchSchedule {
    /// Assembles a schedule from solved trajectories.
    ///
    /// # Panics
    ///
    /// Panics if the trajectory lengths are inconsistent.
    pub(crate) fn new(charge: Vec<f64>, discharge: Vec<f64>, state_of_charge: Vec<f64>) -> Self {
        assert_eq!(charge.len(), discharge.len());
        assert_eq!(state_of_charge.len(), charge.len() + 1);
        Self {
            charge,
            discharge,
            state_of_charge,
        }
    }

    pub fn horizon(&self) -> usize {
        self.charge.len()
    }

    pub fn charge(&self) -> &[f64] {
        &self.charge
    }

    pub fn discharge(&self) -> &[f64] {
        &self.discharge
    }

    pub fn state_of_charge(&self) -> &[f64] {
        &self.state_of_charge
    }

    /// Net battery action at hour `t` (MW; positive=charge, negative=discharge).
    pub fn net_action(&self, t: usize) -> f64 {
        self.charge[t] - self.discharge[t]
    }

    /// Total energy delivered to the grid over the horizon (MWh).
    pub fn total_discharge(&self) -> f64 {
        self.discharge.iter().sum()
    }
}

/// One hour of the dispatch table, ready for presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleRow {
    /// Hour index.
    pub hour: usize,
    /// Market price for this hour.
    pub price: f64,
    /// Power drawn from the grid (MW).
    pub charge_mw: f64,
    /// Power delivered to the grid (MW).
    pub discharge_mw: f64,
    /// `charge_mw - discharge_mw`.
    pub net_action_mw: f64,
    /// Stored energy at the end of this hour (MWh).
    pub soc_mwh: f64,
    /// Realized profit of this hour.
    pub profit: f64,
    /// Running profit up to and including this hour.
    pub cumulative_profit: f64,
}

impl fmt::Display for ScheduleRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "h={:>4} | price={:>8.2} | charge={:>6.2} MW  discharge={:>6.2} MW  \
             net={:>7.2} MW | SoC={:>7.2} MWh | pnl={:>10.2}  cum={:>12.2}",
            self.hour,
            self.price,
            self.charge_mw,
            self.discharge_mw,
            self.net_action_mw,
            self.soc_mwh,
            self.profit,
            self.cumulative_profit,
        )
    }
}

/// Final product of one run.
///
/// Either fully populated (status `Optimal`, report present) or status-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationResult {
    status: SolveStatus,
    report: Option<DispatchReport>,
}

impl OptimizationResult {
    pub(crate) fn optimal(report: DispatchReport) -> Self {
        Self {
            status: SolveStatus::Optimal,
            report: Some(report),
        }
    }

    pub(crate) fn failed(status: SolveStatus) -> Self {
        debug_assert!(!status.is_optimal());
        Self {
            status,
            report: None,
        }
    }

    pub fn status(&self) -> &SolveStatus {
        &self.status
    }

    /// Schedule and metrics, present only for `Optimal` runs.
    pub fn report(&self) -> Option<&DispatchReport> {
        self.report.as_ref()
    }

    pub fn into_report(self) -> Option<DispatchReport> {
        self.report
    }
}
