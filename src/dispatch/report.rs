//! Post-processing of solved variable values into a schedule and economic metrics.

use std::fmt;
use std::ops::Range;

use serde::Serialize;

use super::model::VariableLayout;
use super::types::{DispatchSchedule, ScheduleRow, SimulationConfig};
use crate::error::ModelBuildDefect;
use crate::market::{PriceSeries, VolatilityProfile};

/// Capital cost assumed for the ROI estimate (currency per MWh of capacity).
pub const ASSUMED_CAPEX_PER_MWH: f64 = 150_000.0;

/// Hours shown by the zoomed schedule view unless the caller asks otherwise.
pub const DEFAULT_ZOOM_HOURS: usize = 72;

/// Absolute tolerance for the energy balance check (MWh).
const BALANCE_TOLERANCE: f64 = 1e-6;

/// Relative tolerance for the realized-vs-reported objective check.
const OBJECTIVE_TOLERANCE: f64 = 1e-6;

/// Schedule, profit curves and headline metrics of an optimal run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchReport {
    objective: f64,
    prices: Vec<f64>,
    schedule: DispatchSchedule,
    hourly_profit: Vec<f64>,
    cumulative_profit: Vec<f64>,
    cycles_used: u64,
    estimated_roi_pct: f64,
    volatility: VolatilityProfile,
}

impl DispatchReport {
    /// Builds the report from the solver's raw variable values.
    ///
    /// The balance and objective checks run on the values as returned. The
    /// published schedule then snaps values lying within `1e-6` outside
    /// their bounds onto the bound, so interior-point round-off never shows
    /// up as a slightly negative charge.
    ///
    /// # Arguments
    ///
    /// * `config` - Configuration the program was built from
    /// * `prices` - Price series the program was built from
    /// * `layout` - Variable layout of the program
    /// * `values` - One value per variable, indexed by the layout
    /// * `objective` - Objective value reported by the solver adapter
    ///
    /// # Errors
    ///
    /// Returns a [`ModelBuildDefect`] if the value count does not match the
    /// layout, the energy balance is violated by more than `1e-6` MWh at any
    /// hour, or the summed hourly profit differs from `objective` by more
    /// than `1e-6 * max(1, |objective|)`.
    pub fn from_solution(
        config: &SimulationConfig,
        prices: &PriceSeries,
        layout: VariableLayout,
        values: &[f64],
        objective: f64,
    ) -> Result<Self, ModelBuildDefect> {
        if prices.len() != layout.horizon() {
            return Err(ModelBuildDefect::HorizonMismatch {
                expected: layout.horizon(),
                actual: prices.len(),
            });
        }
        let (charge, discharge, soc) = layout.split(values)?;

        check_balance(charge, discharge, soc, config.efficiency)?;

        let realized = realized_profit(prices.as_slice(), charge, discharge, config.degradation_cost);
        if (realized - objective).abs() > OBJECTIVE_TOLERANCE * objective.abs().max(1.0) {
            return Err(ModelBuildDefect::ObjectiveMismatch {
                realized,
                reported: objective,
            });
        }

        let schedule = DispatchSchedule::new(
            snap_to_bounds(charge, config.max_power_mw),
            snap_to_bounds(discharge, config.max_power_mw),
            snap_to_bounds(soc, config.capacity_mwh),
        );

        let hourly_profit: Vec<f64> = prices
            .as_slice()
            .iter()
            .zip(schedule.charge().iter().zip(schedule.discharge()))
            .map(|(&p, (&c, &d))| d * p - c * p - config.degradation_cost * d)
            .collect();

        let cumulative_profit: Vec<f64> = hourly_profit
            .iter()
            .scan(0.0, |acc, &x| {
                *acc += x;
                Some(*acc)
            })
            .collect();

        let cycles = (schedule.total_discharge() / config.capacity_mwh).floor();
        let cycles_used = if cycles > 0.0 { cycles as u64 } else { 0 };
        let estimated_roi_pct =
            net_profit(&cumulative_profit) / (config.capacity_mwh * ASSUMED_CAPEX_PER_MWH) * 100.0;

        Ok(Self {
            objective,
            prices: prices.as_slice().to_vec(),
            schedule,
            hourly_profit,
            cumulative_profit,
            cycles_used,
            estimated_roi_pct,
            volatility: config.volatility,
        })
    }

    /// Objective value reported by the solver.
    pub fn objective(&self) -> f64 {
        self.objective
    }

    pub fn schedule(&self) -> &DispatchSchedule {
        &self.schedule
    }

    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    pub fn hourly_profit(&self) -> &[f64] {
        &self.hourly_profit
    }

    pub fn cumulative_profit(&self) -> &[f64] {
        &self.cumulative_profit
    }

    /// Final value of the cumulative profit curve.
    pub fn net_profit(&self) -> f64 {
        net_profit(&self.cumulative_profit)
    }

    /// Whole number of full-capacity discharges, rounded down.
    pub fn cycles_used(&self) -> u64 {
        self.cycles_used
    }

    pub fn estimated_roi_pct(&self) -> f64 {
        self.estimated_roi_pct
    }

    pub fn horizon(&self) -> usize {
        self.schedule.horizon()
    }

    /// Presentation row for hour `t`.
    pub fn row(&self, t: usize) -> ScheduleRow {
        ScheduleRow {
            hour: t,
            price: self.prices[t],
            charge_mw: self.schedule.charge()[t],
            discharge_mw: self.schedule.discharge()[t],
            net_action_mw: self.schedule.net_action(t),
            soc_mwh: self.schedule.state_of_charge()[t + 1],
            profit: self.hourly_profit[t],
            cumulative_profit: self.cumulative_profit[t],
        }
    }

    /// Every hour of the horizon.
    pub fn rows(&self) -> Vec<ScheduleRow> {
        self.window(0..self.horizon())
    }

    /// Hours in `range`, clipped to the horizon.
    pub fn window(&self, range: Range<usize>) -> Vec<ScheduleRow> {
        let end = range.end.min(self.horizon());
        (range.start.min(end)..end).map(|t| self.row(t)).collect()
    }

    /// Headline metrics.
    pub fn summary(&self) -> Summary {
        Summary {
            net_profit: self.net_profit(),
            cycles_used: self.cycles_used,
            estimated_roi_pct: self.estimated_roi_pct,
            volatility: self.volatility.label().to_string(),
        }
    }
}

fn net_profit(cumulative_profit: &[f64]) -> f64 {
    cumulative_profit.last().copied().unwrap_or(0.0)
}

fn realized_profit(prices: &[f64], charge: &[f64], discharge: &[f64], wear: f64) -> f64 {
    prices
        .iter()
        .zip(charge.iter().zip(discharge))
        .map(|(&p, (&c, &d))| d * p - c * p - wear * d)
        .sum()
}

/// Moves values at most `BALANCE_TOLERANCE` outside `[0, upper]` onto the bound.
fn snap_to_bounds(values: &[f64], upper: f64) -> Vec<f64> {
    values
        .iter()
        .map(|&v| {
            if (-BALANCE_TOLERANCE..0.0).contains(&v) {
                0.0
            } else if v > upper && v <= upper + BALANCE_TOLERANCE {
                upper
            } else {
                v
            }
        })
        .collect()
}

fn check_balance(
    charge: &[f64],
    discharge: &[f64],
    soc: &[f64],
    efficiency: f64,
) -> Result<(), ModelBuildDefect> {
    if soc[0].abs() > BALANCE_TOLERANCE {
        return Err(ModelBuildDefect::BalanceViolation {
            hour: 0,
            residual: soc[0],
        });
    }
    for t in 0..charge.len() {
        let residual = soc[t + 1] - soc[t] - efficiency * charge[t] + discharge[t] / efficiency;
        if residual.abs() > BALANCE_TOLERANCE {
            return Err(ModelBuildDefect::BalanceViolation { hour: t, residual });
        }
    }
    Ok(())
}

/// Metrics row shown next to the schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub net_profit: f64,
    pub cycles_used: u64,
    pub estimated_roi_pct: f64,
    /// Display label of the volatility preset.
    pub volatility: String,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Dispatch Summary ---")?;
        writeln!(f, "Net profit:            {:.2}", self.net_profit)?;
        writeln!(f, "Cycles used:           {}", self.cycles_used)?;
        writeln!(f, "Estimated ROI:         {:.4}%", self.estimated_roi_pct)?;
        write!(f, "Market volatility:     {}", self.volatility)
    }
}
