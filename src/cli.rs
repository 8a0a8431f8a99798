//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use bess_arbitrage::config::ScenarioConfig;
use bess_arbitrage::error::ConfigError;

#[derive(Parser, Debug)]
#[command(name = "bess-arbitrage", author, version, propagate_version = true)]
#[command(about = "Battery storage arbitrage: optimal charge/discharge schedule against hourly prices")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Optimize one scenario and print the schedule and summary metrics.
    Run(RunArgs),

    /// Re-solve one price series for several wear costs.
    Sweep(SweepArgs),

    /// List built-in scenario presets, volatility profiles and solver backends.
    Presets,
}

/// Where the scenario comes from, plus per-field overrides.
#[derive(Args, Debug, Clone, Default)]
pub struct ScenarioArgs {
    /// Load scenario from a TOML file.
    #[arg(long, conflicts_with = "preset")]
    pub scenario: Option<PathBuf>,

    /// Use a built-in preset (see `presets`). Defaults to `baseline`.
    #[arg(long)]
    pub preset: Option<String>,

    /// Override the price generator seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override the volatility profile (low, normal, extreme, crisis).
    #[arg(long)]
    pub volatility: Option<String>,

    /// Override the horizon length in hours.
    #[arg(long)]
    pub horizon_hours: Option<usize>,

    /// Override battery capacity (MWh).
    #[arg(long)]
    pub capacity_mwh: Option<f64>,

    /// Override charge/discharge power limit (MW).
    #[arg(long)]
    pub max_power_mw: Option<f64>,

    /// Override one-way efficiency.
    #[arg(long)]
    pub efficiency: Option<f64>,

    /// Override wear cost per discharged MWh.
    #[arg(long)]
    pub degradation_cost: Option<f64>,

    /// Override the LP backend (simplex, interior-point).
    #[arg(long)]
    pub solver: Option<String>,

    /// Override the solve time limit in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

impl ScenarioArgs {
    /// Loads the scenario source and applies every override.
    ///
    /// The result is not validated; call [`ScenarioConfig::validate`].
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or parsed, or the
    /// preset name is unknown.
    pub fn load(&self) -> Result<ScenarioConfig, ConfigError> {
        let mut scenario = match (&self.scenario, &self.preset) {
            (Some(path), _) => ScenarioConfig::from_toml_file(path)?,
            (None, Some(name)) => ScenarioConfig::from_preset(name)?,
            (None, None) => ScenarioConfig::baseline(),
        };

        if let Some(seed) = self.seed {
            scenario.market.seed = seed;
        }
        if let Some(ref volatility) = self.volatility {
            scenario.market.volatility.clone_from(volatility);
        }
        if let Some(hours) = self.horizon_hours {
            scenario.market.horizon_hours = hours;
        }
        if let Some(v) = self.capacity_mwh {
            scenario.battery.capacity_mwh = v;
        }
        if let Some(v) = self.max_power_mw {
            scenario.battery.max_power_mw = v;
        }
        if let Some(v) = self.efficiency {
            scenario.battery.efficiency = v;
        }
        if let Some(v) = self.degradation_cost {
            scenario.battery.degradation_cost_per_mwh = v;
        }
        if let Some(ref backend) = self.solver {
            scenario.solver.backend.clone_from(backend);
        }
        if let Some(secs) = self.timeout_secs {
            scenario.solver.timeout_secs = secs;
        }

        Ok(scenario)
    }
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub scenario: ScenarioArgs,

    /// Number of leading hours shown in the schedule table.
    #[arg(long, default_value_t = bess_arbitrage::dispatch::report::DEFAULT_ZOOM_HOURS)]
    pub zoom_hours: usize,

    /// Print every hour instead of the zoomed window.
    #[arg(long)]
    pub full: bool,

    /// Export the hourly schedule to CSV.
    #[arg(long)]
    pub schedule_out: Option<PathBuf>,

    /// Start the REST API after the run.
    #[cfg(feature = "api")]
    #[arg(long)]
    pub serve: bool,

    /// API server port.
    #[cfg(feature = "api")]
    #[arg(long, default_value_t = 3000)]
    pub port: u16,
}

#[derive(Args, Debug)]
pub struct SweepArgs {
    #[command(flatten)]
    pub scenario: ScenarioArgs,

    /// Comma-separated wear costs to evaluate.
    #[arg(
        long,
        value_delimiter = ',',
        default_values_t = vec![0.0, 5.0, 10.0, 20.0, 30.0, 50.0]
    )]
    pub costs: Vec<f64>,
}
