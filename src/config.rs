//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dispatch::SolverBackend;
use crate::dispatch::types::{DEFAULT_HORIZON_HOURS, DEFAULT_SEED, SimulationConfig};
use crate::error::ConfigError;
use crate::market::VolatilityProfile;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Battery asset parameters.
    #[serde(default)]
    pub battery: BatteryConfig,
    /// Synthetic market parameters.
    #[serde(default)]
    pub market: MarketConfig,
    /// LP backend selection.
    #[serde(default)]
    pub solver: SolverConfig,
}

/// Battery asset parameters.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    /// Usable energy capacity (MWh).
    pub capacity_mwh: f64,
    /// Charge and discharge power limit (MW).
    pub max_power_mw: f64,
    /// One-way efficiency in (0, 1].
    pub efficiency: f64,
    /// Wear cost per discharged MWh.
    pub degradation_cost_per_mwh: f64,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            capacity_mwh: 50.0,
            max_power_mw: 10.0,
            efficiency: 0.9,
            degradation_cost_per_mwh: 10.0,
        }
    }
}

/// Synthetic market parameters.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarketConfig {
    /// Volatility tag: `"low"`, `"normal"`, `"extreme"` or `"crisis"`.
    pub volatility: String,
    /// Number of hourly steps (must be > 0).
    pub horizon_hours: usize,
    /// Price generator seed.
    pub seed: u64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            volatility: VolatilityProfile::Normal.tag().to_string(),
            horizon_hours: DEFAULT_HORIZON_HOURS,
            seed: DEFAULT_SEED,
        }
    }
}

/// LP backend selection.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    /// Backend tag: `"simplex"` or `"interior-point"`.
    pub backend: String,
    /// Wall-clock limit for one solve (seconds, must be > 0).
    pub timeout_secs: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            backend: SolverBackend::Simplex.tag().to_string(),
            timeout_secs: 120,
        }
    }
}

impl ScenarioConfig {
    /// Returns the baseline scenario: 50 MWh / 10 MW, 90% efficiency, normal market.
    pub fn baseline() -> Self {
        Self {
            battery: BatteryConfig::default(),
            market: MarketConfig::default(),
            solver: SolverConfig::default(),
        }
    }

    /// Returns the calm-market preset: low volatility, cheaper wear.
    pub fn calm() -> Self {
        Self {
            battery: BatteryConfig {
                efficiency: 0.92,
                degradation_cost_per_mwh: 5.0,
                ..BatteryConfig::default()
            },
            market: MarketConfig {
                volatility: VolatilityProfile::Low.tag().to_string(),
                ..MarketConfig::default()
            },
            solver: SolverConfig::default(),
        }
    }

    /// Returns the extreme-market preset: frequent large spikes, faster battery.
    pub fn extreme() -> Self {
        Self {
            battery: BatteryConfig {
                capacity_mwh: 80.0,
                max_power_mw: 20.0,
                degradation_cost_per_mwh: 15.0,
                ..BatteryConfig::default()
            },
            market: MarketConfig {
                volatility: VolatilityProfile::Extreme.tag().to_string(),
                ..MarketConfig::default()
            },
            solver: SolverConfig::default(),
        }
    }

    /// Returns the crisis preset modelled on the February 2021 Texas grid emergency.
    pub fn texas_2021() -> Self {
        Self {
            battery: BatteryConfig {
                capacity_mwh: 100.0,
                max_power_mw: 25.0,
                efficiency: 0.88,
                degradation_cost_per_mwh: 20.0,
            },
            market: MarketConfig {
                volatility: VolatilityProfile::Crisis.tag().to_string(),
                horizon_hours: 14 * 24,
                seed: 2021,
            },
            solver: SolverConfig::default(),
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "calm", "extreme", "texas_2021"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "calm" => Ok(Self::calm()),
            "extreme" => Ok(Self::extreme()),
            "texas_2021" => Ok(Self::texas_2021()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let volatility = self.market.volatility.parse::<VolatilityProfile>();
        let mut errors = self
            .engine_config(volatility.clone().unwrap_or_default())
            .validate();

        if let Err(e) = volatility {
            errors.push(ConfigError::new("market.volatility", e.to_string()));
        }
        if let Err(e) = self.solver.backend.parse::<SolverBackend>() {
            errors.push(ConfigError::new("solver.backend", e.to_string()));
        }
        if self.solver.timeout_secs == 0 {
            errors.push(ConfigError::new("solver.timeout_secs", "must be > 0"));
        }

        errors
    }

    /// Converts the scenario into the engine's run configuration.
    ///
    /// # Errors
    ///
    /// Returns every validation error if the scenario is invalid.
    pub fn to_simulation_config(&self) -> Result<SimulationConfig, Vec<ConfigError>> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(errors);
        }
        let volatility = self
            .market
            .volatility
            .parse::<VolatilityProfile>()
            .map_err(|e| vec![ConfigError::new("market.volatility", e.to_string())])?;
        Ok(self.engine_config(volatility))
    }

    /// Selected LP backend, falling back to simplex for an unknown tag.
    ///
    /// Unknown tags are reported by [`ScenarioConfig::validate`].
    pub fn solver_backend(&self) -> SolverBackend {
        self.solver.backend.parse().unwrap_or_default()
    }

    pub fn solver_timeout(&self) -> Duration {
        Duration::from_secs(self.solver.timeout_secs)
    }

    fn engine_config(&self, volatility: VolatilityProfile) -> SimulationConfig {
        SimulationConfig {
            capacity_mwh: self.battery.capacity_mwh,
            max_power_mw: self.battery.max_power_mw,
            efficiency: self.battery.efficiency,
            degradation_cost: self.battery.degradation_cost_per_mwh,
            volatility,
            horizon_hours: self.market.horizon_hours,
            seed: self.market.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_preset_valid() {
        let cfg = ScenarioConfig::baseline();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
    }

    #[test]
    fn baseline_matches_engine_defaults() {
        let cfg = ScenarioConfig::baseline().to_simulation_config().unwrap();
        assert_eq!(cfg, SimulationConfig::default());
    }

    #[test]
    fn from_preset_unknown() {
        let err = ScenarioConfig::from_preset("nonexistent");
        assert!(err.is_err());
        let e = err.unwrap_err();
        assert!(e.message.contains("unknown preset"));
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[battery]
capacity_mwh = 120.0
max_power_mw = 30.0
efficiency = 0.95
degradation_cost_per_mwh = 4.5

[market]
volatility = "extreme"
horizon_hours = 168
seed = 7

[solver]
backend = "interior-point"
timeout_secs = 30
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.unwrap();
        assert!(cfg.validate().is_empty());
        assert_eq!(cfg.solver_backend(), SolverBackend::InteriorPoint);
        assert_eq!(cfg.solver_timeout(), Duration::from_secs(30));

        let sim = cfg.to_simulation_config().unwrap();
        assert_eq!(sim.capacity_mwh, 120.0);
        assert_eq!(sim.degradation_cost, 4.5);
        assert_eq!(sim.volatility, VolatilityProfile::Extreme);
        assert_eq!(sim.horizon_hours, 168);
        assert_eq!(sim.seed, 7);
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[battery]
capacity_mwh = 10.0
initial_soc = 0.5
"#;
        assert!(ScenarioConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[market]
seed = 99
"#;
        let cfg = ScenarioConfig::from_toml_str(toml).unwrap();
        assert_eq!(cfg.market.seed, 99);
        assert_eq!(cfg.market.horizon_hours, 720);
        assert_eq!(cfg.battery.capacity_mwh, 50.0);
        assert_eq!(cfg.solver.backend, "simplex");
    }

    #[test]
    fn validation_collects_all_errors() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.battery.capacity_mwh = 0.0;
        cfg.battery.efficiency = 1.2;
        cfg.market.volatility = "wild".into();
        cfg.market.horizon_hours = 0;
        cfg.solver.backend = "cplex".into();
        cfg.solver.timeout_secs = 0;

        let fields: Vec<String> = cfg.validate().into_iter().map(|e| e.field).collect();
        for expected in [
            "battery.capacity_mwh",
            "battery.efficiency",
            "market.volatility",
            "market.horizon_hours",
            "solver.backend",
            "solver.timeout_secs",
        ] {
            assert!(fields.iter().any(|f| f == expected), "missing {expected}: {fields:?}");
        }
        assert!(cfg.to_simulation_config().is_err());
    }

    #[test]
    fn negative_degradation_cost_rejected() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.battery.degradation_cost_per_mwh = -1.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "battery.degradation_cost_per_mwh"));
    }

    #[test]
    fn all_presets_are_valid() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn texas_preset_uses_crisis_market() {
        let sim = ScenarioConfig::texas_2021().to_simulation_config().unwrap();
        assert_eq!(sim.volatility, VolatilityProfile::Crisis);
        assert_eq!(sim.volatility.label(), "Crisis (Texas 2021)");
    }

    #[test]
    fn calm_preset_is_quieter_than_baseline() {
        let calm = ScenarioConfig::calm().to_simulation_config().unwrap();
        let base = ScenarioConfig::baseline().to_simulation_config().unwrap();
        assert!(calm.volatility.params().noise_std_dev() < base.volatility.params().noise_std_dev());
    }
}
