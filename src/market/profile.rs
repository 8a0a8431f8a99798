//! Volatility presets for the synthetic market.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Noise and spike parameters of one volatility preset.
///
/// Only obtainable from [`VolatilityProfile::params`] or the checked
/// [`ProfileParams::new`], so every instance is safe to sample from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfileParams {
    noise_std_dev: f64,
    spike_probability: f64,
    spike_magnitude: f64,
}

impl ProfileParams {
    /// Custom market parameters.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidProfileParams`] unless the noise and spike size are
    /// finite and >= 0 and the spike probability lies in `[0, 1]`.
    pub fn new(
        noise_std_dev: f64,
        spike_probability: f64,
        spike_magnitude: f64,
    ) -> Result<Self, InvalidProfileParams> {
        if !(noise_std_dev.is_finite() && noise_std_dev >= 0.0) {
            return Err(InvalidProfileParams::new("noise_std_dev", noise_std_dev));
        }
        if !(0.0..=1.0).contains(&spike_probability) {
            return Err(InvalidProfileParams::new("spike_probability", spike_probability));
        }
        if !(spike_magnitude.is_finite() && spike_magnitude >= 0.0) {
            return Err(InvalidProfileParams::new("spike_magnitude", spike_magnitude));
        }
        Ok(Self {
            noise_std_dev,
            spike_probability,
            spike_magnitude,
        })
    }

    /// Standard deviation of the hourly Gaussian noise (currency/MWh).
    pub fn noise_std_dev(&self) -> f64 {
        self.noise_std_dev
    }

    /// Probability that any given hour carries a price spike.
    pub fn spike_probability(&self) -> f64 {
        self.spike_probability
    }

    /// Amount added to the price of a spiking hour (currency/MWh).
    pub fn spike_magnitude(&self) -> f64 {
        self.spike_magnitude
    }
}

/// Market parameter rejected by [`ProfileParams::new`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid market parameter {field}: {value}")]
pub struct InvalidProfileParams {
    pub field: &'static str,
    pub value: f64,
}

impl InvalidProfileParams {
    fn new(field: &'static str, value: f64) -> Self {
        Self { field, value }
    }
}

/// Named market volatility preset.
///
/// The set is closed: every variant maps to exactly one [`ProfileParams`]
/// through [`VolatilityProfile::params`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolatilityProfile {
    Low,
    #[default]
    Normal,
    Extreme,
    Crisis,
}

impl VolatilityProfile {
    /// All presets, calmest first.
    pub const ALL: [Self; 4] = [Self::Low, Self::Normal, Self::Extreme, Self::Crisis];

    /// Returns the noise and spike parameters for this preset.
    pub const fn params(self) -> ProfileParams {
        match self {
            Self::Low => ProfileParams {
                noise_std_dev: 5.0,
                spike_probability: 0.01,
                spike_magnitude: 50.0,
            },
            Self::Normal => ProfileParams {
                noise_std_dev: 10.0,
                spike_probability: 0.05,
                spike_magnitude: 200.0,
            },
            Self::Extreme => ProfileParams {
                noise_std_dev: 25.0,
                spike_probability: 0.10,
                spike_magnitude: 500.0,
            },
            Self::Crisis => ProfileParams {
                noise_std_dev: 50.0,
                spike_probability: 0.20,
                spike_magnitude: 2000.0,
            },
        }
    }

    /// Short machine tag used in scenario files and on the command line.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::Extreme => "extreme",
            Self::Crisis => "crisis",
        }
    }

    /// Human-readable label shown next to the summary metrics.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Normal => "Normal",
            Self::Extreme => "Extreme",
            Self::Crisis => "Crisis (Texas 2021)",
        }
    }
}

impl fmt::Display for VolatilityProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a volatility tag does not name a preset.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown volatility profile \"{0}\", expected one of: low, normal, extreme, crisis")]
pub struct UnknownProfile(pub String);

impl FromStr for VolatilityProfile {
    type Err = UnknownProfile;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.tag().eq_ignore_ascii_case(needle) || p.label().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownProfile(s.to_string()))
    }
}
