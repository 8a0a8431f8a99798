use std::ops::Range;

use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::StandardNormal;

use super::profile::ProfileParams;
use crate::error::InvalidPrice;

/// Seed offset for the spike stream so it never shares a sequence with the noise stream.
const SPIKE_SEED_OFFSET: u64 = 0x5EED;

/// Average price level of the diurnal curve (currency/MWh).
const BASE_LEVEL: f64 = 50.0;

/// Amplitude of the diurnal curve (currency/MWh).
const DIURNAL_AMPLITUDE: f64 = 30.0;

/// Ordered, non-negative hourly prices for one run.
///
/// Generated once and never modified afterwards; index `t` is the price of hour `t`.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    prices: Vec<f64>,
}

impl PriceSeries {
    /// Generates a synthetic price series.
    ///
    /// Each hour starts from the diurnal curve
    /// `50 + 30 * sin((hour_of_day - 6) * pi / 12)`, receives Gaussian noise with
    /// standard deviation `params.noise_std_dev()`, and with probability
    /// `params.spike_probability()` an additional `params.spike_magnitude()`.
    /// Prices are clamped at zero.
    ///
    /// Noise is drawn from a `StdRng` seeded with `seed` through the Ziggurat
    /// `StandardNormal` sampler. Spikes come from a second `StdRng` seeded with
    /// `seed + 0x5EED`, one Bernoulli trial per hour. Identical arguments always
    /// produce an identical series.
    ///
    /// # Arguments
    ///
    /// * `horizon_hours` - Number of hourly prices to produce
    /// * `params` - Noise and spike parameters of the volatility preset
    /// * `seed` - Random seed owned by the run
    pub fn generate(horizon_hours: usize, params: ProfileParams, seed: u64) -> Self {
        let mut noise_rng = StdRng::seed_from_u64(seed);
        let mut spike_rng = StdRng::seed_from_u64(seed.wrapping_add(SPIKE_SEED_OFFSET));

        let prices = (0..horizon_hours)
            .map(|t| {
                let z: f64 = noise_rng.sample(StandardNormal);
                let noise = z * params.noise_std_dev();
                let spike = if spike_rng.random_bool(params.spike_probability()) {
                    params.spike_magnitude()
                } else {
                    0.0
                };
                (diurnal_base(t) + noise + spike).max(0.0)
            })
            .collect();

        Self { prices }
    }

    /// Wraps externally supplied prices.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPrice`] for the first negative or non-finite value.
    pub fn from_values(prices: Vec<f64>) -> Result<Self, InvalidPrice> {
        if let Some((hour, &value)) = prices
            .iter()
            .enumerate()
            .find(|(_, p)| !p.is_finite() || **p < 0.0)
        {
            return Err(InvalidPrice { hour, value });
        }
        Ok(Self { prices })
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.prices
    }

    /// Prices for the hours in `range`, clipped to the series length.
    pub fn window(&self, range: Range<usize>) -> &[f64] {
        let end = range.end.min(self.prices.len());
        let start = range.start.min(end);
        &self.prices[start..end]
    }

    /// Largest gain from buying at one hour and selling at a strictly later hour.
    ///
    /// Returns 0 when prices never rise. With a wear cost above this value no
    /// cycle can pay for itself.
    pub fn max_forward_spread(&self) -> f64 {
        let mut cheapest = f64::INFINITY;
        let mut best = 0.0_f64;
        for &p in &self.prices {
            best = best.max(p - cheapest);
            cheapest = cheapest.min(p);
        }
        best
    }
}

/// Deterministic diurnal price curve, peaking mid-afternoon.
fn diurnal_base(t: usize) -> f64 {
    let hour_of_day = (t % 24) as f64;
    BASE_LEVEL + DIURNAL_AMPLITUDE * ((hour_of_day - 6.0) * std::f64::consts::PI / 12.0).sin()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::market::VolatilityProfile;

    fn quiet() -> ProfileParams {
        ProfileParams::new(0.0, 0.0, 0.0).unwrap()
    }

    #[test]
    fn same_seed_same_series() {
        let params = VolatilityProfile::Extreme.params();
        let a = PriceSeries::generate(720, params, 7);
        let b = PriceSeries::generate(720, params, 7);
        assert_eq!(a, b);
    }

    #[test]
    fn different_seed_different_series() {
        let params = VolatilityProfile::Normal.params();
        let a = PriceSeries::generate(48, params, 1);
        let b = PriceSeries::generate(48, params, 2);
        assert_ne!(a, b);
    }

    #[test]
    fn length_matches_horizon() {
        let series = PriceSeries::generate(97, VolatilityProfile::Low.params(), 42);
        assert_eq!(series.len(), 97);
    }

    #[test]
    fn prices_never_negative() {
        // Crisis noise (sigma = 50) regularly pushes the night trough below zero.
        let series = PriceSeries::generate(2000, VolatilityProfile::Crisis.params(), 3);
        assert!(series.as_slice().iter().all(|&p| p >= 0.0));
    }

    #[test]
    fn noiseless_series_follows_diurnal_curve() {
        let series = PriceSeries::generate(24, quiet(), 0);
        let p = series.as_slice();
        assert_relative_eq!(p[6], 50.0, epsilon = 1e-9);
        assert_relative_eq!(p[12], 80.0, epsilon = 1e-9);
        assert_relative_eq!(p[18], 50.0, epsilon = 1e-9);
        assert_relative_eq!(p[0], 20.0, epsilon = 1e-9);
    }

    #[test]
    fn certain_spikes_lift_every_hour() {
        let params = ProfileParams::new(0.0, 1.0, 100.0).unwrap();
        let series = PriceSeries::generate(24, params, 0);
        let base = PriceSeries::generate(24, quiet(), 0);
        for (s, b) in series.as_slice().iter().zip(base.as_slice()) {
            assert_relative_eq!(*s, b + 100.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn from_values_rejects_negative() {
        let err = PriceSeries::from_values(vec![1.0, -0.5, 3.0]).unwrap_err();
        assert_eq!(err.hour, 1);
    }

    #[test]
    fn from_values_rejects_nan() {
        assert!(PriceSeries::from_values(vec![f64::NAN]).is_err());
    }

    #[test]
    fn window_clips_to_length() {
        let series = PriceSeries::from_values(vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(series.window(1..10), &[2.0, 3.0]);
        assert!(series.window(5..10).is_empty());
    }

    #[test]
    fn forward_spread_ignores_backward_moves() {
        let series = PriceSeries::from_values(vec![100.0, 10.0, 40.0, 5.0]).unwrap();
        assert_relative_eq!(series.max_forward_spread(), 30.0);

        let falling = PriceSeries::from_values(vec![9.0, 5.0, 1.0]).unwrap();
        assert_eq!(falling.max_forward_spread(), 0.0);
    }
}
