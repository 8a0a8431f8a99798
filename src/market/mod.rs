//! Synthetic electricity market: volatility presets and hourly price generation.

pub mod prices;
pub mod profile;

pub use prices::PriceSeries;
pub use profile::{InvalidProfileParams, ProfileParams, UnknownProfile, VolatilityProfile};
