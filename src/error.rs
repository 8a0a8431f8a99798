//! Error taxonomy shared by the engine stages.

use thiserror::Error;

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"battery.capacity_mwh"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Internal invariant violation. Always a bug, never a user error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelBuildDefect {
    #[error("price series has {actual} hours, configuration expects {expected}")]
    HorizonMismatch { expected: usize, actual: usize },

    #[error("solver returned {actual} values for {expected} variables")]
    ValueCountMismatch { expected: usize, actual: usize },

    #[error("realized profit {realized} does not match solver objective {reported}")]
    ObjectiveMismatch { realized: f64, reported: f64 },

    #[error("energy balance violated at hour {hour} (residual {residual:e})")]
    BalanceViolation { hour: usize, residual: f64 },
}

/// Price value rejected by [`crate::market::PriceSeries::from_values`].
#[derive(Debug, Clone, PartialEq, Error)]
#[error("price at hour {hour} must be finite and >= 0, got {value}")]
pub struct InvalidPrice {
    pub hour: usize,
    pub value: f64,
}

/// Errors that abort a run before a result can be produced.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid configuration: {}", join_errors(.0))]
    Configuration(Vec<ConfigError>),

    #[error("model build defect: {0}")]
    Defect(#[from] ModelBuildDefect),
}

fn join_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
