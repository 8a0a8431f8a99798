//! API response and query types.

use serde::{Deserialize, Serialize};

use crate::dispatch::{SimulationConfig, SolveStatus, Summary};

/// Run overview: status, objective and metrics (when optimal) and configuration.
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub status: SolveStatus,
    /// Solver objective, absent for failed solves.
    pub objective: Option<f64>,
    /// Headline metrics, absent for failed solves.
    pub metrics: Option<Summary>,
    pub horizon_hours: usize,
    pub config: SimulationConfig,
}

/// Optional range query parameters for the schedule endpoint.
#[derive(Debug, Deserialize)]
pub struct ScheduleQuery {
    /// First hour (inclusive).
    pub from: Option<usize>,
    /// Last hour (inclusive).
    pub to: Option<usize>,
}

/// Error response body for 4xx errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}
