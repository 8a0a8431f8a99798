//! Read-only REST API over a finished optimization run.
//!
//! Provides two GET endpoints:
//! - `/summary`: run status, objective, headline metrics and configuration
//! - `/schedule`: hourly dispatch rows with optional range filtering

mod handlers;
mod types;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;

use crate::dispatch::{OptimizationResult, SimulationConfig};

pub use types::{ErrorResponse, ScheduleQuery, SummaryResponse};

/// Immutable application state shared across all request handlers.
///
/// Constructed once after the run completes and wrapped in `Arc`; no locks
/// are needed since all data is read-only.
pub struct AppState {
    /// Configuration the run was made with.
    pub config: SimulationConfig,
    /// Outcome of the run, status-only if the solve failed.
    pub result: OptimizationResult,
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/summary", get(handlers::get_summary))
        .route("/schedule", get(handlers::get_schedule))
        .with_state(state)
}

/// Binds to the given address and serves the API until the process exits.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind to `addr` or the
/// server stops with an error.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
