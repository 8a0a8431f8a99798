//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::AppState;
use super::types::{ErrorResponse, ScheduleQuery, SummaryResponse};
use crate::dispatch::ScheduleRow;

/// Returns run status, objective, metrics and configuration.
///
/// `GET /summary` → 200 + `SummaryResponse` JSON
pub async fn get_summary(State(state): State<Arc<AppState>>) -> Json<SummaryResponse> {
    let report = state.result.report();
    Json(SummaryResponse {
        status: state.result.status().clone(),
        objective: report.map(|r| r.objective()),
        metrics: report.map(|r| r.summary()),
        horizon_hours: state.config.horizon_hours,
        config: state.config.clone(),
    })
}

/// Returns hourly schedule rows, optionally filtered by hour range.
///
/// `GET /schedule` → 200 + `Vec<ScheduleRow>` JSON
/// `GET /schedule?from=N&to=M` → filtered range (inclusive)
/// `GET /schedule?from=10&to=5` → 400 + `ErrorResponse`
/// No schedule (failed solve) → 404 + `ErrorResponse`
pub async fn get_schedule(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ScheduleQuery>,
) -> impl IntoResponse {
    let from = query.from.unwrap_or(0);
    let to = query.to.unwrap_or(usize::MAX);

    if from > to {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("`from` ({from}) must be <= `to` ({to})"),
            }),
        ));
    }

    let Some(report) = state.result.report() else {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("run produced no schedule (status: {})", state.result.status()),
            }),
        ));
    };

    let rows: Vec<ScheduleRow> = report.window(from..to.saturating_add(1));
    Ok(Json(rows))
}
