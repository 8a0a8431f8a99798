//! Battery energy storage arbitrage: optimal charge/discharge scheduling
//! against a synthetic hourly electricity market.

/// REST API over a finished run (requires `api` feature).
#[cfg(feature = "api")]
pub mod api;
pub mod config;
/// LP model builder, solver adapter, post-processor and run engine.
pub mod dispatch;
pub mod error;
pub mod io;
pub mod market;
pub mod sweep;
