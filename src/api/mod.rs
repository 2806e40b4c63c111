//! REST API over a completed audit.
//!
//! Provides four GET endpoints:
//! - `/summary`: package totals
//! - `/measures`: per-measure results with optional pass/acceptance filters
//! - `/ranking`: accepted package by reporting group, in report order
//! - `/advisories`: non-fatal conditions noted during the run

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;

use crate::audit::{AuditOutcome, AuditSummary};

/// Immutable application state shared across all request handlers.
///
/// Built once after the audit completes and wrapped in `Arc`; every
/// handler only reads it.
pub struct AppState {
    /// Everything the run produced.
    pub outcome: AuditOutcome,
    /// Package totals.
    pub summary: AuditSummary,
}

impl AppState {
    pub fn new(outcome: AuditOutcome) -> Self {
        let summary = outcome.summary();
        Self { outcome, summary }
    }
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/summary", get(handlers::get_summary))
        .route("/measures", get(handlers::get_measures))
        .route("/ranking", get(handlers::get_ranking))
        .route("/advisories", get(handlers::get_advisories))
        .with_state(state)
}

/// Binds to the given address and serves the API.
///
/// # Panics
///
/// Panics if the TCP listener cannot bind to `addr`.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind to {addr}: {e}"));
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app)
        .await
        .unwrap_or_else(|e| panic!("server error: {e}"));
}
