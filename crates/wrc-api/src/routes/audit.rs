//! # Audit Log Routes
//!
//! Read-only snapshot of the append-only protocol event log.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use wrc_registry::AuditRecord;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(snapshot))
}

async fn snapshot(State(state): State<AppState>) -> Json<Vec<AuditRecord>> {
    Json(state.audit.snapshot())
}
