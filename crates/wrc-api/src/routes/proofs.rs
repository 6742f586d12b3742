//! # Proof Consumption Routes
//!
//! One-time consumption of oracle attestations, plus a read-only status
//! probe. Status never consumes.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use wrc_core::RoundId;
use wrc_registry::{AttestationId, ContextId, ProofStatus};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ConsumeRequest {
    /// Attestation id as 64-char hex.
    pub attestation_id: String,
    pub round: u64,
    /// The receipt or data-request the proof applies to.
    pub context: String,
}

#[derive(Debug, Serialize)]
pub struct ConsumeResponse {
    pub attestation_id: String,
    pub consumed: bool,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub round: u64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/consume", post(consume))
        .route("/{attestation_id}/status", get(status))
}

async fn consume(
    State(state): State<AppState>,
    Json(req): Json<ConsumeRequest>,
) -> Result<Json<ConsumeResponse>, ApiError> {
    let attestation_id = AttestationId::from_hex(&req.attestation_id)?;
    let context = ContextId::parse(req.context)?;
    state
        .proofs
        .consume(attestation_id, RoundId(req.round), context)?;
    Ok(Json(ConsumeResponse {
        attestation_id: attestation_id.to_hex(),
        consumed: true,
    }))
}

async fn status(
    State(state): State<AppState>,
    Path(attestation_id): Path<String>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<ProofStatus>, ApiError> {
    let attestation_id = AttestationId::from_hex(&attestation_id)?;
    Ok(Json(
        state.proofs.status(&attestation_id, RoundId(query.round)),
    ))
}
