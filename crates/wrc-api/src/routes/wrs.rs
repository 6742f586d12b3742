//! # Warehouse Receipt Routes
//!
//! Registration, pledging, and milestone attestation. Identifier
//! strings from the path and body are validated here; everything else
//! is delegated to the registry.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use wrc_core::{Address, ContentDigest, RoundId, WrId};
use wrc_crypto::IssuerSignature;
use wrc_registry::{RegisterWr, WarehouseReceipt};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterWrRequest {
    pub wr_id: String,
    pub content_hash: ContentDigest,
    pub struct_hash: ContentDigest,
    pub file_locator_hash: ContentDigest,
    pub sme: Address,
    pub request_template_hash: ContentDigest,
    /// Issuer signature bundle over the canonical registration message.
    pub signature: IssuerSignature,
}

#[derive(Debug, Deserialize)]
pub struct PledgeRequest {
    pub lender: Address,
}

#[derive(Debug, Deserialize)]
pub struct AttestRequest {
    pub round: u64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(register))
        .route("/{wr_id}", get(get_wr))
        .route("/{wr_id}/pledge", post(pledge))
        .route("/{wr_id}/attest", post(attest))
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterWrRequest>,
) -> Result<(StatusCode, Json<WarehouseReceipt>), ApiError> {
    let wr_id = WrId::parse(req.wr_id)?;
    state.wrs.register(
        RegisterWr {
            wr_id: wr_id.clone(),
            content_hash: req.content_hash,
            struct_hash: req.struct_hash,
            file_locator_hash: req.file_locator_hash,
            sme: req.sme,
            request_template_hash: req.request_template_hash,
        },
        &req.signature,
    )?;
    let record = state.wrs.get(&wr_id)?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn get_wr(
    State(state): State<AppState>,
    Path(wr_id): Path<String>,
) -> Result<Json<WarehouseReceipt>, ApiError> {
    let wr_id = WrId::parse(wr_id)?;
    Ok(Json(state.wrs.get(&wr_id)?))
}

async fn pledge(
    State(state): State<AppState>,
    Path(wr_id): Path<String>,
    Json(req): Json<PledgeRequest>,
) -> Result<Json<WarehouseReceipt>, ApiError> {
    let wr_id = WrId::parse(wr_id)?;
    state.wrs.pledge(&wr_id, req.lender)?;
    Ok(Json(state.wrs.get(&wr_id)?))
}

async fn attest(
    State(state): State<AppState>,
    Path(wr_id): Path<String>,
    Json(req): Json<AttestRequest>,
) -> Result<Json<WarehouseReceipt>, ApiError> {
    let wr_id = WrId::parse(wr_id)?;
    state.wrs.mark_attested(&wr_id, RoundId(req.round))?;
    Ok(Json(state.wrs.get(&wr_id)?))
}
