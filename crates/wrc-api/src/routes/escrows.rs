//! # Escrow Lifecycle Routes
//!
//! Create, fund, release, and refund milestone escrows. Every mutation
//! returns the post-transition snapshot so clients never need a second
//! read to learn the outcome.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use wrc_core::{Address, Amount, EscrowId, Timestamp, TokenId, WrId};
use wrc_escrow::{EscrowSnapshot, EscrowTerms};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateEscrowRequest {
    pub wr_id: String,
    pub lender: Address,
    pub borrower: Address,
    pub token: String,
    pub amount: u128,
    /// RFC 3339 with Z suffix.
    pub deadline: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/{id}", get(get_escrow))
        .route("/{id}/fund", post(fund))
        .route("/{id}/release", post(release))
        .route("/{id}/refund", post(refund))
}

async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateEscrowRequest>,
) -> Result<(StatusCode, Json<EscrowSnapshot>), ApiError> {
    let terms = EscrowTerms {
        wr_id: WrId::parse(req.wr_id)?,
        lender: req.lender,
        borrower: req.borrower,
        token: TokenId::parse(req.token)?,
        amount: Amount(req.amount),
        deadline: Timestamp::parse(&req.deadline)?,
    };
    let escrow_id = state.escrows.open(
        terms,
        state.wrs.clone(),
        Arc::new(state.ledger.clone()),
        state.clock.clone(),
        state.audit.clone(),
    )?;
    Ok((StatusCode::CREATED, Json(state.escrows.snapshot(&escrow_id)?)))
}

async fn get_escrow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EscrowSnapshot>, ApiError> {
    let escrow_id = EscrowId::parse(&id)?;
    Ok(Json(state.escrows.snapshot(&escrow_id)?))
}

async fn fund(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EscrowSnapshot>, ApiError> {
    let escrow_id = EscrowId::parse(&id)?;
    state.escrows.fund(&escrow_id)?;
    Ok(Json(state.escrows.snapshot(&escrow_id)?))
}

async fn release(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EscrowSnapshot>, ApiError> {
    let escrow_id = EscrowId::parse(&id)?;
    state.escrows.release(&escrow_id)?;
    Ok(Json(state.escrows.snapshot(&escrow_id)?))
}

async fn refund(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EscrowSnapshot>, ApiError> {
    let escrow_id = EscrowId::parse(&id)?;
    state.escrows.refund(&escrow_id)?;
    Ok(Json(state.escrows.snapshot(&escrow_id)?))
}
