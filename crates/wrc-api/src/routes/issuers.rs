//! # Issuer Allowlist Routes
//!
//! Owner-gated administration of the issuer allowlist. The caller
//! address travels in the request body; a non-owner caller gets 403.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, post};
use axum::{Json, Router};
use serde::Deserialize;
use wrc_core::Address;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddIssuerRequest {
    /// Must be the authority owner.
    pub caller: Address,
    /// The address to authorize.
    pub issuer: Address,
}

#[derive(Debug, Deserialize)]
pub struct RemoveIssuerRequest {
    /// Must be the authority owner.
    pub caller: Address,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(add_issuer))
        .route("/{address}", delete(remove_issuer))
}

async fn add_issuer(
    State(state): State<AppState>,
    Json(req): Json<AddIssuerRequest>,
) -> Result<StatusCode, ApiError> {
    state.authority.add_issuer(req.caller, req.issuer)?;
    Ok(StatusCode::CREATED)
}

async fn remove_issuer(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Json(req): Json<RemoveIssuerRequest>,
) -> Result<StatusCode, ApiError> {
    let issuer = Address::parse(&address)?;
    state.authority.remove_issuer(req.caller, issuer)?;
    Ok(StatusCode::NO_CONTENT)
}
