//! # wrc-api Entry Point
//!
//! Initializes tracing, assembles application state from the
//! environment, and serves the router.
//!
//! Environment:
//! - `WRC_API_ADDR` — bind address (default `127.0.0.1:8080`)
//! - `WRC_CHAIN_TAG` — deployment tag issuer signatures are scoped to
//!   (default `wrc-devnet`)
//! - `WRC_OWNER` — hex address controlling the issuer allowlist (required)
//! - `WRC_EPOCH_SECS` — oracle epoch length in seconds (default `60`)
//! - `WRC_PROOF_MAX_AGE` — freshness window in epochs (default `5`)

use anyhow::Context;
use wrc_api::{router, AppState};
use wrc_core::Address;
use wrc_registry::ProofPolicy;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let addr = std::env::var("WRC_API_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    let chain_tag = std::env::var("WRC_CHAIN_TAG").unwrap_or_else(|_| "wrc-devnet".to_string());
    let owner = std::env::var("WRC_OWNER").context("WRC_OWNER must be set")?;
    let owner = Address::parse(&owner).context("WRC_OWNER is not a valid address")?;
    let epoch_secs = env_u64("WRC_EPOCH_SECS", 60)?;
    let max_age_epochs = env_u64("WRC_PROOF_MAX_AGE", 5)?;

    let state = AppState::with_system_time(
        &chain_tag,
        owner,
        ProofPolicy { max_age_epochs },
        epoch_secs,
    )?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, %chain_tag, "wrc-api listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

fn env_u64(key: &str, default: u64) -> anyhow::Result<u64> {
    match std::env::var(key) {
        Ok(raw) => raw.parse().with_context(|| format!("{key} must be an integer, got {raw:?}")),
        Err(_) => Ok(default),
    }
}
