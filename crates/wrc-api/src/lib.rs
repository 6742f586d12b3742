//! # wrc-api — Axum API Service
//!
//! HTTP surface for the WRC Stack, built on Axum/Tower/Tokio. One
//! router over shared in-memory state:
//!
//! - `/v1/issuers/*` — issuer allowlist administration
//! - `/v1/wrs/*` — receipt registration, pledge, attestation
//! - `/v1/proofs/*` — one-time proof consumption and status
//! - `/v1/escrows/*` — escrow lifecycle
//! - `/v1/audit` — protocol event log
//! - `/health` — liveness (unauthenticated)
//!
//! ## Crate Policy
//!
//! - Sits at the top of the dependency DAG — depends on all other crates.
//! - No business logic in route handlers — handlers validate boundary
//!   input and delegate to the domain crates.
//! - All errors map to structured HTTP responses via [`ApiError`].

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
