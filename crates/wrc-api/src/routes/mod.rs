//! # Route Modules
//!
//! Each module defines an Axum router for one API surface area; they
//! are assembled here into the application router.

pub mod audit;
pub mod escrows;
pub mod issuers;
pub mod proofs;
pub mod wrs;

use axum::routing::get;
use axum::{Json, Router};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the application router over shared state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/v1/issuers", issuers::router())
        .nest("/v1/wrs", wrs::router())
        .nest("/v1/proofs", proofs::router())
        .nest("/v1/escrows", escrows::router())
        .nest("/v1/audit", audit::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wrc_core::{
        sha256_digest, Address, Amount, CanonicalBytes, ManualClock, RoundId, Timestamp, TokenId,
    };
    use wrc_registry::{AttestationId, ProofPolicy, FixedEpochSource};
    use wrc_crypto::{sign_registration, Ed25519KeyPair, RegistrationMessage};
    use wrc_core::WrId;

    use crate::state::AppState;

    const CHAIN_TAG: &str = "wrc-devnet";

    fn owner() -> Address {
        Address::from_bytes([0xaa; 20])
    }

    struct TestApp {
        app: Router,
        state: AppState,
        clock: ManualClock,
        epochs: FixedEpochSource,
    }

    fn test_app() -> TestApp {
        let clock = ManualClock::at(Timestamp::parse("2026-03-01T12:00:00Z").unwrap());
        let epochs = FixedEpochSource::at(RoundId(100));
        let state = AppState::new(
            CHAIN_TAG,
            owner(),
            ProofPolicy { max_age_epochs: 5 },
            Arc::new(epochs.clone()),
            Arc::new(clock.clone()),
        );
        TestApp {
            app: super::router(state.clone()),
            state,
            clock,
            epochs,
        }
    }

    async fn send(app: &TestApp, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = match body {
            Some(body) => Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        };
        let response = app.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn digest_hex(tag: &str) -> String {
        sha256_digest(&CanonicalBytes::new(&json!({ "tag": tag })).unwrap()).to_hex()
    }

    fn issuer_key() -> Ed25519KeyPair {
        Ed25519KeyPair::from_seed(&[42u8; 32])
    }

    async fn add_issuer(app: &TestApp, issuer: Address) {
        let (status, _) = send(
            app,
            "POST",
            "/v1/issuers",
            Some(json!({ "caller": owner().to_hex(), "issuer": issuer.to_hex() })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    fn register_body(key: &Ed25519KeyPair, wr_id: &str, sme: Address) -> Value {
        let content = digest_hex("content");
        let locator = digest_hex("locator");
        let message = RegistrationMessage::new(
            CHAIN_TAG,
            WrId::parse(wr_id).unwrap(),
            wrc_core::ContentDigest::from_hex(&content).unwrap(),
            wrc_core::ContentDigest::from_hex(&locator).unwrap(),
            key.address(),
        );
        let sig = sign_registration(key, &message).unwrap();
        json!({
            "wr_id": wr_id,
            "content_hash": content,
            "struct_hash": digest_hex("struct"),
            "file_locator_hash": locator,
            "sme": sme.to_hex(),
            "request_template_hash": digest_hex("template"),
            "signature": serde_json::to_value(&sig).unwrap(),
        })
    }

    async fn register_wr(app: &TestApp, wr_id: &str) {
        let key = issuer_key();
        add_issuer(app, key.address()).await;
        let (status, _) = send(app, "POST", "/v1/wrs", Some(register_body(&key, wr_id, Address::from_bytes([0x01; 20])))).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_health_is_unconditional() {
        let app = test_app();
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_issuer_admin_status_codes() {
        let app = test_app();
        let issuer = Address::from_bytes([0x11; 20]);
        add_issuer(&app, issuer).await;

        // Duplicate add conflicts.
        let (status, body) = send(
            &app,
            "POST",
            "/v1/issuers",
            Some(json!({ "caller": owner().to_hex(), "issuer": issuer.to_hex() })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], 409);

        // Non-owner is forbidden.
        let (status, _) = send(
            &app,
            "POST",
            "/v1/issuers",
            Some(json!({
                "caller": Address::from_bytes([0xbb; 20]).to_hex(),
                "issuer": Address::from_bytes([0x12; 20]).to_hex(),
            })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        // Owner removes via path address.
        let (status, _) = send(
            &app,
            "DELETE",
            &format!("/v1/issuers/{}", issuer.to_hex()),
            Some(json!({ "caller": owner().to_hex() })),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_register_and_get_wr() {
        let app = test_app();
        register_wr(&app, "WR-1").await;

        let (status, body) = send(&app, "GET", "/v1/wrs/WR-1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sme"], Address::from_bytes([0x01; 20]).to_hex());
        assert_eq!(body["pledged_to"], Value::Null);
        assert_eq!(body["attested_wr_issued"], false);

        let (status, _) = send(&app, "GET", "/v1/wrs/WR-unknown", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_register_with_unlisted_issuer_forbidden() {
        let app = test_app();
        // Key never added to the allowlist.
        let rogue = Ed25519KeyPair::from_seed(&[7u8; 32]);
        let (status, _) = send(
            &app,
            "POST",
            "/v1/wrs",
            Some(register_body(&rogue, "WR-1", Address::from_bytes([0x01; 20]))),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_register_with_tampered_signature_unauthorized() {
        let app = test_app();
        let key = issuer_key();
        add_issuer(&app, key.address()).await;
        let mut body = register_body(&key, "WR-1", Address::from_bytes([0x01; 20]));
        // Digest differs from what the issuer signed.
        body["content_hash"] = Value::String(digest_hex("other"));
        let (status, _) = send(&app, "POST", "/v1/wrs", Some(body)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_pledge_conflicts_on_second_lender() {
        let app = test_app();
        register_wr(&app, "WR-1").await;

        let lender = Address::from_bytes([0x20; 20]);
        let (status, body) = send(
            &app,
            "POST",
            "/v1/wrs/WR-1/pledge",
            Some(json!({ "lender": lender.to_hex() })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pledged_to"], lender.to_hex());

        let (status, _) = send(
            &app,
            "POST",
            "/v1/wrs/WR-1/pledge",
            Some(json!({ "lender": Address::from_bytes([0x21; 20]).to_hex() })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_attest_conflicts_on_different_round() {
        let app = test_app();
        register_wr(&app, "WR-1").await;

        let (status, body) =
            send(&app, "POST", "/v1/wrs/WR-1/attest", Some(json!({ "round": 7 }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["attested_wr_issued"], true);

        // Same round is idempotent; a different round conflicts.
        let (status, _) =
            send(&app, "POST", "/v1/wrs/WR-1/attest", Some(json!({ "round": 7 }))).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) =
            send(&app, "POST", "/v1/wrs/WR-1/attest", Some(json!({ "round": 8 }))).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_proof_consume_replay_and_expiry() {
        let app = test_app();
        let payload = sha256_digest(&CanonicalBytes::new(&json!({ "p": 1 })).unwrap());
        let id = AttestationId::derive(&payload, RoundId(100)).unwrap();

        let (status, body) = send(
            &app,
            "POST",
            "/v1/proofs/consume",
            Some(json!({ "attestation_id": id.to_hex(), "round": 100, "context": "WR-1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["consumed"], true);

        // Replay conflicts.
        let (status, _) = send(
            &app,
            "POST",
            "/v1/proofs/consume",
            Some(json!({ "attestation_id": id.to_hex(), "round": 100, "context": "WR-2" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        // A stale round is rejected as validation failure.
        app.epochs.set(RoundId(200));
        let stale = AttestationId::derive(&payload, RoundId(101)).unwrap();
        let (status, _) = send(
            &app,
            "POST",
            "/v1/proofs/consume",
            Some(json!({ "attestation_id": stale.to_hex(), "round": 101, "context": "WR-1" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        // Status is read-only diagnostics.
        let (status, body) = send(
            &app,
            "GET",
            &format!("/v1/proofs/{}/status?round=100", id.to_hex()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["consumed"], true);
        assert_eq!(body["valid"], false);
    }

    #[tokio::test]
    async fn test_escrow_lifecycle_over_http() {
        let app = test_app();
        register_wr(&app, "WR-1").await;
        let lender = Address::from_bytes([0x20; 20]);
        let borrower = Address::from_bytes([0x01; 20]);
        app.state
            .ledger
            .mint(lender, &TokenId::parse("USD").unwrap(), Amount(10_000));

        let (status, body) = send(
            &app,
            "POST",
            "/v1/escrows",
            Some(json!({
                "wr_id": "WR-1",
                "lender": lender.to_hex(),
                "borrower": borrower.to_hex(),
                "token": "USD",
                "amount": 1000,
                "deadline": "2026-03-01T13:00:00Z",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["state"], "Created");
        let escrow_id = body["escrow_id"].as_str().unwrap().to_string();
        let custody = Address::parse(body["custody"].as_str().unwrap()).unwrap();

        // Funding needs the lender's allowance for the custody address.
        app.state
            .ledger
            .approve(lender, custody, &TokenId::parse("USD").unwrap(), Amount(1000));
        let uuid = escrow_id; // EscrowId serializes as the bare UUID
        let (status, body) =
            send(&app, "POST", &format!("/v1/escrows/{uuid}/fund"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "Funded");

        // Release before attestation is a failed precondition.
        let (status, _) =
            send(&app, "POST", &format!("/v1/escrows/{uuid}/release"), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        send(&app, "POST", "/v1/wrs/WR-1/attest", Some(json!({ "round": 7 }))).await;
        let (status, body) =
            send(&app, "POST", &format!("/v1/escrows/{uuid}/release"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "Released");

        // Terminal state conflicts, even after the deadline.
        app.clock.advance_secs(7200);
        let (status, _) =
            send(&app, "POST", &format!("/v1/escrows/{uuid}/refund"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(&app, "GET", &format!("/v1/escrows/{uuid}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "Released");
        assert!(body["released_at"].is_string());
    }

    #[tokio::test]
    async fn test_escrow_unknown_id_not_found() {
        let app = test_app();
        let missing = wrc_core::EscrowId::new();
        let (status, _) = send(
            &app,
            "GET",
            &format!("/v1/escrows/{}", missing.as_uuid()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_audit_snapshot_lists_events_in_order() {
        let app = test_app();
        register_wr(&app, "WR-1").await;
        send(
            &app,
            "POST",
            "/v1/wrs/WR-1/pledge",
            Some(json!({ "lender": Address::from_bytes([0x20; 20]).to_hex() })),
        )
        .await;

        let (status, body) = send(&app, "GET", "/v1/audit", None).await;
        assert_eq!(status, StatusCode::OK);
        let events: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["event"].as_str().unwrap())
            .collect();
        assert_eq!(events, vec!["issuer_added", "wr_registered", "wr_pledged"]);
    }
}
