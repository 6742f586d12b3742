//! # wrc-crypto — Signature Primitives for the WRC Stack
//!
//! Ed25519 issuer keys and the canonical registration-message signing
//! scheme. The protocol crates never touch curve primitives directly:
//! they call [`registration::verify_registration`], which verifies a
//! signature bundle and returns the signer [`wrc_core::Address`] to be
//! checked against the issuer allowlist.
//!
//! ## Crate Policy
//!
//! - Signing and verification accept only `&CanonicalBytes`.
//! - Private keys are never serialized and never appear in `Debug` output.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod ed25519;
pub mod error;
pub mod registration;

pub use ed25519::{verify, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
pub use error::CryptoError;
pub use registration::{
    sign_registration, verify_registration, IssuerSignature, RegistrationMessage, SIGNING_DOMAIN,
};
