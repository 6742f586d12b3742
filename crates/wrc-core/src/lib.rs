//! # wrc-core — Foundational Types for the WRC Stack
//!
//! This crate is the bedrock of the warehouse-receipt collateral stack.
//! It defines the type-system primitives the protocol crates build on.
//! Every other crate in the workspace depends on `wrc-core`; it depends
//! on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** `WrId`, `Address`,
//!    `RoundId`, `TokenId`, `Amount`, `EscrowId` — all newtypes with
//!    validated constructors. No bare strings for identifiers.
//!
//! 2. **`CanonicalBytes` newtype.** ALL digest computation and issuer
//!    signing flows through `CanonicalBytes::new()`. No raw
//!    `serde_json::to_vec()` for digests, ever — a non-canonical byte
//!    sequence would fracture attestation-id derivation and signature
//!    verification.
//!
//! 3. **UTC-only timestamps.** `Timestamp` enforces UTC with Z suffix at
//!    seconds precision, and the `Clock` trait keeps deadline logic
//!    testable without sleeping.
//!
//! 4. **`sha256_digest()` accepts only `&CanonicalBytes`.** Compile-time
//!    enforcement that all digest paths flow through canonicalization.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `wrc-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests; poisoned-lock `expect`s
//!   are the one sanctioned exception, since they indicate a bug rather
//!   than a business condition.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, sha256_hex, ContentDigest};
pub use error::{CanonicalizationError, CoreError};
pub use identity::{hex_to_bytes, Address, Amount, EscrowId, RoundId, TokenId, WrId};
pub use temporal::{Clock, ManualClock, SystemClock, Timestamp};
