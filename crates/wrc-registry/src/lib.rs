//! # wrc-registry — Protocol Registries
//!
//! The keyed stores at the heart of the collateral protocol:
//!
//! - **IssuerAuthority** (`authority.rs`): owner-gated allowlist of
//!   addresses permitted to attest registrations.
//! - **WrRegistry** (`wr.rs`): warehouse receipt identity, single-pledge
//!   enforcement, and milestone attestation flags.
//! - **ProofRegistry** (`proof.rs`): one-time consumption of oracle
//!   attestations with epoch-based freshness.
//! - **AuditLog** (`audit.rs`): append-only event log written after every
//!   successful transition, read by external observers.
//!
//! ## Design
//!
//! There is no ambient global state: each registry is an explicit store
//! handle passed to whatever needs it. Handles are cheap clones sharing
//! the same interior store, and every mutation is read-check-write under
//! the store's lock — two racing `pledge` calls on one receipt, or two
//! racing `consume` calls on one attestation, resolve to exactly one
//! success. Reads never observe a partially-applied transition.
//!
//! ## Crate Policy
//!
//! - Every rejected condition is a distinct [`RegistryError`] variant.
//! - No operation is retried internally; `AlreadyPledged` and
//!   `ProofReplayed` can never succeed on retry by definition.
//! - No `panic!()` or `.unwrap()` outside tests, except poisoned-lock
//!   `expect`s, which indicate a bug rather than a business condition.

pub mod audit;
pub mod authority;
pub mod error;
pub mod proof;
pub mod wr;

pub use audit::{AuditEvent, AuditLog, AuditRecord};
pub use authority::IssuerAuthority;
pub use error::RegistryError;
pub use proof::{
    AttestationId, ContextId, EpochSource, FixedEpochSource, ProofPolicy, ProofRegistry,
    ProofStatus, SystemEpochSource,
};
pub use wr::{RegisterWr, WarehouseReceipt, WrRegistry};
