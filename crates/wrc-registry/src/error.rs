//! # Registry Errors
//!
//! One variant per rejected condition. Callers must be able to tell
//! "identifier taken" from "issuer not allowed" from "proof already
//! spent" — these are distinct adversarial conditions, never collapsed
//! into a generic failure and never retried internally.

use thiserror::Error;
use wrc_core::{Address, RoundId, WrId};

use crate::proof::AttestationId;

/// Errors raised by the issuer authority, WR registry, and proof registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// A receipt with this identifier is already registered.
    #[error("warehouse receipt {wr_id} is already registered")]
    DuplicateWrId {
        /// The contested identifier.
        wr_id: WrId,
    },

    /// No receipt with this identifier exists.
    #[error("warehouse receipt {wr_id} not found")]
    NotFound {
        /// The missing identifier.
        wr_id: WrId,
    },

    /// The registration signature did not verify.
    #[error("invalid issuer signature: {0}")]
    InvalidSignature(String),

    /// The signature verified, but the signer is not an authorized issuer.
    #[error("issuer {issuer} is not authorized")]
    UnauthorizedIssuer {
        /// The rejected signer address.
        issuer: Address,
    },

    /// The caller is not permitted to perform this operation.
    #[error("caller {caller} is not authorized")]
    Unauthorized {
        /// The rejected caller address.
        caller: Address,
    },

    /// The issuer is already on the allowlist.
    #[error("issuer {issuer} is already listed")]
    IssuerAlreadyListed {
        /// The duplicate address.
        issuer: Address,
    },

    /// The receipt is already pledged to a lender. Pledges are exclusive
    /// and permanent; this is the double-pledge rejection.
    #[error("warehouse receipt {wr_id} is already pledged to {pledged_to}")]
    AlreadyPledged {
        /// The contested receipt.
        wr_id: WrId,
        /// The lender holding the pledge.
        pledged_to: Address,
    },

    /// The receipt milestone is already attested at a different round.
    #[error("warehouse receipt {wr_id} already attested at {attested}, rejected re-attestation at {attempted}")]
    AlreadyAttested {
        /// The contested receipt.
        wr_id: WrId,
        /// The round recorded at first attestation.
        attested: RoundId,
        /// The conflicting round of the rejected call.
        attempted: RoundId,
    },

    /// The attestation has already been consumed.
    #[error("attestation {attestation_id} has already been consumed")]
    ProofReplayed {
        /// The spent attestation.
        attestation_id: AttestationId,
    },

    /// The attestation round is older than the freshness window.
    #[error("attestation round {round} is expired (current epoch {current_epoch}, max age {max_age_epochs} epochs)")]
    ProofExpired {
        /// The stale round.
        round: RoundId,
        /// The epoch at evaluation time.
        current_epoch: RoundId,
        /// The configured freshness window.
        max_age_epochs: u64,
    },

    /// An identifier or value failed validation.
    #[error(transparent)]
    Core(#[from] wrc_core::CoreError),
}
