//! # Proof Registry — One-Time Attestation Consumption
//!
//! Gatekeeper ensuring each oracle attestation is acted upon exactly
//! once, and only while fresh. The consumed set is keyed globally by
//! [`AttestationId`], not per context: an attestation spent to unlock one
//! escrow can never be presented again for another.
//!
//! ## Identifier Derivation
//!
//! Attestation ids are SHA-256 digests over the canonical form of the
//! underlying payload digest plus the oracle round. Two semantically
//! different proofs never collide, while any resubmission of the same
//! payload/round maps to the same id and is rejected as a replay.
//!
//! ## Freshness
//!
//! The mapping from wall-clock time to "current epoch" and the width of
//! the acceptance window are deployment decisions, so both are injected:
//! [`EpochSource`] supplies the current epoch and [`ProofPolicy`] carries
//! `max_age_epochs`. A round satisfying
//! `round + max_age_epochs >= current_epoch` is fresh; anything older is
//! rejected before the replay check.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use wrc_core::{CanonicalBytes, ContentDigest, CoreError, RoundId, Timestamp};

use crate::audit::{AuditEvent, AuditLog};
use crate::error::RegistryError;

/// Versioned domain tag for attestation id derivation.
const ATTESTATION_ID_DOMAIN: &str = "wrc/attestation-id/v1";

/// Identifier of an oracle attestation.
///
/// A digest binding the attested payload and the oracle round. Serializes
/// as a 64-character hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttestationId(ContentDigest);

impl AttestationId {
    /// Derive the attestation id for a payload digest at an oracle round.
    ///
    /// The derivation is deterministic: the same payload and round always
    /// produce the same id, which is what makes the consumed set an
    /// effective replay barrier.
    pub fn derive(payload: &ContentDigest, round: RoundId) -> Result<Self, CoreError> {
        let bytes = CanonicalBytes::new(&serde_json::json!({
            "domain": ATTESTATION_ID_DOMAIN,
            "payload": payload.to_hex(),
            "round": round.value(),
        }))?;
        Ok(Self(wrc_core::sha256_digest(&bytes)))
    }

    /// Wrap an externally supplied attestation digest.
    pub fn from_digest(digest: ContentDigest) -> Self {
        Self(digest)
    }

    /// Parse an attestation id from its hex form.
    pub fn from_hex(hex: &str) -> Result<Self, CoreError> {
        ContentDigest::from_hex(hex).map(Self)
    }

    /// Render the attestation id as lowercase hex.
    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }
}

impl std::fmt::Display for AttestationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "att:{}", self.to_hex())
    }
}

/// The context an attestation applies to — a warehouse receipt id or a
/// data-request identifier, carried through for downstream correlation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextId(String);

impl ContextId {
    /// Validate and wrap a context identifier.
    pub fn parse(s: impl Into<String>) -> Result<Self, CoreError> {
        let s = s.into();
        if s.is_empty() {
            return Err(CoreError::Validation("context id must not be empty".into()));
        }
        Ok(Self(s))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContextId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of the current oracle epoch.
pub trait EpochSource: Send + Sync {
    /// The epoch at the moment of the call.
    fn current_epoch(&self) -> RoundId;
}

/// Maps wall-clock time to epochs of a fixed length.
#[derive(Debug, Clone)]
pub struct SystemEpochSource {
    epoch_secs: u64,
}

impl SystemEpochSource {
    /// Create an epoch source with the given epoch length in seconds.
    pub fn new(epoch_secs: u64) -> Result<Self, CoreError> {
        if epoch_secs == 0 {
            return Err(CoreError::Validation(
                "epoch length must be at least one second".into(),
            ));
        }
        Ok(Self { epoch_secs })
    }
}

impl EpochSource for SystemEpochSource {
    fn current_epoch(&self) -> RoundId {
        let secs = Timestamp::now().epoch_secs().max(0) as u64;
        RoundId(secs / self.epoch_secs)
    }
}

/// An epoch source that only moves when told to. For tests and simulations.
#[derive(Debug, Clone)]
pub struct FixedEpochSource {
    epoch: Arc<RwLock<RoundId>>,
}

impl FixedEpochSource {
    /// Create a source frozen at the given epoch.
    pub fn at(epoch: RoundId) -> Self {
        Self {
            epoch: Arc::new(RwLock::new(epoch)),
        }
    }

    /// Move the source to a specific epoch.
    pub fn set(&self, epoch: RoundId) {
        *self.epoch.write().expect("epoch lock poisoned") = epoch;
    }
}

impl EpochSource for FixedEpochSource {
    fn current_epoch(&self) -> RoundId {
        *self.epoch.read().expect("epoch lock poisoned")
    }
}

/// Freshness policy for proof consumption.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProofPolicy {
    /// How many epochs old a round may be and still be consumed.
    pub max_age_epochs: u64,
}

/// Read-only diagnostic for an attestation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProofStatus {
    /// Whether the attestation has been consumed.
    pub consumed: bool,
    /// Whether the round is outside the freshness window.
    pub expired: bool,
    /// Whether a `consume` call would currently be accepted.
    pub valid: bool,
}

/// The consumed-attestation registry.
///
/// Cloning yields another handle to the same consumed set.
#[derive(Clone)]
pub struct ProofRegistry {
    policy: ProofPolicy,
    epochs: Arc<dyn EpochSource>,
    consumed: Arc<RwLock<HashSet<AttestationId>>>,
    audit: AuditLog,
}

impl ProofRegistry {
    /// Create a proof registry with the given policy and epoch source.
    pub fn new(policy: ProofPolicy, epochs: Arc<dyn EpochSource>, audit: AuditLog) -> Self {
        Self {
            policy,
            epochs,
            consumed: Arc::new(RwLock::new(HashSet::new())),
            audit,
        }
    }

    /// The configured freshness policy.
    pub fn policy(&self) -> ProofPolicy {
        self.policy
    }

    /// Consume an attestation, permanently.
    ///
    /// Rejects stale rounds with `ProofExpired` before the replay check,
    /// and already-consumed ids with `ProofReplayed`. The insert is
    /// atomic: two racing calls on the same id see exactly one success.
    pub fn consume(
        &self,
        attestation_id: AttestationId,
        round: RoundId,
        context: ContextId,
    ) -> Result<(), RegistryError> {
        let current = self.epochs.current_epoch();
        if self.is_expired(round, current) {
            tracing::warn!(%attestation_id, %round, %current, "rejected expired attestation");
            return Err(RegistryError::ProofExpired {
                round,
                current_epoch: current,
                max_age_epochs: self.policy.max_age_epochs,
            });
        }

        {
            let mut consumed = self.consumed.write().expect("proof registry lock poisoned");
            if !consumed.insert(attestation_id) {
                tracing::warn!(%attestation_id, "rejected replayed attestation");
                return Err(RegistryError::ProofReplayed { attestation_id });
            }
        }

        tracing::info!(%attestation_id, %round, context = %context, "attestation consumed");
        self.audit.record(AuditEvent::ProofAccepted {
            attestation_id,
            round,
            context,
        });
        Ok(())
    }

    /// Whether an attestation has been consumed.
    pub fn is_consumed(&self, attestation_id: &AttestationId) -> bool {
        self.consumed
            .read()
            .expect("proof registry lock poisoned")
            .contains(attestation_id)
    }

    /// Read-only diagnostic for an attestation at a given round.
    pub fn status(&self, attestation_id: &AttestationId, round: RoundId) -> ProofStatus {
        let consumed = self.is_consumed(attestation_id);
        let expired = self.is_expired(round, self.epochs.current_epoch());
        ProofStatus {
            consumed,
            expired,
            valid: !consumed && !expired,
        }
    }

    /// Whether `round` falls outside the freshness window at `current`.
    fn is_expired(&self, round: RoundId, current: RoundId) -> bool {
        round
            .value()
            .saturating_add(self.policy.max_age_epochs)
            < current.value()
    }
}
