//! # Warehouse Receipt Registry
//!
//! Single source of truth for receipt identity, pledge exclusivity, and
//! milestone attestation flags.
//!
//! ## Invariants
//!
//! - A receipt id is registered at most once; records are never deleted.
//! - `pledged_to` is set exactly once and never changes afterwards. Two
//!   pledges on the same receipt cannot both succeed — this is the
//!   double-pledge prevention the protocol exists for.
//! - `attested_wr_issued` transitions false→true exactly once. Re-marking
//!   with the same round is an idempotent success; re-marking with a
//!   different round is rejected to keep the audit trail immutable.
//!
//! All mutations are read-check-write under one lock over the record map,
//! so no interleaving is visible to other callers on the same receipt.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use wrc_core::{Address, ContentDigest, RoundId, Timestamp, WrId};
use wrc_crypto::{verify_registration, IssuerSignature, RegistrationMessage};

use crate::audit::{AuditEvent, AuditLog};
use crate::authority::IssuerAuthority;
use crate::error::RegistryError;

/// A registered warehouse receipt.
///
/// Append-only audit record: created by registration, mutated only by
/// the one-shot `pledge` and `mark_attested` transitions, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseReceipt {
    /// Unique receipt identifier.
    pub wr_id: WrId,
    /// Digest of the receipt's canonical bytes.
    pub content_hash: ContentDigest,
    /// Digest of the normalized structured representation.
    pub struct_hash: ContentDigest,
    /// Digest of the off-chain storage pointer (e.g. a file CID).
    pub file_locator_hash: ContentDigest,
    /// The borrower/beneficiary the receipt belongs to.
    pub sme: Address,
    /// The authorized issuer whose signature admitted the registration.
    pub issuer: Address,
    /// Digest of the data-request template the registration is bound to,
    /// so later proofs can be checked against the same template.
    pub request_template_hash: ContentDigest,
    /// The lender holding the pledge, if any. Set exactly once.
    pub pledged_to: Option<Address>,
    /// Whether the "WR issued" milestone has been attested.
    pub attested_wr_issued: bool,
    /// The oracle round the milestone was attested at.
    pub attested_round: Option<RoundId>,
    /// When the receipt was registered.
    pub registered_at: Timestamp,
}

/// The fields a registering party submits alongside the issuer signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterWr {
    /// Unique receipt identifier.
    pub wr_id: WrId,
    /// Digest of the receipt's canonical bytes.
    pub content_hash: ContentDigest,
    /// Digest of the normalized structured representation.
    pub struct_hash: ContentDigest,
    /// Digest of the off-chain storage pointer.
    pub file_locator_hash: ContentDigest,
    /// The borrower/beneficiary.
    pub sme: Address,
    /// Digest of the bound data-request template.
    pub request_template_hash: ContentDigest,
}

/// The warehouse receipt registry.
///
/// Cloning yields another handle to the same record store.
#[derive(Clone)]
pub struct WrRegistry {
    chain_tag: String,
    authority: IssuerAuthority,
    records: Arc<RwLock<HashMap<WrId, WarehouseReceipt>>>,
    audit: AuditLog,
}

impl WrRegistry {
    /// Create an empty registry bound to an issuer authority.
    ///
    /// `chain_tag` scopes issuer signatures to this deployment.
    pub fn new(chain_tag: impl Into<String>, authority: IssuerAuthority, audit: AuditLog) -> Self {
        Self {
            chain_tag: chain_tag.into(),
            authority,
            records: Arc::new(RwLock::new(HashMap::new())),
            audit,
        }
    }

    /// The deployment tag issuer signatures are scoped to.
    pub fn chain_tag(&self) -> &str {
        &self.chain_tag
    }

    /// Register a warehouse receipt.
    ///
    /// The issuer signature must verify over the canonical registration
    /// message for this deployment, and the signer must be on the issuer
    /// allowlist. The new record starts unpledged and unattested.
    pub fn register(&self, req: RegisterWr, sig: &IssuerSignature) -> Result<(), RegistryError> {
        let issuer = sig.public_key.to_address();
        let message = RegistrationMessage::new(
            self.chain_tag.clone(),
            req.wr_id.clone(),
            req.content_hash,
            req.file_locator_hash,
            issuer,
        );
        let signer = verify_registration(&message, sig).map_err(|e| {
            tracing::warn!(wr_id = %req.wr_id, "rejected registration with bad signature");
            RegistryError::InvalidSignature(e.to_string())
        })?;
        if !self.authority.is_authorized(&signer) {
            tracing::warn!(wr_id = %req.wr_id, %signer, "rejected registration from unlisted issuer");
            return Err(RegistryError::UnauthorizedIssuer { issuer: signer });
        }

        {
            let mut records = self.records.write().expect("wr registry lock poisoned");
            if records.contains_key(&req.wr_id) {
                return Err(RegistryError::DuplicateWrId { wr_id: req.wr_id });
            }
            records.insert(
                req.wr_id.clone(),
                WarehouseReceipt {
                    wr_id: req.wr_id.clone(),
                    content_hash: req.content_hash,
                    struct_hash: req.struct_hash,
                    file_locator_hash: req.file_locator_hash,
                    sme: req.sme,
                    issuer: signer,
                    request_template_hash: req.request_template_hash,
                    pledged_to: None,
                    attested_wr_issued: false,
                    attested_round: None,
                    registered_at: Timestamp::now(),
                },
            );
        }

        tracing::info!(wr_id = %req.wr_id, %signer, "warehouse receipt registered");
        self.audit.record(AuditEvent::WrRegistered {
            wr_id: req.wr_id,
            issuer: signer,
            sme: req.sme,
        });
        Ok(())
    }

    /// Pledge a receipt to a lender.
    ///
    /// Succeeds at most once per receipt; any later call fails
    /// `AlreadyPledged` and leaves the pledge unchanged.
    pub fn pledge(&self, wr_id: &WrId, lender: Address) -> Result<(), RegistryError> {
        {
            let mut records = self.records.write().expect("wr registry lock poisoned");
            let record = records.get_mut(wr_id).ok_or_else(|| RegistryError::NotFound {
                wr_id: wr_id.clone(),
            })?;
            if let Some(pledged_to) = record.pledged_to {
                tracing::warn!(%wr_id, %pledged_to, "rejected double pledge");
                return Err(RegistryError::AlreadyPledged {
                    wr_id: wr_id.clone(),
                    pledged_to,
                });
            }
            record.pledged_to = Some(lender);
        }

        tracing::info!(%wr_id, %lender, "warehouse receipt pledged");
        self.audit.record(AuditEvent::WrPledged {
            wr_id: wr_id.clone(),
            lender,
        });
        Ok(())
    }

    /// Mark the "WR issued" milestone attested at an oracle round.
    ///
    /// Idempotent for the same round; a different round after attestation
    /// is rejected with `AlreadyAttested`.
    pub fn mark_attested(&self, wr_id: &WrId, round: RoundId) -> Result<(), RegistryError> {
        {
            let mut records = self.records.write().expect("wr registry lock poisoned");
            let record = records.get_mut(wr_id).ok_or_else(|| RegistryError::NotFound {
                wr_id: wr_id.clone(),
            })?;
            if record.attested_wr_issued {
                return match record.attested_round {
                    Some(attested) if attested == round => Ok(()),
                    Some(attested) => {
                        tracing::warn!(%wr_id, %attested, attempted = %round, "rejected conflicting re-attestation");
                        Err(RegistryError::AlreadyAttested {
                            wr_id: wr_id.clone(),
                            attested,
                            attempted: round,
                        })
                    }
                    // attested flag without a round indicates a bug, not
                    // a business condition.
                    None => unreachable!("attested receipt without a round"),
                };
            }
            record.attested_wr_issued = true;
            record.attested_round = Some(round);
        }

        tracing::info!(%wr_id, %round, "milestone attested");
        self.audit.record(AuditEvent::MilestoneAttested {
            wr_id: wr_id.clone(),
            round,
        });
        Ok(())
    }

    /// Fetch a receipt by id.
    pub fn get(&self, wr_id: &WrId) -> Result<WarehouseReceipt, RegistryError> {
        self.records
            .read()
            .expect("wr registry lock poisoned")
            .get(wr_id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound {
                wr_id: wr_id.clone(),
            })
    }

    /// Whether a receipt is pledged. Unregistered ids read as unpledged.
    pub fn is_pledged(&self, wr_id: &WrId) -> bool {
        self.records
            .read()
            .expect("wr registry lock poisoned")
            .get(wr_id)
            .is_some_and(|r| r.pledged_to.is_some())
    }

    /// Whether a receipt's milestone is attested. Unregistered ids read
    /// as unattested.
    pub fn is_attested(&self, wr_id: &WrId) -> bool {
        self.records
            .read()
            .expect("wr registry lock poisoned")
            .get(wr_id)
            .is_some_and(|r| r.attested_wr_issued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wrc_core::{sha256_digest, CanonicalBytes};
    use wrc_crypto::{sign_registration, Ed25519KeyPair};

    const CHAIN_TAG: &str = "wrc-devnet";

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    fn digest(tag: &str) -> ContentDigest {
        sha256_digest(&CanonicalBytes::new(&serde_json::json!({ "tag": tag })).unwrap())
    }

    struct Fixture {
        registry: WrRegistry,
        audit: AuditLog,
        issuer_key: Ed25519KeyPair,
    }

    fn fixture() -> Fixture {
        let audit = AuditLog::new();
        let authority = IssuerAuthority::new(addr(0xaa), audit.clone());
        let issuer_key = Ed25519KeyPair::from_seed(&[42u8; 32]);
        authority.add_issuer(addr(0xaa), issuer_key.address()).unwrap();
        Fixture {
            registry: WrRegistry::new(CHAIN_TAG, authority, audit.clone()),
            audit,
            issuer_key,
        }
    }

    fn request(wr_id: &str) -> RegisterWr {
        RegisterWr {
            wr_id: WrId::parse(wr_id).unwrap(),
            content_hash: digest("content"),
            struct_hash: digest("struct"),
            file_locator_hash: digest("locator"),
            sme: addr(0x01),
            request_template_hash: digest("template"),
        }
    }

    fn signed(fixture: &Fixture, req: &RegisterWr) -> IssuerSignature {
        let message = RegistrationMessage::new(
            CHAIN_TAG,
            req.wr_id.clone(),
            req.content_hash,
            req.file_locator_hash,
            fixture.issuer_key.address(),
        );
        sign_registration(&fixture.issuer_key, &message).unwrap()
    }

    fn register(fixture: &Fixture, wr_id: &str) -> WrId {
        let req = request(wr_id);
        let sig = signed(fixture, &req);
        fixture.registry.register(req.clone(), &sig).unwrap();
        req.wr_id
    }

    #[test]
    fn test_register_then_get_roundtrip() {
        let f = fixture();
        let req = request("WR-1");
        let sig = signed(&f, &req);
        f.registry.register(req.clone(), &sig).unwrap();

        let record = f.registry.get(&req.wr_id).unwrap();
        assert_eq!(record.content_hash, req.content_hash);
        assert_eq!(record.struct_hash, req.struct_hash);
        assert_eq!(record.file_locator_hash, req.file_locator_hash);
        assert_eq!(record.request_template_hash, req.request_template_hash);
        assert_eq!(record.sme, req.sme);
        assert_eq!(record.issuer, f.issuer_key.address());
        assert_eq!(record.pledged_to, None);
        assert!(!record.attested_wr_issued);
        assert_eq!(record.attested_round, None);
    }

    #[test]
    fn test_duplicate_wr_id_rejected() {
        let f = fixture();
        register(&f, "WR-1");
        let req = request("WR-1");
        let sig = signed(&f, &req);
        match f.registry.register(req, &sig).unwrap_err() {
            RegistryError::DuplicateWrId { wr_id } => assert_eq!(wr_id.as_str(), "WR-1"),
            other => panic!("expected DuplicateWrId, got: {other}"),
        }
    }

    #[test]
    fn test_unlisted_issuer_rejected() {
        let f = fixture();
        let rogue = Ed25519KeyPair::from_seed(&[7u8; 32]);
        let req = request("WR-1");
        let message = RegistrationMessage::new(
            CHAIN_TAG,
            req.wr_id.clone(),
            req.content_hash,
            req.file_locator_hash,
            rogue.address(),
        );
        let sig = sign_registration(&rogue, &message).unwrap();
        match f.registry.register(req.clone(), &sig).unwrap_err() {
            RegistryError::UnauthorizedIssuer { issuer } => assert_eq!(issuer, rogue.address()),
            other => panic!("expected UnauthorizedIssuer, got: {other}"),
        }
        assert!(f.registry.get(&req.wr_id).is_err());
    }

    #[test]
    fn test_tampered_request_fails_signature() {
        let f = fixture();
        let req = request("WR-1");
        let sig = signed(&f, &req);
        // Content digest differs from what the issuer signed.
        let mut tampered = req;
        tampered.content_hash = digest("other-content");
        match f.registry.register(tampered, &sig).unwrap_err() {
            RegistryError::InvalidSignature(_) => {}
            other => panic!("expected InvalidSignature, got: {other}"),
        }
    }

    #[test]
    fn test_pledge_is_exclusive() {
        let f = fixture();
        let wr_id = register(&f, "WR-1");
        f.registry.pledge(&wr_id, addr(0x10)).unwrap();
        assert!(f.registry.is_pledged(&wr_id));

        match f.registry.pledge(&wr_id, addr(0x11)).unwrap_err() {
            RegistryError::AlreadyPledged { pledged_to, .. } => {
                assert_eq!(pledged_to, addr(0x10));
            }
            other => panic!("expected AlreadyPledged, got: {other}"),
        }
        // The original pledge is untouched.
        assert_eq!(f.registry.get(&wr_id).unwrap().pledged_to, Some(addr(0x10)));
    }

    #[test]
    fn test_pledge_missing_receipt() {
        let f = fixture();
        let wr_id = WrId::parse("WR-missing").unwrap();
        assert!(matches!(
            f.registry.pledge(&wr_id, addr(0x10)),
            Err(RegistryError::NotFound { .. })
        ));
        assert!(!f.registry.is_pledged(&wr_id));
    }

    #[test]
    fn test_mark_attested_once_then_idempotent() {
        let f = fixture();
        let wr_id = register(&f, "WR-1");
        assert!(!f.registry.is_attested(&wr_id));

        f.registry.mark_attested(&wr_id, RoundId(7)).unwrap();
        assert!(f.registry.is_attested(&wr_id));
        assert_eq!(f.registry.get(&wr_id).unwrap().attested_round, Some(RoundId(7)));

        // Same round: idempotent success, no second event.
        let events_before = f.audit.len();
        f.registry.mark_attested(&wr_id, RoundId(7)).unwrap();
        assert_eq!(f.audit.len(), events_before);
    }

    #[test]
    fn test_conflicting_round_rejected() {
        let f = fixture();
        let wr_id = register(&f, "WR-1");
        f.registry.mark_attested(&wr_id, RoundId(7)).unwrap();
        match f.registry.mark_attested(&wr_id, RoundId(8)).unwrap_err() {
            RegistryError::AlreadyAttested { attested, attempted, .. } => {
                assert_eq!(attested, RoundId(7));
                assert_eq!(attempted, RoundId(8));
            }
            other => panic!("expected AlreadyAttested, got: {other}"),
        }
        // The original round stands.
        assert_eq!(f.registry.get(&wr_id).unwrap().attested_round, Some(RoundId(7)));
    }

    #[test]
    fn test_mark_attested_missing_receipt() {
        let f = fixture();
        assert!(matches!(
            f.registry.mark_attested(&WrId::parse("WR-missing").unwrap(), RoundId(1)),
            Err(RegistryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_reads_on_unregistered_ids() {
        let f = fixture();
        let wr_id = WrId::parse("WR-unknown").unwrap();
        assert!(!f.registry.is_pledged(&wr_id));
        assert!(!f.registry.is_attested(&wr_id));
        assert!(f.registry.get(&wr_id).is_err());
    }

    #[test]
    fn test_audit_trail_of_lifecycle() {
        let f = fixture();
        let wr_id = register(&f, "WR-1");
        f.registry.pledge(&wr_id, addr(0x10)).unwrap();
        f.registry.mark_attested(&wr_id, RoundId(3)).unwrap();

        let events: Vec<_> = f.audit.snapshot().into_iter().map(|r| r.event).collect();
        // IssuerAdded from the fixture, then the receipt lifecycle.
        assert!(matches!(events[0], AuditEvent::IssuerAdded { .. }));
        assert!(matches!(events[1], AuditEvent::WrRegistered { .. }));
        assert!(matches!(events[2], AuditEvent::WrPledged { .. }));
        assert!(matches!(events[3], AuditEvent::MilestoneAttested { .. }));
    }

    #[test]
    fn test_concurrent_pledge_exactly_one_winner() {
        let f = fixture();
        let wr_id = register(&f, "WR-raced");

        let handles: Vec<_> = (0..8u8)
            .map(|i| {
                let registry = f.registry.clone();
                let wr_id = wr_id.clone();
                std::thread::spawn(move || registry.pledge(&wr_id, addr(i)).is_ok())
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&ok| ok)
            .count();
        assert_eq!(successes, 1);
        assert!(f.registry.is_pledged(&wr_id));
    }
}
