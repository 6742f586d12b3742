//! # Registration Messages — Canonical Issuer Signing
//!
//! Defines the canonical message an issuer signs to attest a warehouse
//! receipt registration, and the verification path that yields the signer
//! address for the allowlist check.
//!
//! ## Message Binding
//!
//! The signed message binds, in one canonical structure:
//!
//! - a versioned signing domain tag (so signatures cannot be replayed
//!   against a different scheme version),
//! - the chain tag of the deployment (so signatures cannot be replayed
//!   across deployments),
//! - the receipt identifier,
//! - the content digest and file locator digest of the receipt,
//! - the issuer address itself.
//!
//! ## Design
//!
//! `verify_registration` is the only place protocol code touches
//! signature primitives. It verifies the bundle and returns the signer
//! [`Address`], mirroring a recover-then-check flow; swapping the curve
//! means swapping this module, not the registry.

use serde::{Deserialize, Serialize};
use wrc_core::{Address, CanonicalBytes, ContentDigest, WrId};

use crate::ed25519::{self, Ed25519PublicKey, Ed25519Signature};
use crate::error::CryptoError;

/// Versioned domain tag for registration signatures.
pub const SIGNING_DOMAIN: &str = "wrc/register-wr/v1";

/// The canonical message an issuer signs when attesting a registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationMessage {
    /// Versioned signing domain, always [`SIGNING_DOMAIN`].
    pub domain: String,
    /// Deployment chain tag, e.g. `"wrc-devnet"`.
    pub chain_tag: String,
    /// The receipt being attested.
    pub wr_id: WrId,
    /// Digest of the receipt's canonical bytes.
    pub content_hash: ContentDigest,
    /// Digest of the off-chain storage pointer.
    pub file_locator_hash: ContentDigest,
    /// The issuer address that must match the signing key.
    pub issuer: Address,
}

impl RegistrationMessage {
    /// Assemble a registration message under the current signing domain.
    pub fn new(
        chain_tag: impl Into<String>,
        wr_id: WrId,
        content_hash: ContentDigest,
        file_locator_hash: ContentDigest,
        issuer: Address,
    ) -> Self {
        Self {
            domain: SIGNING_DOMAIN.to_string(),
            chain_tag: chain_tag.into(),
            wr_id,
            content_hash,
            file_locator_hash,
            issuer,
        }
    }

    /// The canonical bytes signed by the issuer.
    pub fn canonical_bytes(&self) -> Result<CanonicalBytes, CryptoError> {
        Ok(CanonicalBytes::new(self)?)
    }
}

/// A signature bundle presented with a registration.
///
/// Ed25519 has no public-key recovery, so the bundle carries the public
/// key; the signer address is derived from it after verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuerSignature {
    /// The issuer's public key.
    pub public_key: Ed25519PublicKey,
    /// Signature over the canonical registration message.
    pub signature: Ed25519Signature,
}

/// Sign a registration message with an issuer key pair.
pub fn sign_registration(
    keypair: &crate::ed25519::Ed25519KeyPair,
    message: &RegistrationMessage,
) -> Result<IssuerSignature, CryptoError> {
    let bytes = message.canonical_bytes()?;
    Ok(IssuerSignature {
        public_key: keypair.public_key(),
        signature: keypair.sign(&bytes),
    })
}

/// Verify a registration signature and return the signer address.
///
/// Checks that the signature is valid over the canonical message, that
/// the message's `domain` is the current [`SIGNING_DOMAIN`], and that the
/// message's declared issuer matches the signing key's address. The
/// returned address is the identity to check against the issuer
/// allowlist.
pub fn verify_registration(
    message: &RegistrationMessage,
    sig: &IssuerSignature,
) -> Result<Address, CryptoError> {
    if message.domain != SIGNING_DOMAIN {
        return Err(CryptoError::VerificationFailed(format!(
            "unknown signing domain: {:?}",
            message.domain
        )));
    }
    let bytes = message.canonical_bytes()?;
    ed25519::verify(&bytes, &sig.signature, &sig.public_key)?;
    let signer = sig.public_key.to_address();
    if signer != message.issuer {
        return Err(CryptoError::VerificationFailed(format!(
            "signer {signer} does not match declared issuer {}",
            message.issuer
        )));
    }
    Ok(signer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ed25519::Ed25519KeyPair;
    use wrc_core::sha256_digest;

    fn digest(tag: &str) -> ContentDigest {
        sha256_digest(&CanonicalBytes::new(&serde_json::json!({ "tag": tag })).unwrap())
    }

    fn message_for(kp: &Ed25519KeyPair) -> RegistrationMessage {
        RegistrationMessage::new(
            "wrc-devnet",
            WrId::parse("WR-1").unwrap(),
            digest("content"),
            digest("locator"),
            kp.address(),
        )
    }

    #[test]
    fn test_sign_verify_roundtrip_returns_signer() {
        let kp = Ed25519KeyPair::from_seed(&[3u8; 32]);
        let msg = message_for(&kp);
        let sig = sign_registration(&kp, &msg).unwrap();
        let signer = verify_registration(&msg, &sig).unwrap();
        assert_eq!(signer, kp.address());
    }

    #[test]
    fn test_wrong_declared_issuer_rejected() {
        let kp = Ed25519KeyPair::from_seed(&[4u8; 32]);
        let other = Ed25519KeyPair::from_seed(&[5u8; 32]);
        let mut msg = message_for(&kp);
        msg.issuer = other.address();
        // Signature is over the forged message, but the key cannot claim
        // another issuer's address.
        let sig = sign_registration(&kp, &msg).unwrap();
        assert!(verify_registration(&msg, &sig).is_err());
    }

    #[test]
    fn test_tampered_field_rejected() {
        let kp = Ed25519KeyPair::from_seed(&[6u8; 32]);
        let msg = message_for(&kp);
        let sig = sign_registration(&kp, &msg).unwrap();

        let mut tampered = msg.clone();
        tampered.content_hash = digest("other-content");
        assert!(verify_registration(&tampered, &sig).is_err());

        let mut tampered = msg.clone();
        tampered.wr_id = WrId::parse("WR-2").unwrap();
        assert!(verify_registration(&tampered, &sig).is_err());

        let mut tampered = msg;
        tampered.chain_tag = "wrc-mainnet".to_string();
        assert!(verify_registration(&tampered, &sig).is_err());
    }

    #[test]
    fn test_unknown_domain_rejected() {
        let kp = Ed25519KeyPair::from_seed(&[8u8; 32]);
        let mut msg = message_for(&kp);
        msg.domain = "wrc/register-wr/v0".to_string();
        let sig = sign_registration(&kp, &msg).unwrap();
        assert!(verify_registration(&msg, &sig).is_err());
    }

    #[test]
    fn test_signature_from_different_key_rejected() {
        let kp = Ed25519KeyPair::from_seed(&[9u8; 32]);
        let imposter = Ed25519KeyPair::from_seed(&[10u8; 32]);
        let msg = message_for(&kp);
        let mut sig = sign_registration(&kp, &msg).unwrap();
        // Swap in the imposter's key without re-signing.
        sig.public_key = imposter.public_key();
        assert!(verify_registration(&msg, &sig).is_err());
    }

    #[test]
    fn test_bundle_serde_roundtrip() {
        let kp = Ed25519KeyPair::from_seed(&[11u8; 32]);
        let msg = message_for(&kp);
        let sig = sign_registration(&kp, &msg).unwrap();
        let json = serde_json::to_string(&sig).unwrap();
        let parsed: IssuerSignature = serde_json::from_str(&json).unwrap();
        assert_eq!(verify_registration(&msg, &parsed).unwrap(), kp.address());
    }
}
