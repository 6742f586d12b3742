//! # Issuer Authority — Registration Allowlist
//!
//! The set of addresses permitted to attest warehouse-receipt
//! registrations. Only the authority owner may change the set; the WR
//! registry consults it on every registration.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use wrc_core::Address;

use crate::audit::{AuditEvent, AuditLog};
use crate::error::RegistryError;

/// Owner-gated allowlist of authorized issuers.
///
/// Cloning yields another handle to the same allowlist.
#[derive(Clone)]
pub struct IssuerAuthority {
    owner: Address,
    issuers: Arc<RwLock<HashSet<Address>>>,
    audit: AuditLog,
}

impl IssuerAuthority {
    /// Create an empty allowlist controlled by `owner`.
    pub fn new(owner: Address, audit: AuditLog) -> Self {
        Self {
            owner,
            issuers: Arc::new(RwLock::new(HashSet::new())),
            audit,
        }
    }

    /// The address that controls the allowlist.
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Add an issuer to the allowlist.
    ///
    /// Only the owner may call this. Adding an address that is already
    /// listed is rejected with `IssuerAlreadyListed`, so callers can tell
    /// a first add from a no-op.
    pub fn add_issuer(&self, caller: Address, issuer: Address) -> Result<(), RegistryError> {
        self.require_owner(caller)?;
        {
            let mut issuers = self.issuers.write().expect("authority lock poisoned");
            if !issuers.insert(issuer) {
                return Err(RegistryError::IssuerAlreadyListed { issuer });
            }
        }
        tracing::info!(%issuer, "issuer added to allowlist");
        self.audit.record(AuditEvent::IssuerAdded { issuer });
        Ok(())
    }

    /// Remove an issuer from the allowlist.
    ///
    /// Only the owner may call this. Removing an absent address is a
    /// silent no-op and records no event.
    pub fn remove_issuer(&self, caller: Address, issuer: Address) -> Result<(), RegistryError> {
        self.require_owner(caller)?;
        let removed = self
            .issuers
            .write()
            .expect("authority lock poisoned")
            .remove(&issuer);
        if removed {
            tracing::info!(%issuer, "issuer removed from allowlist");
            self.audit.record(AuditEvent::IssuerRemoved { issuer });
        }
        Ok(())
    }

    /// Whether an address is currently authorized to register receipts.
    pub fn is_authorized(&self, issuer: &Address) -> bool {
        self.issuers
            .read()
            .expect("authority lock poisoned")
            .contains(issuer)
    }

    fn require_owner(&self, caller: Address) -> Result<(), RegistryError> {
        if caller != self.owner {
            tracing::warn!(%caller, "rejected allowlist change from non-owner");
            return Err(RegistryError::Unauthorized { caller });
        }
        Ok(())
    }
}
