//! # Milestone Escrow State Machine
//!
//! Per-loan custody of lender funds, gated by the attested milestone of
//! the backing warehouse receipt.
//!
//! ## States
//!
//! ```text
//! Created ──fund()──▶ Funded ──release()──▶ Released (terminal)
//!                        │
//!                     refund()  (only after the deadline)
//!                        ▼
//!                    Refunded (terminal)
//! ```
//!
//! ## Design Decision
//!
//! The state machine uses an enum with validated transitions rather than
//! typestate types: an escrow lives in a keyed store shared with an API
//! surface, so its concrete type cannot change per state. `fund`,
//! `release`, and `refund` reject invalid transitions at runtime with
//! errors naming the exact unmet precondition, and a rejected call leaves
//! every field untouched. The token transfer resolves before any state
//! field is mutated — a failed transfer aborts the transition.

use std::sync::{Arc, RwLock};
use std::collections::HashMap;

use serde::Serialize;
use sha2::{Digest, Sha256};
use wrc_core::{Address, Amount, Clock, EscrowId, Timestamp, TokenId, WrId};
use wrc_registry::{AuditEvent, AuditLog, WrRegistry};

use crate::error::EscrowError;
use crate::token::TokenLedger;

/// The lifecycle state of a milestone escrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EscrowState {
    /// Created but not yet funded.
    Created,
    /// Lender funds held in custody.
    Funded,
    /// Funds paid out to the borrower (terminal).
    Released,
    /// Funds returned to the lender after the deadline (terminal).
    Refunded,
}

impl EscrowState {
    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Released | Self::Refunded)
    }
}

impl std::fmt::Display for EscrowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Created => "CREATED",
            Self::Funded => "FUNDED",
            Self::Released => "RELEASED",
            Self::Refunded => "REFUNDED",
        };
        f.write_str(s)
    }
}

/// The immutable terms an escrow is opened with.
#[derive(Debug, Clone, Serialize)]
pub struct EscrowTerms {
    /// The warehouse receipt backing the loan.
    pub wr_id: WrId,
    /// The funding lender.
    pub lender: Address,
    /// The borrower paid on release.
    pub borrower: Address,
    /// The fungible asset the escrow settles in.
    pub token: TokenId,
    /// The escrowed amount, fixed at creation.
    pub amount: Amount,
    /// Absolute deadline after which the lender may reclaim funds.
    pub deadline: Timestamp,
}

/// Point-in-time view of an escrow for callers and the API surface.
#[derive(Debug, Clone, Serialize)]
pub struct EscrowSnapshot {
    /// The escrow identifier.
    pub escrow_id: EscrowId,
    /// The terms the escrow was opened with.
    #[serde(flatten)]
    pub terms: EscrowTerms,
    /// The custody address funds sit at while escrowed.
    pub custody: Address,
    /// Current lifecycle state.
    pub state: EscrowState,
    /// When the escrow was created.
    pub created_at: Timestamp,
    /// When funding landed, if it has.
    pub funded_at: Option<Timestamp>,
    /// When funds were released, if they were.
    pub released_at: Option<Timestamp>,
    /// When funds were refunded, if they were.
    pub refunded_at: Option<Timestamp>,
}

/// A per-loan milestone escrow.
///
/// Holds handles to the WR registry it checks milestones against and the
/// token ledger it moves funds on; both are fixed at creation.
pub struct MilestoneEscrow {
    escrow_id: EscrowId,
    terms: EscrowTerms,
    custody: Address,
    state: EscrowState,
    created_at: Timestamp,
    funded_at: Option<Timestamp>,
    released_at: Option<Timestamp>,
    refunded_at: Option<Timestamp>,
    registry: WrRegistry,
    ledger: Arc<dyn TokenLedger>,
    clock: Arc<dyn Clock>,
    audit: AuditLog,
}

impl MilestoneEscrow {
    /// Open an escrow under the given terms.
    ///
    /// Validates `amount > 0`, `deadline > now`, and `lender != borrower`.
    pub fn open(
        terms: EscrowTerms,
        registry: WrRegistry,
        ledger: Arc<dyn TokenLedger>,
        clock: Arc<dyn Clock>,
        audit: AuditLog,
    ) -> Result<Self, EscrowError> {
        if terms.amount.is_zero() {
            return Err(EscrowError::ZeroAmount);
        }
        let now = clock.now();
        if terms.deadline <= now {
            return Err(EscrowError::DeadlineInPast {
                deadline: terms.deadline,
                now,
            });
        }
        if terms.lender == terms.borrower {
            return Err(EscrowError::LenderIsBorrower {
                address: terms.lender,
            });
        }

        let escrow_id = EscrowId::new();
        let escrow = Self {
            escrow_id,
            custody: custody_address(&escrow_id),
            state: EscrowState::Created,
            created_at: now,
            funded_at: None,
            released_at: None,
            refunded_at: None,
            terms,
            registry,
            ledger,
            clock,
            audit,
        };

        tracing::info!(escrow_id = %escrow.escrow_id, wr_id = %escrow.terms.wr_id, "escrow created");
        escrow.audit.record(AuditEvent::EscrowCreated {
            escrow_id: escrow.escrow_id,
            wr_id: escrow.terms.wr_id.clone(),
            lender: escrow.terms.lender,
            borrower: escrow.terms.borrower,
            amount: escrow.terms.amount,
            deadline: escrow.terms.deadline,
        });
        Ok(escrow)
    }

    /// Pull the escrowed amount from the lender into custody.
    ///
    /// Legal only in `Created`. A rejected token transfer aborts the
    /// transition with `TransferFailed` and the state stays `Created`.
    pub fn fund(&mut self) -> Result<(), EscrowError> {
        if self.state != EscrowState::Created {
            return Err(EscrowError::InvalidState {
                state: self.state,
                operation: "fund",
            });
        }
        self.ledger.transfer_from(
            self.terms.lender,
            self.custody,
            &self.terms.token,
            self.terms.amount,
        )?;
        self.state = EscrowState::Funded;
        self.funded_at = Some(self.clock.now());

        tracing::info!(escrow_id = %self.escrow_id, amount = %self.terms.amount, "escrow funded");
        self.audit.record(AuditEvent::EscrowFunded {
            escrow_id: self.escrow_id,
        });
        Ok(())
    }

    /// Pay the escrowed amount to the borrower.
    ///
    /// Legal only in `Funded`, and only once the backing receipt's
    /// milestone is attested in the WR registry.
    pub fn release(&mut self) -> Result<(), EscrowError> {
        match self.state {
            EscrowState::Funded => {}
            EscrowState::Created => {
                return Err(EscrowError::NotFunded { state: self.state });
            }
            EscrowState::Released | EscrowState::Refunded => {
                return Err(EscrowError::InvalidState {
                    state: self.state,
                    operation: "release",
                });
            }
        }
        if !self.registry.is_attested(&self.terms.wr_id) {
            return Err(EscrowError::MilestoneNotAttested {
                wr_id: self.terms.wr_id.clone(),
            });
        }
        self.ledger.transfer(
            self.custody,
            self.terms.borrower,
            &self.terms.token,
            self.terms.amount,
        )?;
        self.state = EscrowState::Released;
        self.released_at = Some(self.clock.now());

        tracing::info!(escrow_id = %self.escrow_id, borrower = %self.terms.borrower, "escrow released");
        self.audit.record(AuditEvent::EscrowReleased {
            escrow_id: self.escrow_id,
        });
        Ok(())
    }

    /// Return the escrowed amount to the lender.
    ///
    /// Legal only in `Funded`, and only strictly after the deadline.
    pub fn refund(&mut self) -> Result<(), EscrowError> {
        match self.state {
            EscrowState::Funded => {}
            EscrowState::Created => {
                return Err(EscrowError::NotFunded { state: self.state });
            }
            EscrowState::Released | EscrowState::Refunded => {
                return Err(EscrowError::InvalidState {
                    state: self.state,
                    operation: "refund",
                });
            }
        }
        let now = self.clock.now();
        if now <= self.terms.deadline {
            return Err(EscrowError::DeadlineNotPassed {
                deadline: self.terms.deadline,
                now,
            });
        }
        self.ledger.transfer(
            self.custody,
            self.terms.lender,
            &self.terms.token,
            self.terms.amount,
        )?;
        self.state = EscrowState::Refunded;
        self.refunded_at = Some(now);

        tracing::info!(escrow_id = %self.escrow_id, lender = %self.terms.lender, "escrow refunded");
        self.audit.record(AuditEvent::EscrowRefunded {
            escrow_id: self.escrow_id,
        });
        Ok(())
    }

    /// The escrow identifier.
    pub fn escrow_id(&self) -> EscrowId {
        self.escrow_id
    }

    /// The current lifecycle state.
    pub fn state(&self) -> EscrowState {
        self.state
    }

    /// Whether funds are currently in custody.
    pub fn is_funded(&self) -> bool {
        self.state == EscrowState::Funded
    }

    /// Whether funds were paid to the borrower.
    pub fn is_released(&self) -> bool {
        self.state == EscrowState::Released
    }

    /// Whether funds were returned to the lender.
    pub fn is_refunded(&self) -> bool {
        self.state == EscrowState::Refunded
    }

    /// Whether the refund deadline has passed.
    pub fn is_deadline_passed(&self) -> bool {
        self.clock.now() > self.terms.deadline
    }

    /// Seconds until the deadline; zero once it has passed.
    pub fn time_until_deadline(&self) -> i64 {
        self.clock.now().secs_until(self.terms.deadline)
    }

    /// Point-in-time view of the escrow.
    pub fn snapshot(&self) -> EscrowSnapshot {
        EscrowSnapshot {
            escrow_id: self.escrow_id,
            terms: self.terms.clone(),
            custody: self.custody,
            state: self.state,
            created_at: self.created_at,
            funded_at: self.funded_at,
            released_at: self.released_at,
            refunded_at: self.refunded_at,
        }
    }
}

/// Derive the custody address for an escrow from its identifier.
fn custody_address(escrow_id: &EscrowId) -> Address {
    let hash = Sha256::digest(escrow_id.as_uuid().as_bytes());
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&hash[12..]);
    Address::from_bytes(addr)
}

/// Keyed store of escrows, one per loan.
///
/// Mutating calls run the transition under the store lock, so a
/// transition is atomic with respect to every other caller of the same
/// escrow. Cloning yields another handle to the same store.
#[derive(Clone, Default)]
pub struct EscrowBook {
    escrows: Arc<RwLock<HashMap<EscrowId, MilestoneEscrow>>>,
}

impl EscrowBook {
    /// Create an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an escrow and add it to the book.
    pub fn open(
        &self,
        terms: EscrowTerms,
        registry: WrRegistry,
        ledger: Arc<dyn TokenLedger>,
        clock: Arc<dyn Clock>,
        audit: AuditLog,
    ) -> Result<EscrowId, EscrowError> {
        let escrow = MilestoneEscrow::open(terms, registry, ledger, clock, audit)?;
        let escrow_id = escrow.escrow_id();
        self.escrows
            .write()
            .expect("escrow book lock poisoned")
            .insert(escrow_id, escrow);
        Ok(escrow_id)
    }

    /// Fund an escrow by id.
    pub fn fund(&self, escrow_id: &EscrowId) -> Result<(), EscrowError> {
        self.with_escrow(escrow_id, MilestoneEscrow::fund)
    }

    /// Release an escrow by id.
    pub fn release(&self, escrow_id: &EscrowId) -> Result<(), EscrowError> {
        self.with_escrow(escrow_id, MilestoneEscrow::release)
    }

    /// Refund an escrow by id.
    pub fn refund(&self, escrow_id: &EscrowId) -> Result<(), EscrowError> {
        self.with_escrow(escrow_id, MilestoneEscrow::refund)
    }

    /// Point-in-time view of an escrow by id.
    pub fn snapshot(&self, escrow_id: &EscrowId) -> Result<EscrowSnapshot, EscrowError> {
        self.escrows
            .read()
            .expect("escrow book lock poisoned")
            .get(escrow_id)
            .map(MilestoneEscrow::snapshot)
            .ok_or(EscrowError::EscrowNotFound(*escrow_id))
    }

    fn with_escrow(
        &self,
        escrow_id: &EscrowId,
        op: impl FnOnce(&mut MilestoneEscrow) -> Result<(), EscrowError>,
    ) -> Result<(), EscrowError> {
        let mut escrows = self.escrows.write().expect("escrow book lock poisoned");
        let escrow = escrows
            .get_mut(escrow_id)
            .ok_or(EscrowError::EscrowNotFound(*escrow_id))?;
        op(escrow)
    }
}
