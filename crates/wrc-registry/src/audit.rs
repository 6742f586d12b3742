//! # Audit Log — Append-Only Protocol Events
//!
//! Every successful state transition in the protocol writes one event
//! here after the transition commits. The log is the integration point
//! for external observers (dashboards, indexers, mirrors): they read
//! events instead of reaching into registry internals, so the state
//! machines stay decoupled from any particular eventing technology.
//!
//! Events are append-only and never rewritten. A failed operation writes
//! nothing.

use std::sync::{Arc, RwLock};

use serde::Serialize;
use wrc_core::{Address, Amount, Clock, EscrowId, RoundId, SystemClock, Timestamp, WrId};

use crate::proof::{AttestationId, ContextId};

/// A protocol event, recorded after the corresponding transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    /// An issuer was added to the allowlist.
    IssuerAdded {
        /// The listed address.
        issuer: Address,
    },
    /// An issuer was removed from the allowlist.
    IssuerRemoved {
        /// The delisted address.
        issuer: Address,
    },
    /// A warehouse receipt was registered.
    WrRegistered {
        /// The new receipt.
        wr_id: WrId,
        /// The attesting issuer.
        issuer: Address,
        /// The borrower/beneficiary.
        sme: Address,
    },
    /// A warehouse receipt was pledged to a lender.
    WrPledged {
        /// The pledged receipt.
        wr_id: WrId,
        /// The lender holding the pledge.
        lender: Address,
    },
    /// A receipt milestone was marked attested.
    MilestoneAttested {
        /// The attested receipt.
        wr_id: WrId,
        /// The oracle round of the attestation.
        round: RoundId,
    },
    /// An oracle attestation was consumed.
    ProofAccepted {
        /// The spent attestation.
        attestation_id: AttestationId,
        /// The oracle round it was bound to.
        round: RoundId,
        /// The context the proof applies to, for downstream correlation.
        context: ContextId,
    },
    /// A milestone escrow was created.
    EscrowCreated {
        /// The new escrow.
        escrow_id: EscrowId,
        /// The receipt backing the loan.
        wr_id: WrId,
        /// The funding lender.
        lender: Address,
        /// The borrower paid on release.
        borrower: Address,
        /// The escrowed amount.
        amount: Amount,
        /// The refund-eligibility deadline.
        deadline: Timestamp,
    },
    /// Lender funds arrived in escrow custody.
    EscrowFunded {
        /// The funded escrow.
        escrow_id: EscrowId,
    },
    /// Escrowed funds were released to the borrower.
    EscrowReleased {
        /// The released escrow.
        escrow_id: EscrowId,
    },
    /// Escrowed funds were returned to the lender.
    EscrowRefunded {
        /// The refunded escrow.
        escrow_id: EscrowId,
    },
}

/// One audit log entry: an event and when it was recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRecord {
    /// When the event was recorded.
    pub at: Timestamp,
    /// The recorded event.
    #[serde(flatten)]
    pub event: AuditEvent,
}

/// Handle to the shared append-only audit log.
///
/// Cloning yields another handle to the same log.
#[derive(Clone)]
pub struct AuditLog {
    records: Arc<RwLock<Vec<AuditRecord>>>,
    clock: Arc<dyn Clock>,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }
}

impl AuditLog {
    /// Create an empty audit log stamped from wall-clock time.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty audit log stamped from the given clock.
    ///
    /// Pass the same clock the state machines use, so an event's `at`
    /// agrees with the transition timestamp it describes.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
            clock,
        }
    }

    /// Append an event, stamped with the log's clock.
    pub fn record(&self, event: AuditEvent) {
        let record = AuditRecord {
            at: self.clock.now(),
            event,
        };
        self.records
            .write()
            .expect("audit log lock poisoned")
            .push(record);
    }

    /// A snapshot of all records in append order.
    pub fn snapshot(&self) -> Vec<AuditRecord> {
        self.records
            .read()
            .expect("audit log lock poisoned")
            .clone()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.records.read().expect("audit log lock poisoned").len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    #[test]
    fn test_records_append_in_order() {
        let log = AuditLog::new();
        assert!(log.is_empty());
        log.record(AuditEvent::IssuerAdded { issuer: addr(1) });
        log.record(AuditEvent::IssuerRemoved { issuer: addr(1) });
        let records = log.snapshot();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].event, AuditEvent::IssuerAdded { issuer: addr(1) });
        assert_eq!(records[1].event, AuditEvent::IssuerRemoved { issuer: addr(1) });
    }

    #[test]
    fn test_record_stamps_from_injected_clock() {
        let start = Timestamp::parse("2026-03-01T12:00:00Z").unwrap();
        let clock = wrc_core::ManualClock::at(start);
        let log = AuditLog::with_clock(Arc::new(clock.clone()));

        log.record(AuditEvent::IssuerAdded { issuer: addr(1) });
        clock.advance_secs(60);
        log.record(AuditEvent::IssuerRemoved { issuer: addr(1) });

        let records = log.snapshot();
        assert_eq!(records[0].at, start);
        assert_eq!(records[1].at, start.plus_secs(60));
    }

    #[test]
    fn test_clones_share_the_log() {
        let log = AuditLog::new();
        let other = log.clone();
        other.record(AuditEvent::IssuerAdded { issuer: addr(2) });
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_events_serialize_with_tag() {
        let log = AuditLog::new();
        log.record(AuditEvent::WrPledged {
            wr_id: WrId::parse("WR-1").unwrap(),
            lender: addr(3),
        });
        let json = serde_json::to_value(log.snapshot()).unwrap();
        assert_eq!(json[0]["event"], "wr_pledged");
        assert_eq!(json[0]["lender"], addr(3).to_hex());
        assert!(json[0]["at"].is_string());
    }
}
