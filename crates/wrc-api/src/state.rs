//! # Application State
//!
//! Shared state for the Axum application: one handle to each protocol
//! store, all backed by the same audit log. Cloning the state clones
//! the handles, not the stores, so every request sees the same data.

use std::sync::Arc;

use wrc_core::{Address, Clock, SystemClock};
use wrc_escrow::{EscrowBook, InMemoryLedger};
use wrc_registry::{
    AuditLog, EpochSource, IssuerAuthority, ProofPolicy, ProofRegistry, SystemEpochSource,
    WrRegistry,
};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    /// Issuer allowlist.
    pub authority: IssuerAuthority,
    /// Warehouse receipt registry.
    pub wrs: WrRegistry,
    /// One-time proof consumption registry.
    pub proofs: ProofRegistry,
    /// In-process token ledger backing the escrows.
    pub ledger: InMemoryLedger,
    /// Escrow store.
    pub escrows: EscrowBook,
    /// Shared audit log.
    pub audit: AuditLog,
    /// Clock driving escrow deadline checks.
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Assemble application state from injected time sources.
    ///
    /// Tests pass a `FixedEpochSource` and `ManualClock`; the binary
    /// passes a [`SystemEpochSource`] and [`SystemClock`].
    pub fn new(
        chain_tag: impl Into<String>,
        owner: Address,
        policy: ProofPolicy,
        epochs: Arc<dyn EpochSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        // The audit log shares the escrow clock so event timestamps
        // agree with transition timestamps under a manual clock.
        let audit = AuditLog::with_clock(clock.clone());
        let authority = IssuerAuthority::new(owner, audit.clone());
        let wrs = WrRegistry::new(chain_tag, authority.clone(), audit.clone());
        let proofs = ProofRegistry::new(policy, epochs, audit.clone());
        Self {
            authority,
            wrs,
            proofs,
            ledger: InMemoryLedger::new(),
            escrows: EscrowBook::new(),
            audit,
            clock,
        }
    }

    /// State wired to wall-clock time for the server binary.
    pub fn with_system_time(
        chain_tag: impl Into<String>,
        owner: Address,
        policy: ProofPolicy,
        epoch_secs: u64,
    ) -> Result<Self, wrc_core::CoreError> {
        let epochs = SystemEpochSource::new(epoch_secs)?;
        Ok(Self::new(
            chain_tag,
            owner,
            policy,
            Arc::new(epochs),
            Arc::new(SystemClock),
        ))
    }
}
