//! # wrc-escrow — Milestone Escrow
//!
//! Per-loan custody of lender funds for the collateral protocol. An
//! escrow is opened against a registered warehouse receipt, funded by
//! the lender, and then resolves exactly one of two ways:
//!
//! - **release** to the borrower, once the receipt's milestone is
//!   attested in the WR registry, or
//! - **refund** to the lender, once the deadline has passed.
//!
//! Funds move on an external ledger behind the [`TokenLedger`] trait;
//! [`InMemoryLedger`] backs the demo API and the test suites. Deadline
//! checks go through the injected [`wrc_core::Clock`], never the wall
//! clock directly.

pub mod error;
pub mod escrow;
pub mod token;

pub use error::EscrowError;
pub use escrow::{EscrowBook, EscrowSnapshot, EscrowState, EscrowTerms, MilestoneEscrow};
pub use token::{InMemoryLedger, LedgerError, TokenLedger};
