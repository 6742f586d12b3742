//! # Escrow Errors
//!
//! Each variant names the exact unmet precondition, so callers can tell
//! "wrong state" from "milestone missing" from "deadline not yet passed".
//! A failed call leaves the escrow untouched.

use thiserror::Error;
use wrc_core::{Address, Timestamp, WrId};

use crate::escrow::EscrowState;
use crate::token::LedgerError;

/// Errors raised by escrow construction and transitions.
#[derive(Error, Debug)]
pub enum EscrowError {
    /// The escrowed amount must be positive.
    #[error("escrow amount must be greater than zero")]
    ZeroAmount,

    /// The deadline must lie in the future at creation.
    #[error("escrow deadline {deadline} is not after creation time {now}")]
    DeadlineInPast {
        /// The rejected deadline.
        deadline: Timestamp,
        /// Creation time.
        now: Timestamp,
    },

    /// Lender and borrower must be distinct parties.
    #[error("lender and borrower must differ, both are {address}")]
    LenderIsBorrower {
        /// The shared address.
        address: Address,
    },

    /// The operation is not legal in the current state.
    #[error("cannot {operation} escrow in state {state}")]
    InvalidState {
        /// The state at the time of the call.
        state: EscrowState,
        /// The attempted operation.
        operation: &'static str,
    },

    /// Release or refund requires the escrow to be funded first.
    #[error("escrow is not funded (state {state})")]
    NotFunded {
        /// The state at the time of the call.
        state: EscrowState,
    },

    /// Release requires the receipt's milestone to be attested.
    #[error("milestone for {wr_id} is not attested")]
    MilestoneNotAttested {
        /// The unattested receipt.
        wr_id: WrId,
    },

    /// Refund requires the deadline to have passed.
    #[error("deadline {deadline} has not passed (now {now})")]
    DeadlineNotPassed {
        /// The configured deadline.
        deadline: Timestamp,
        /// The time of the call.
        now: Timestamp,
    },

    /// The underlying token transfer was rejected. The state did not
    /// advance; the caller may retry after fixing balance or allowance.
    #[error("transfer failed: {0}")]
    TransferFailed(#[from] LedgerError),

    /// No escrow with this identifier exists.
    #[error("escrow {0} not found")]
    EscrowNotFound(wrc_core::EscrowId),
}
