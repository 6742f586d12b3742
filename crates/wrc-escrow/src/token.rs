//! # Token Ledger — External Fungible-Asset Boundary
//!
//! The escrow never mints or holds tokens itself; it moves them on an
//! external ledger through the [`TokenLedger`] trait. A failed transfer
//! aborts the enclosing escrow transition before any state field changes.
//!
//! [`InMemoryLedger`] is the in-process implementation used by the demo
//! API and the test suites: plain balances plus spender allowances, with
//! every transfer applied atomically under one lock.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use thiserror::Error;
use wrc_core::{Address, Amount, TokenId};

/// Errors from the token ledger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The payer's balance does not cover the transfer.
    #[error("insufficient balance: {payer} holds {available} of {token}, needs {needed}")]
    InsufficientBalance {
        /// The account short of funds.
        payer: Address,
        /// The asset.
        token: TokenId,
        /// The requested amount.
        needed: Amount,
        /// The available balance.
        available: Amount,
    },

    /// The payer has not approved enough for the payee to pull.
    #[error("insufficient allowance: {payer} approved {available} of {token} for {spender}, needs {needed}")]
    InsufficientAllowance {
        /// The approving account.
        payer: Address,
        /// The account pulling funds.
        spender: Address,
        /// The asset.
        token: TokenId,
        /// The requested amount.
        needed: Amount,
        /// The approved remainder.
        available: Amount,
    },
}

/// A fungible-token ledger the escrow moves funds on.
///
/// Implementations must apply each transfer atomically: either both
/// balances move, or neither does.
pub trait TokenLedger: Send + Sync {
    /// Pull `amount` of `token` from `payer` to `payee`, spending the
    /// allowance `payer` granted to `payee`.
    fn transfer_from(
        &self,
        payer: Address,
        payee: Address,
        token: &TokenId,
        amount: Amount,
    ) -> Result<(), LedgerError>;

    /// Move `amount` of `token` from `payer` to `payee`.
    fn transfer(
        &self,
        payer: Address,
        payee: Address,
        token: &TokenId,
        amount: Amount,
    ) -> Result<(), LedgerError>;

    /// The balance of `addr` in `token`.
    fn balance_of(&self, addr: Address, token: &TokenId) -> Amount;
}

#[derive(Default)]
struct LedgerState {
    balances: HashMap<(Address, TokenId), Amount>,
    allowances: HashMap<(Address, Address, TokenId), Amount>,
}

/// In-process token ledger with balances and allowances.
///
/// Cloning yields another handle to the same ledger.
#[derive(Clone, Default)]
pub struct InMemoryLedger {
    state: Arc<RwLock<LedgerState>>,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` of `token` to `addr` out of thin air. Demo/test
    /// setup only; the real ledger is external.
    pub fn mint(&self, addr: Address, token: &TokenId, amount: Amount) {
        let mut state = self.state.write().expect("ledger lock poisoned");
        let balance = state.balances.entry((addr, token.clone())).or_insert(Amount(0));
        *balance = balance.checked_add(amount).unwrap_or(Amount(u128::MAX));
    }

    /// Approve `spender` to pull up to `amount` of `token` from `owner`.
    pub fn approve(&self, owner: Address, spender: Address, token: &TokenId, amount: Amount) {
        self.state
            .write()
            .expect("ledger lock poisoned")
            .allowances
            .insert((owner, spender, token.clone()), amount);
    }

    /// The remaining allowance `owner` granted `spender` for `token`.
    pub fn allowance_of(&self, owner: Address, spender: Address, token: &TokenId) -> Amount {
        self.state
            .read()
            .expect("ledger lock poisoned")
            .allowances
            .get(&(owner, spender, token.clone()))
            .copied()
            .unwrap_or(Amount(0))
    }
}

impl TokenLedger for InMemoryLedger {
    fn transfer_from(
        &self,
        payer: Address,
        payee: Address,
        token: &TokenId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let mut state = self.state.write().expect("ledger lock poisoned");

        let allowance = state
            .allowances
            .get(&(payer, payee, token.clone()))
            .copied()
            .unwrap_or(Amount(0));
        let Some(remaining) = allowance.checked_sub(amount) else {
            return Err(LedgerError::InsufficientAllowance {
                payer,
                spender: payee,
                token: token.clone(),
                needed: amount,
                available: allowance,
            });
        };

        let balance = state
            .balances
            .get(&(payer, token.clone()))
            .copied()
            .unwrap_or(Amount(0));
        let Some(payer_left) = balance.checked_sub(amount) else {
            return Err(LedgerError::InsufficientBalance {
                payer,
                token: token.clone(),
                needed: amount,
                available: balance,
            });
        };

        state.allowances.insert((payer, payee, token.clone()), remaining);
        state.balances.insert((payer, token.clone()), payer_left);
        let payee_balance = state
            .balances
            .entry((payee, token.clone()))
            .or_insert(Amount(0));
        *payee_balance = payee_balance.checked_add(amount).unwrap_or(Amount(u128::MAX));
        Ok(())
    }

    fn transfer(
        &self,
        payer: Address,
        payee: Address,
        token: &TokenId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let mut state = self.state.write().expect("ledger lock poisoned");

        let balance = state
            .balances
            .get(&(payer, token.clone()))
            .copied()
            .unwrap_or(Amount(0));
        let Some(payer_left) = balance.checked_sub(amount) else {
            return Err(LedgerError::InsufficientBalance {
                payer,
                token: token.clone(),
                needed: amount,
                available: balance,
            });
        };

        state.balances.insert((payer, token.clone()), payer_left);
        let payee_balance = state
            .balances
            .entry((payee, token.clone()))
            .or_insert(Amount(0));
        *payee_balance = payee_balance.checked_add(amount).unwrap_or(Amount(u128::MAX));
        Ok(())
    }

    fn balance_of(&self, addr: Address, token: &TokenId) -> Amount {
        self.state
            .read()
            .expect("ledger lock poisoned")
            .balances
            .get(&(addr, token.clone()))
            .copied()
            .unwrap_or(Amount(0))
    }
}
