//! Asset Custody for the Binary Pool Market
//!
//! The market never moves funds itself. It asks an `AssetLedger` to pull a
//! stake into custody or to pay an amount out of custody, and every call is
//! all-or-nothing.
//!
//! `InMemoryAsset` is the custody implementation used by the HTTP service
//! and the tests:
//! - Per-account balances, funded with `mint`
//! - Per-owner allowances granted to the market with `approve`
//! - A bounded journal of completed transfers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::VecDeque;
use uuid::Uuid;

use crate::error::AssetError;

/// Maximum number of transfers kept in the journal.
pub const JOURNAL_CAPACITY: usize = 1000;

// ============================================================================
// COLLABORATOR SEAM
// ============================================================================

/// Fungible-asset movements the market relies on.
pub trait AssetLedger {
    /// Move `amount` from `from` into market custody.
    fn transfer_in(&mut self, from: &str, amount: u64) -> Result<(), AssetError>;

    /// Move `amount` out of market custody to `to`.
    fn transfer_out(&mut self, to: &str, amount: u64) -> Result<(), AssetError>;
}

// ============================================================================
// TRANSFER JOURNAL
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransferDirection {
    In,
    Out,
}

/// A completed custody movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transfer {
    pub id: String,
    pub direction: TransferDirection,
    pub account: String,
    pub amount: u64,
    pub timestamp: DateTime<Utc>,
}

impl Transfer {
    fn new(direction: TransferDirection, account: &str, amount: u64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            direction,
            account: account.to_string(),
            amount,
            timestamp: Utc::now(),
        }
    }
}

// ============================================================================
// IN-MEMORY CUSTODY
// ============================================================================

/// Single-custody in-memory asset ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InMemoryAsset {
    custody_account: String,
    balances: HashMap<String, u64>,
    allowances: HashMap<String, u64>,
    /// When false, `transfer_in` only checks balances.
    require_allowance: bool,
    #[serde(default)]
    journal: VecDeque<Transfer>,
}

impl InMemoryAsset {
    /// Custody that requires an `approve` before every stake is pulled in.
    pub fn new(custody_account: impl Into<String>) -> Self {
        Self {
            custody_account: custody_account.into(),
            balances: HashMap::new(),
            allowances: HashMap::new(),
            require_allowance: true,
            journal: VecDeque::new(),
        }
    }

    /// Custody that pulls stakes straight from balances.
    pub fn without_allowances(custody_account: impl Into<String>) -> Self {
        Self {
            require_allowance: false,
            ..Self::new(custody_account)
        }
    }

    pub fn custody_account(&self) -> &str {
        &self.custody_account
    }

    /// Credit `amount` to `account`, returning the new balance.
    pub fn mint(&mut self, account: &str, amount: u64) -> Result<u64, AssetError> {
        self.credit(account, amount)
    }

    /// Set the amount the market may pull from `owner`.
    pub fn approve(&mut self, owner: &str, amount: u64) {
        self.allowances.insert(owner.to_string(), amount);
    }

    pub fn balance_of(&self, account: &str) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn allowance_of(&self, owner: &str) -> u64 {
        self.allowances.get(owner).copied().unwrap_or(0)
    }

    pub fn custody_balance(&self) -> u64 {
        self.balance_of(&self.custody_account)
    }

    /// Most recent transfers, newest last.
    pub fn journal(&self) -> impl Iterator<Item = &Transfer> {
        self.journal.iter()
    }

    fn record(&mut self, transfer: Transfer) {
        self.journal.push_back(transfer);
        if self.journal.len() > JOURNAL_CAPACITY {
            self.journal.pop_front();
        }
    }

    /// Leaves the balance untouched when it would overflow.
    fn credit(&mut self, account: &str, amount: u64) -> Result<u64, AssetError> {
        let balance = self.balance_of(account);
        let credited = balance
            .checked_add(amount)
            .ok_or_else(|| AssetError::BalanceOverflow {
                account: account.to_string(),
                balance,
                amount,
            })?;
        self.balances.insert(account.to_string(), credited);
        Ok(credited)
    }
}

impl AssetLedger for InMemoryAsset {
    fn transfer_in(&mut self, from: &str, amount: u64) -> Result<(), AssetError> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(AssetError::InsufficientBalance {
                account: from.to_string(),
                available,
                requested: amount,
            });
        }

        let approved = self.allowance_of(from);
        if self.require_allowance && approved < amount {
            return Err(AssetError::InsufficientAllowance {
                account: from.to_string(),
                approved,
                requested: amount,
            });
        }

        let custody = self.custody_account.clone();
        self.balances.insert(from.to_string(), available - amount);
        if let Err(e) = self.credit(&custody, amount) {
            self.balances.insert(from.to_string(), available);
            return Err(e);
        }
        if self.require_allowance {
            self.allowances.insert(from.to_string(), approved - amount);
        }
        self.record(Transfer::new(TransferDirection::In, from, amount));
        Ok(())
    }

    fn transfer_out(&mut self, to: &str, amount: u64) -> Result<(), AssetError> {
        let available = self.custody_balance();
        if available < amount {
            return Err(AssetError::InsufficientCustody {
                available,
                requested: amount,
            });
        }

        let custody = self.custody_account.clone();
        self.balances.insert(custody.clone(), available - amount);
        if let Err(e) = self.credit(to, amount) {
            self.balances.insert(custody, available);
            return Err(e);
        }
        self.record(Transfer::new(TransferDirection::Out, to, amount));
        Ok(())
    }
}
