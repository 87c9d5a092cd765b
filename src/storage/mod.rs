// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Balance Storage
//!
//! Durable record of each wallet's balance. The store is the source of truth:
//! every mutation is decided inside a single store transaction, so two
//! operations on the same wallet can never both observe the same starting
//! balance.
//!
//! ## Backends
//!
//! - [`RedbBalanceStore`] - embedded ACID database (redb), used in production
//! - [`MemoryBalanceStore`] - volatile map with the same contract
//!
//! ## Commit Contract
//!
//! [`BalanceStore::commit_delta`] reads the current balance, applies the delta
//! and enforces the zero floor inside one write transaction. A rejected or
//! failed commit leaves the stored balance unchanged.

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::models::{normalize_balance, WalletId, WalletRecord};

pub mod balance_db;
pub mod memory;

pub use balance_db::RedbBalanceStore;
pub use memory::MemoryBalanceStore;

/// Largest balance a wallet may hold (`NUMERIC(15,2)`).
pub const MAX_BALANCE: Decimal = Decimal::from_parts(2_764_472_319, 232_830, 0, false, 2);

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("corrupt record for wallet {wallet_id}: {reason}")]
    Corrupt { wallet_id: WalletId, reason: String },

    #[error("wallet not found: {0}")]
    NotFound(WalletId),

    #[error("balance limit exceeded for wallet {0}")]
    Overflow(WalletId),

    #[error("store call timed out after {0:?}")]
    Timeout(Duration),

    #[error("store worker failed: {0}")]
    Worker(String),
}

impl StoreError {
    /// True when the caller cannot tell whether a write was applied.
    pub fn is_indeterminate(&self) -> bool {
        matches!(
            self,
            StoreError::Timeout(_) | StoreError::Worker(_) | StoreError::RedbCommit(_)
        )
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Store Contract
// =============================================================================

/// Result of a transaction-guarded balance update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The new balance was written.
    Committed(Decimal),
    /// The update would have made the balance negative; nothing was written.
    Rejected { current: Decimal },
}

#[async_trait]
pub trait BalanceStore: Send + Sync {
    /// Point lookup. `Ok(None)` when the wallet does not exist.
    async fn find_by_id(&self, id: &WalletId) -> StoreResult<Option<WalletRecord>>;

    /// Atomically add `delta` to the balance, refusing to go below zero.
    ///
    /// Fails with [`StoreError::NotFound`] for unknown wallets and
    /// [`StoreError::Overflow`] when the result exceeds [`MAX_BALANCE`].
    async fn commit_delta(&self, id: &WalletId, delta: Decimal) -> StoreResult<CommitOutcome>;

    /// Insert a wallet if absent. Returns `false` when it already existed.
    async fn create_wallet(&self, id: &WalletId, balance: Decimal) -> StoreResult<bool>;

    /// Cheap round trip used by readiness probes.
    async fn ping(&self) -> StoreResult<()>;
}

/// Floor and ceiling rule shared by every backend.
pub(crate) fn settle(id: &WalletId, current: Decimal, delta: Decimal) -> StoreResult<CommitOutcome> {
    let next = current
        .checked_add(delta)
        .ok_or(StoreError::Overflow(*id))?;
    if next < Decimal::ZERO {
        return Ok(CommitOutcome::Rejected { current });
    }
    if next > MAX_BALANCE {
        return Err(StoreError::Overflow(*id));
    }
    Ok(CommitOutcome::Committed(normalize_balance(next)))
}

/// Validate an initial balance before it is stored.
pub(crate) fn check_initial(id: &WalletId, balance: Decimal) -> StoreResult<Decimal> {
    if balance < Decimal::ZERO {
        return Err(StoreError::Corrupt {
            wallet_id: *id,
            reason: format!("negative initial balance {balance}"),
        });
    }
    if balance > MAX_BALANCE {
        return Err(StoreError::Overflow(*id));
    }
    Ok(normalize_balance(balance))
}
