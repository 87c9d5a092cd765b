// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded balance database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `wallets`: canonical wallet id → serialized [`StoredWallet`] (JSON bytes)
//!
//! redb admits a single write transaction at a time, so the read, floor check
//! and write in [`RedbBalanceStore::commit_delta`] can never interleave with
//! another writer.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{check_initial, settle, BalanceStore, CommitOutcome, StoreError, StoreResult};
use crate::models::{format_balance, WalletId, WalletRecord};

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: wallet id → serialized StoredWallet (JSON bytes).
const WALLETS: TableDefinition<&str, &[u8]> = TableDefinition::new("wallets");

// =============================================================================
// Row Mapping
// =============================================================================

/// On-disk row for one wallet.
///
/// The balance is kept as a decimal string so no precision is lost in JSON.
#[derive(Debug, Serialize, Deserialize)]
struct StoredWallet {
    balance: String,
    updated_at: DateTime<Utc>,
}

fn encode_row(balance: Decimal, updated_at: DateTime<Utc>) -> StoreResult<Vec<u8>> {
    let row = StoredWallet {
        balance: format_balance(balance),
        updated_at,
    };
    Ok(serde_json::to_vec(&row)?)
}

fn decode_row(id: &WalletId, bytes: &[u8]) -> StoreResult<WalletRecord> {
    let row: StoredWallet = serde_json::from_slice(bytes)?;
    let balance = Decimal::from_str(&row.balance).map_err(|e| StoreError::Corrupt {
        wallet_id: *id,
        reason: e.to_string(),
    })?;
    Ok(WalletRecord {
        id: *id,
        balance,
        updated_at: row.updated_at,
    })
}

// =============================================================================
// RedbBalanceStore
// =============================================================================

/// Durable balance store.
#[derive(Clone)]
pub struct RedbBalanceStore {
    db: Arc<Database>,
}

impl RedbBalanceStore {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create the table so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(WALLETS)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Run a blocking redb closure off the async executor.
    async fn blocking<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> StoreResult<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| StoreError::Worker(e.to_string()))?
    }
}

fn find_in(db: &Database, id: &WalletId) -> StoreResult<Option<WalletRecord>> {
    let key = id.key();
    let read_txn = db.begin_read()?;
    let table = read_txn.open_table(WALLETS)?;
    let record = match table.get(key.as_str())? {
        Some(value) => Some(decode_row(id, value.value())?),
        None => None,
    };
    Ok(record)
}

fn commit_in(db: &Database, id: &WalletId, delta: Decimal) -> StoreResult<CommitOutcome> {
    let key = id.key();
    let write_txn = db.begin_write()?;
    let outcome = {
        let mut table = write_txn.open_table(WALLETS)?;

        // Copy the row out before mutating the table
        let existing = table.get(key.as_str())?.map(|v| v.value().to_vec());
        let Some(bytes) = existing else {
            return Err(StoreError::NotFound(*id));
        };

        let current = decode_row(id, &bytes)?;
        let outcome = settle(id, current.balance, delta)?;
        if let CommitOutcome::Committed(next) = outcome {
            let row = encode_row(next, Utc::now())?;
            table.insert(key.as_str(), row.as_slice())?;
        }
        outcome
    };

    match outcome {
        CommitOutcome::Committed(_) => write_txn.commit()?,
        CommitOutcome::Rejected { .. } => write_txn.abort()?,
    }
    Ok(outcome)
}

fn create_in(db: &Database, id: &WalletId, balance: Decimal) -> StoreResult<bool> {
    let key = id.key();
    let balance = check_initial(id, balance)?;
    let write_txn = db.begin_write()?;
    let inserted = {
        let mut table = write_txn.open_table(WALLETS)?;
        if table.get(key.as_str())?.is_some() {
            false
        } else {
            let row = encode_row(balance, Utc::now())?;
            table.insert(key.as_str(), row.as_slice())?;
            true
        }
    };
    if inserted {
        write_txn.commit()?;
    } else {
        write_txn.abort()?;
    }
    Ok(inserted)
}

#[async_trait]
impl BalanceStore for RedbBalanceStore {
    async fn find_by_id(&self, id: &WalletId) -> StoreResult<Option<WalletRecord>> {
        let id = *id;
        self.blocking(move |db| find_in(db, &id)).await
    }

    async fn commit_delta(&self, id: &WalletId, delta: Decimal) -> StoreResult<CommitOutcome> {
        let id = *id;
        self.blocking(move |db| commit_in(db, &id, delta)).await
    }

    async fn create_wallet(&self, id: &WalletId, balance: Decimal) -> StoreResult<bool> {
        let id = *id;
        self.blocking(move |db| create_in(db, &id, balance)).await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.blocking(|db| {
            let read_txn = db.begin_read()?;
            let _ = read_txn.open_table(WALLETS)?;
            Ok(())
        })
        .await
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn temp_store() -> (RedbBalanceStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbBalanceStore::open(&dir.path().join("wallets.redb")).unwrap();
        (store, dir)
    }

    fn wallet() -> WalletId {
        WalletId::parse("123e4567-e89b-12d3-a456-426614174000").unwrap()
    }

    #[tokio::test]
    async fn missing_wallet_is_none() {
        let (store, _dir) = temp_store();
        assert!(store.find_by_id(&wallet()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_and_find() {
        let (store, _dir) = temp_store();
        assert!(store.create_wallet(&wallet(), dec!(1000)).await.unwrap());
        assert!(!store.create_wallet(&wallet(), dec!(5)).await.unwrap());

        let record = store.find_by_id(&wallet()).await.unwrap().unwrap();
        assert_eq!(record.balance, dec!(1000.00));
        assert_eq!(record.balance.to_string(), "1000.00");
    }

    #[tokio::test]
    async fn commit_deposit_and_withdraw() {
        let (store, _dir) = temp_store();
        store.create_wallet(&wallet(), dec!(1000.00)).await.unwrap();

        let outcome = store.commit_delta(&wallet(), dec!(1000.00)).await.unwrap();
        assert_eq!(outcome, CommitOutcome::Committed(dec!(2000.00)));

        let outcome = store.commit_delta(&wallet(), dec!(-2000.00)).await.unwrap();
        assert_eq!(outcome, CommitOutcome::Committed(dec!(0.00)));

        let record = store.find_by_id(&wallet()).await.unwrap().unwrap();
        assert_eq!(record.balance, Decimal::ZERO);
    }

    #[tokio::test]
    async fn rejected_withdraw_leaves_row_unchanged() {
        let (store, _dir) = temp_store();
        store.create_wallet(&wallet(), dec!(1000.00)).await.unwrap();
        let before = store.find_by_id(&wallet()).await.unwrap().unwrap();

        let outcome = store.commit_delta(&wallet(), dec!(-1001.00)).await.unwrap();
        assert_eq!(outcome, CommitOutcome::Rejected { current: dec!(1000.00) });

        let after = store.find_by_id(&wallet()).await.unwrap().unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn commit_unknown_wallet_fails() {
        let (store, _dir) = temp_store();
        let err = store.commit_delta(&wallet(), dec!(1)).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn overflow_aborts_transaction() {
        let (store, _dir) = temp_store();
        store.create_wallet(&wallet(), super::super::MAX_BALANCE).await.unwrap();

        let err = store.commit_delta(&wallet(), dec!(0.01)).await.unwrap_err();
        assert!(matches!(err, StoreError::Overflow(_)));

        let record = store.find_by_id(&wallet()).await.unwrap().unwrap();
        assert_eq!(record.balance, super::super::MAX_BALANCE);
    }

    #[tokio::test]
    async fn balances_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallets.redb");
        {
            let store = RedbBalanceStore::open(&path).unwrap();
            store.create_wallet(&wallet(), dec!(10)).await.unwrap();
            store.commit_delta(&wallet(), dec!(0.25)).await.unwrap();
        }
        let store = RedbBalanceStore::open(&path).unwrap();
        let record = store.find_by_id(&wallet()).await.unwrap().unwrap();
        assert_eq!(record.balance, dec!(10.25));
    }

    #[tokio::test]
    async fn corrupt_row_is_reported() {
        let (store, _dir) = temp_store();
        let key = wallet().key();
        {
            let write_txn = store.db.begin_write().unwrap();
            {
                let mut table = write_txn.open_table(WALLETS).unwrap();
                let row = br#"{"balance":"lots","updated_at":"2026-01-01T00:00:00Z"}"#;
                table.insert(key.as_str(), row.as_slice()).unwrap();
            }
            write_txn.commit().unwrap();
        }
        let err = store.find_by_id(&wallet()).await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_withdrawals_never_cross_floor() {
        let (store, _dir) = temp_store();
        store.create_wallet(&wallet(), dec!(100.00)).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..25 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.commit_delta(&wallet(), dec!(-10.00)).await.unwrap()
            }));
        }

        let mut committed = 0;
        for handle in handles {
            if let CommitOutcome::Committed(_) = handle.await.unwrap() {
                committed += 1;
            }
        }

        assert_eq!(committed, 10);
        let record = store.find_by_id(&wallet()).await.unwrap().unwrap();
        assert_eq!(record.balance, Decimal::ZERO);
    }

    #[tokio::test]
    async fn ping_succeeds_on_open_database() {
        let (store, _dir) = temp_store();
        store.ping().await.unwrap();
    }
}
