// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Volatile balance store.
//!
//! Same contract as [`super::RedbBalanceStore`] with nothing written to disk.
//! The map lock is held across the whole read-check-write, which serializes
//! commits the same way a redb write transaction does.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use super::{check_initial, settle, BalanceStore, CommitOutcome, StoreError, StoreResult};
use crate::models::{WalletId, WalletRecord};

#[derive(Default)]
pub struct MemoryBalanceStore {
    wallets: Mutex<HashMap<WalletId, WalletRecord>>,
}

impl MemoryBalanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `(id, balance)` pairs.
    pub fn with_wallets(wallets: impl IntoIterator<Item = (WalletId, Decimal)>) -> StoreResult<Self> {
        let mut map = HashMap::new();
        for (id, balance) in wallets {
            let balance = check_initial(&id, balance)?;
            map.insert(
                id,
                WalletRecord {
                    id,
                    balance,
                    updated_at: Utc::now(),
                },
            );
        }
        Ok(Self {
            wallets: Mutex::new(map),
        })
    }
}

#[async_trait]
impl BalanceStore for MemoryBalanceStore {
    async fn find_by_id(&self, id: &WalletId) -> StoreResult<Option<WalletRecord>> {
        Ok(self.wallets.lock().await.get(id).cloned())
    }

    async fn commit_delta(&self, id: &WalletId, delta: Decimal) -> StoreResult<CommitOutcome> {
        let mut wallets = self.wallets.lock().await;
        let Some(record) = wallets.get_mut(id) else {
            return Err(StoreError::NotFound(*id));
        };

        let outcome = settle(id, record.balance, delta)?;
        if let CommitOutcome::Committed(next) = outcome {
            record.balance = next;
            record.updated_at = Utc::now();
        }
        Ok(outcome)
    }

    async fn create_wallet(&self, id: &WalletId, balance: Decimal) -> StoreResult<bool> {
        let balance = check_initial(id, balance)?;
        let mut wallets = self.wallets.lock().await;
        if wallets.contains_key(id) {
            return Ok(false);
        }
        wallets.insert(
            *id,
            WalletRecord {
                id: *id,
                balance,
                updated_at: Utc::now(),
            },
        );
        Ok(true)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
