// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Wallet Service
//!
//! Coordinates the [`BalanceStore`] and the [`BalanceCache`].
//!
//! ## Reads (cache-aside)
//!
//! 1. A live cache entry is returned as is, without touching the store.
//! 2. On a miss the store is queried and the result written back to the
//!    cache with the configured TTL.
//!
//! ## Writes
//!
//! The cache is never read on the write path. The floor check runs against
//! the store, the store commits the delta inside one transaction (re-checking
//! the floor), and only a committed balance is written to the cache.
//!
//! Cache failures are logged and swallowed everywhere. Store failures surface
//! as [`WalletError::OperationFailed`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::cache::{BalanceCache, CacheError, DEFAULT_CACHE_TTL};
use crate::error::WalletError;
use crate::models::{Amount, OperationType, WalletId};
use crate::storage::{BalanceStore, CommitOutcome, StoreError, StoreResult};

/// Timeouts and cache lifetime used by [`WalletService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSettings {
    pub cache_ttl: Duration,
    pub store_timeout: Duration,
    pub cache_timeout: Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            store_timeout: Duration::from_secs(5),
            cache_timeout: Duration::from_millis(250),
        }
    }
}

/// Balance of one wallet as returned to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletBalance {
    pub id: WalletId,
    pub balance: Decimal,
}

pub struct WalletService {
    store: Arc<dyn BalanceStore>,
    cache: Arc<dyn BalanceCache>,
    settings: ServiceSettings,
}

impl WalletService {
    pub fn new(
        store: Arc<dyn BalanceStore>,
        cache: Arc<dyn BalanceCache>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            store,
            cache,
            settings,
        }
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// Fetch a wallet balance, preferring the cache.
    pub async fn get_balance(&self, raw_id: &str) -> Result<WalletBalance, WalletError> {
        let id = WalletId::parse(raw_id)?;

        if let Some(balance) = self.cached_balance(&id).await {
            debug!(wallet_id = %id, %balance, "Balance served from cache");
            return Ok(WalletBalance { id, balance });
        }

        let record = self
            .store_call(self.store.find_by_id(&id))
            .await
            .map_err(|e| {
                warn!(wallet_id = %id, error = %e, "Balance lookup failed");
                WalletError::OperationFailed(e)
            })?
            .ok_or(WalletError::NotFound(id))?;

        self.refresh_cache(&id, record.balance).await;
        Ok(WalletBalance {
            id,
            balance: record.balance,
        })
    }

    /// Apply a deposit or withdrawal and return the committed balance.
    pub async fn apply_operation(
        &self,
        raw_id: &str,
        operation: OperationType,
        amount: Decimal,
    ) -> Result<WalletBalance, WalletError> {
        // Amount first: a non-positive amount is a malformed body, whatever the id.
        let amount = Amount::new(amount).ok_or(WalletError::InvalidAmount(amount))?;
        let id = WalletId::parse(raw_id)?;
        let delta = operation.delta(amount.value());

        let record = self
            .store_call(self.store.find_by_id(&id))
            .await
            .map_err(WalletError::OperationFailed)?
            .ok_or(WalletError::NotFound(id))?;

        match record.balance.checked_add(delta) {
            Some(projected) if projected < Decimal::ZERO => {
                debug!(wallet_id = %id, balance = %record.balance, requested = %amount.value(), "Withdrawal rejected");
                return Err(WalletError::InsufficientBalance {
                    wallet_id: id,
                    balance: record.balance,
                    requested: amount.value(),
                });
            }
            Some(_) => {}
            None => return Err(WalletError::OperationFailed(StoreError::Overflow(id))),
        }

        match self.store_call(self.store.commit_delta(&id, delta)).await {
            Ok(CommitOutcome::Committed(balance)) => {
                info!(wallet_id = %id, %operation, amount = %amount.value(), %balance, "Operation committed");
                self.refresh_cache(&id, balance).await;
                Ok(WalletBalance { id, balance })
            }
            Ok(CommitOutcome::Rejected { current }) => {
                // A concurrent withdrawal committed between lookup and commit.
                debug!(wallet_id = %id, balance = %current, "Withdrawal rejected at commit");
                Err(WalletError::InsufficientBalance {
                    wallet_id: id,
                    balance: current,
                    requested: amount.value(),
                })
            }
            Err(StoreError::NotFound(_)) => Err(WalletError::NotFound(id)),
            Err(e) => {
                warn!(wallet_id = %id, %operation, error = %e, "Operation failed");
                if e.is_indeterminate() {
                    self.invalidate_cache(&id).await;
                }
                Err(WalletError::OperationFailed(e))
            }
        }
    }

    /// Round trip to the store, bounded by the store timeout.
    pub async fn check_store(&self) -> StoreResult<()> {
        self.store_call(self.store.ping()).await
    }

    async fn store_call<T>(&self, call: impl Future<Output = StoreResult<T>>) -> StoreResult<T> {
        let limit = self.settings.store_timeout;
        tokio::time::timeout(limit, call)
            .await
            .unwrap_or(Err(StoreError::Timeout(limit)))
    }

    async fn cache_call<T>(
        &self,
        call: impl Future<Output = Result<T, CacheError>>,
    ) -> Result<T, CacheError> {
        let limit = self.settings.cache_timeout;
        tokio::time::timeout(limit, call)
            .await
            .unwrap_or(Err(CacheError::Timeout(limit)))
    }

    /// Live cached balance. Errors, timeouts and negative values count as a miss.
    async fn cached_balance(&self, id: &WalletId) -> Option<Decimal> {
        match self.cache_call(self.cache.get(id)).await {
            Ok(Some(balance)) if balance >= Decimal::ZERO => Some(balance),
            Ok(Some(balance)) => {
                warn!(wallet_id = %id, %balance, "Ignoring negative cached balance");
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(wallet_id = %id, error = %e, "Cache read failed, falling back to store");
                None
            }
        }
    }

    async fn refresh_cache(&self, id: &WalletId, balance: Decimal) {
        let ttl = self.settings.cache_ttl;
        if let Err(e) = self.cache_call(self.cache.set(id, balance, ttl)).await {
            warn!(wallet_id = %id, error = %e, "Cache write failed");
        }
    }

    async fn invalidate_cache(&self, id: &WalletId) {
        if let Err(e) = self.cache_call(self.cache.remove(id)).await {
            warn!(wallet_id = %id, error = %e, "Cache invalidation failed");
        }
    }
}
