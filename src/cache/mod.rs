// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Balance Cache
//!
//! Volatile wallet id → balance map with per-entry expiry. The cache only
//! ever shortens reads; every failure here is non-fatal to the caller.

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::models::WalletId;

pub mod janitor;
pub mod lru_cache;

pub use janitor::CacheJanitor;
pub use lru_cache::LruBalanceCache;

/// Default lifetime of a cached balance.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache lock poisoned")]
    Poisoned,

    #[error("cached value for {key} is not a decimal: {value:?}")]
    Corrupt { key: String, value: String },

    #[error("cache call timed out after {0:?}")]
    Timeout(Duration),

    #[error("cache unavailable: {0}")]
    Unavailable(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

#[async_trait]
pub trait BalanceCache: Send + Sync {
    /// Cached balance, or `None` on a miss or an expired entry.
    async fn get(&self, id: &WalletId) -> CacheResult<Option<Decimal>>;

    /// Overwrite the cached balance; it expires after `ttl`.
    async fn set(&self, id: &WalletId, balance: Decimal, ttl: Duration) -> CacheResult<()>;

    /// Drop the cached balance, if any.
    async fn remove(&self, id: &WalletId) -> CacheResult<()>;
}
