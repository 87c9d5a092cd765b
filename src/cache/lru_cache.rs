// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! LRU cache for wallet balances.
//!
//! Values are held in their string form (`"1000.00"`), the same shape an
//! external key/value cache would keep them in.

use std::num::NonZeroUsize;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use rust_decimal::Decimal;

use super::{BalanceCache, CacheError, CacheResult};
use crate::models::{format_balance, WalletId};

/// Cached entry: balance string + expiry deadline.
struct CacheEntry {
    value: String,
    expires_at: Instant,
}

/// In-process LRU cache for wallet balances.
pub struct LruBalanceCache {
    cache: Mutex<LruCache<String, CacheEntry>>,
}

impl LruBalanceCache {
    /// Create a new cache holding at most `capacity` wallets.
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
        }
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> CacheResult<usize> {
        let mut cache = self.cache.lock().map_err(|_| CacheError::Poisoned)?;
        let now = Instant::now();
        let expired: Vec<String> = cache
            .iter()
            .filter(|(_, entry)| entry.expires_at <= now)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            cache.pop(key);
        }
        Ok(expired.len())
    }

    /// Number of entries currently held, expired or not.
    pub fn len(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BalanceCache for LruBalanceCache {
    async fn get(&self, id: &WalletId) -> CacheResult<Option<Decimal>> {
        let key = id.key();
        let mut cache = self.cache.lock().map_err(|_| CacheError::Poisoned)?;
        let Some(entry) = cache.get(&key) else {
            return Ok(None);
        };
        if entry.expires_at <= Instant::now() {
            // Expired, drop it
            cache.pop(&key);
            return Ok(None);
        }
        Decimal::from_str(&entry.value)
            .map(Some)
            .map_err(|_| CacheError::Corrupt {
                key: key.clone(),
                value: entry.value.clone(),
            })
    }

    async fn set(&self, id: &WalletId, balance: Decimal, ttl: Duration) -> CacheResult<()> {
        let mut cache = self.cache.lock().map_err(|_| CacheError::Poisoned)?;
        cache.put(
            id.key(),
            CacheEntry {
                value: format_balance(balance),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn remove(&self, id: &WalletId) -> CacheResult<()> {
        let mut cache = self.cache.lock().map_err(|_| CacheError::Poisoned)?;
        cache.pop(&id.key());
        Ok(())
    }
}
