// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::cache::LruBalanceCache;
use crate::service::{ServiceSettings, WalletService};
use crate::storage::MemoryBalanceStore;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<WalletService>,
}

impl AppState {
    pub fn new(service: WalletService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

impl Default for AppState {
    /// Volatile store and cache, for tests and local experiments.
    fn default() -> Self {
        Self::new(WalletService::new(
            Arc::new(MemoryBalanceStore::new()),
            Arc::new(LruBalanceCache::new(1024)),
            ServiceSettings::default(),
        ))
    }
}
