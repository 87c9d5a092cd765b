// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Cache Janitor
//!
//! Background task that periodically drops expired balances from the
//! [`LruBalanceCache`]. Reads already ignore expired entries; the sweep only
//! returns their memory for wallets nobody asks about again.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown, the same
//! token that stops the HTTP server.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::LruBalanceCache;

/// Default interval between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

pub struct CacheJanitor {
    cache: Arc<LruBalanceCache>,
    interval: Duration,
}

impl CacheJanitor {
    pub fn new(cache: Arc<LruBalanceCache>) -> Self {
        Self {
            cache,
            interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run the sweep loop until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(janitor.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Cache janitor started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Cache janitor stopped");
                    return;
                }
                _ = ticker.tick() => {
                    match self.cache.purge_expired() {
                        Ok(0) => {}
                        Ok(purged) => debug!(purged, "Purged expired cache entries"),
                        Err(e) => warn!(error = %e, "Cache sweep failed"),
                    }
                }
            }
        }
    }
}
