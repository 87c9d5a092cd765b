// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use wallet_ledger::{
    api::router,
    cache::{BalanceCache, CacheJanitor, LruBalanceCache},
    config::{AppConfig, DEFAULT_LOG_FILTER},
    logging::init_logging,
    service::WalletService,
    state::AppState,
    storage::{BalanceStore, RedbBalanceStore},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    init_logging(DEFAULT_LOG_FILTER, config.log_format);

    // Open the balance database
    let db_path = config.db_path();
    let store = Arc::new(RedbBalanceStore::open(&db_path)?);
    info!(path = %db_path.display(), "Balance store opened");

    for (id, balance) in &config.seed_wallets {
        if store.create_wallet(id, *balance).await? {
            info!(wallet_id = %id, %balance, "Seeded wallet");
        } else {
            warn!(wallet_id = %id, "Seed wallet already exists, keeping stored balance");
        }
    }

    let cache = Arc::new(LruBalanceCache::new(config.cache_capacity));
    let shutdown = CancellationToken::new();

    let janitor = CacheJanitor::new(Arc::clone(&cache)).with_interval(config.cache_sweep_interval);
    let janitor_handle = tokio::spawn(janitor.run(shutdown.clone()));

    let service = WalletService::new(
        store as Arc<dyn BalanceStore>,
        cache as Arc<dyn BalanceCache>,
        config.service_settings(),
    );
    let app = router(AppState::new(service));

    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Wallet ledger listening (docs at /api/docs)");

    tokio::spawn(watch_signals(shutdown.clone()));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .await?;

    shutdown.cancel();
    if let Err(e) = janitor_handle.await {
        warn!(error = %e, "Cache janitor did not stop cleanly");
    }
    info!("Wallet ledger stopped");
    Ok(())
}

/// Cancel `shutdown` on Ctrl-C (and SIGTERM on Unix).
async fn watch_signals(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
    shutdown.cancel();
}
