// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet balance endpoints.
//!
//! Thin adapters over [`crate::service::WalletService`]: extract the path and
//! body, call the service, and map its errors through [`ApiError`].

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use crate::{
    error::ApiError,
    models::{BalanceResponse, MessageResponse, OperationRequest},
    state::AppState,
};

pub const OPERATION_SUCCEEDED_MESSAGE: &str = "Operation succeeded";

/// Get the balance of a wallet.
#[utoipa::path(
    get,
    path = "/api/v1/wallets/{wallet_id}",
    tag = "Wallets",
    params(
        ("wallet_id" = String, Path, description = "Wallet UUID")
    ),
    responses(
        (status = 200, description = "Current balance", body = BalanceResponse),
        (status = 400, description = "Invalid wallet UUID or storage failure", body = MessageResponse),
        (status = 404, description = "Wallet not found", body = MessageResponse)
    )
)]
pub async fn get_balance(
    State(state): State<AppState>,
    Path(wallet_id): Path<String>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let wallet = state.service.get_balance(&wallet_id).await?;
    Ok(Json(BalanceResponse::new(&wallet.id, wallet.balance)))
}

/// Deposit to or withdraw from a wallet.
#[utoipa::path(
    post,
    path = "/api/v1/wallets/{wallet_id}/operation",
    tag = "Wallets",
    params(
        ("wallet_id" = String, Path, description = "Wallet UUID")
    ),
    request_body = OperationRequest,
    responses(
        (status = 200, description = "Operation committed", body = MessageResponse),
        (status = 400, description = "Invalid wallet UUID, not enough balance, or operation failed", body = MessageResponse),
        (status = 404, description = "Wallet not found", body = MessageResponse),
        (status = 422, description = "Malformed request body", body = MessageResponse)
    )
)]
pub async fn wallet_operation(
    State(state): State<AppState>,
    Path(wallet_id): Path<String>,
    payload: Result<Json<OperationRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(request) = payload?;
    state
        .service
        .apply_operation(&wallet_id, request.operation_type, request.amount)
        .await?;
    Ok(Json(MessageResponse::new(OPERATION_SUCCEEDED_MESSAGE)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::http::StatusCode;
    use rust_decimal_macros::dec;

    use crate::cache::{BalanceCache, LruBalanceCache, DEFAULT_CACHE_TTL};
    use crate::error::{INSUFFICIENT_BALANCE_MESSAGE, INVALID_ID_MESSAGE, NOT_FOUND_MESSAGE};
    use crate::models::{OperationType, WalletId};
    use crate::service::{ServiceSettings, WalletService};
    use crate::storage::MemoryBalanceStore;

    const WALLET: &str = "123e4567-e89b-12d3-a456-426614174000";

    fn state_with(balance: rust_decimal::Decimal) -> (AppState, Arc<LruBalanceCache>) {
        let id = WalletId::parse(WALLET).unwrap();
        let cache = Arc::new(LruBalanceCache::new(16));
        let store = MemoryBalanceStore::with_wallets([(id, balance)]).unwrap();
        let service = WalletService::new(
            Arc::new(store),
            Arc::clone(&cache) as Arc<dyn BalanceCache>,
            ServiceSettings::default(),
        );
        (AppState::new(service), cache)
    }

    fn request(operation_type: OperationType, amount: rust_decimal::Decimal) -> OperationRequest {
        OperationRequest {
            operation_type,
            amount,
        }
    }

    #[tokio::test]
    async fn get_balance_returns_formatted_balance() {
        let (state, _) = state_with(dec!(1000));
        let Json(body) = get_balance(State(state), Path(WALLET.to_string()))
            .await
            .expect("balance succeeds");
        assert_eq!(body.id, WALLET);
        assert_eq!(body.balance, "1000.00");
    }

    #[tokio::test]
    async fn get_balance_serves_cached_value() {
        let (state, cache) = state_with(dec!(1000));
        let id = WalletId::parse(WALLET).unwrap();
        cache.set(&id, dec!(55.5), DEFAULT_CACHE_TTL).await.unwrap();

        let Json(body) = get_balance(State(state), Path(WALLET.to_string()))
            .await
            .unwrap();
        assert_eq!(body.balance, "55.50");
    }

    #[tokio::test]
    async fn get_balance_rejects_bad_id() {
        let (state, _) = state_with(dec!(1000));
        let err = get_balance(State(state), Path("123e4567".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, INVALID_ID_MESSAGE);
    }

    #[tokio::test]
    async fn get_balance_unknown_wallet() {
        let (state, _) = state_with(dec!(1000));
        let err = get_balance(
            State(state),
            Path("123e4567-e89b-12d3-a456-426614174001".to_string()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, NOT_FOUND_MESSAGE);
    }

    #[tokio::test]
    async fn deposit_updates_cache() {
        let (state, cache) = state_with(dec!(1000));
        let Json(body) = wallet_operation(
            State(state),
            Path(WALLET.to_string()),
            Ok(Json(request(OperationType::Deposit, dec!(1000)))),
        )
        .await
        .expect("deposit succeeds");
        assert_eq!(body.message, OPERATION_SUCCEEDED_MESSAGE);

        let id = WalletId::parse(WALLET).unwrap();
        assert_eq!(cache.get(&id).await.unwrap(), Some(dec!(2000.00)));
    }

    #[tokio::test]
    async fn overdraw_is_bad_request_and_cache_untouched() {
        let (state, cache) = state_with(dec!(1000));
        let err = wallet_operation(
            State(state),
            Path(WALLET.to_string()),
            Ok(Json(request(OperationType::Withdraw, dec!(1001)))),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, INSUFFICIENT_BALANCE_MESSAGE);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn zero_amount_is_unprocessable() {
        let (state, _) = state_with(dec!(1000));
        let err = wallet_operation(
            State(state),
            Path(WALLET.to_string()),
            Ok(Json(request(OperationType::Deposit, dec!(0)))),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
