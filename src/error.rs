// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{InvalidWalletId, WalletId};
use crate::storage::StoreError;

// =============================================================================
// Domain Errors
// =============================================================================

/// Failures reported by [`crate::service::WalletService`].
///
/// Cache failures never appear here; they are logged and swallowed.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error(transparent)]
    InvalidIdentifier(#[from] InvalidWalletId),

    #[error("amount must be positive with at most two decimal places, got {0}")]
    InvalidAmount(Decimal),

    #[error("wallet {0} not found")]
    NotFound(WalletId),

    #[error("insufficient balance in wallet {wallet_id}: balance {balance}, requested {requested}")]
    InsufficientBalance {
        wallet_id: WalletId,
        balance: Decimal,
        requested: Decimal,
    },

    #[error("operation failed: {0}")]
    OperationFailed(#[source] StoreError),
}

// =============================================================================
// HTTP Errors
// =============================================================================

pub const INVALID_ID_MESSAGE: &str = "Invalid wallet UUID";
pub const NOT_FOUND_MESSAGE: &str = "Wallet not found";
pub const INSUFFICIENT_BALANCE_MESSAGE: &str = "Not enough balance";
pub const OPERATION_FAILED_MESSAGE: &str = "Operation failed";
pub const VALIDATION_FAILED_MESSAGE: &str = "JSON validation failed";

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }
}

impl From<WalletError> for ApiError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::InvalidIdentifier(_) => ApiError::bad_request(INVALID_ID_MESSAGE),
            WalletError::InvalidAmount(_) => ApiError::unprocessable(VALIDATION_FAILED_MESSAGE),
            WalletError::NotFound(_) => ApiError::not_found(NOT_FOUND_MESSAGE),
            WalletError::InsufficientBalance { .. } => {
                ApiError::bad_request(INSUFFICIENT_BALANCE_MESSAGE)
            }
            WalletError::OperationFailed(_) => ApiError::bad_request(OPERATION_FAILED_MESSAGE),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Rejected operation body");
        ApiError::unprocessable(VALIDATION_FAILED_MESSAGE)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            message: self.message,
        });
        (self.status, body).into_response()
    }
}
