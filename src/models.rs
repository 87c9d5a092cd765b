// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Ledger Data Models
//!
//! Domain types shared by the store, the cache, the service and the REST API.
//!
//! ## Wallet Identifier
//!
//! [`WalletId`] wraps a UUID and only accepts the canonical dashed form
//! (`8-4-4-4-12` hexadecimal groups). Anything else is rejected before a
//! store or cache is touched.
//!
//! ## Money
//!
//! Balances and amounts are [`Decimal`] values at scale 2. They are never
//! converted through floating point.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Number of fractional digits kept for every balance.
pub const BALANCE_SCALE: u32 = 2;

// =============================================================================
// Wallet Identifier
// =============================================================================

/// Canonical wallet identifier.
///
/// Displays as the lowercase hyphenated UUID, which is also the store and
/// cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WalletId(Uuid);

/// Returned when a string is not a canonical dashed UUID.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid wallet identifier: {0:?}")]
pub struct InvalidWalletId(pub String);

impl WalletId {
    /// Parse a wallet id, accepting only the `8-4-4-4-12` hyphenated form.
    ///
    /// `Uuid::parse_str` alone also takes the simple, braced and URN forms,
    /// so the layout is checked first.
    pub fn parse(raw: &str) -> Result<Self, InvalidWalletId> {
        let bytes = raw.as_bytes();
        let well_formed = bytes.len() == 36
            && bytes.iter().enumerate().all(|(i, b)| match i {
                8 | 13 | 18 | 23 => *b == b'-',
                _ => b.is_ascii_hexdigit(),
            });
        if !well_formed {
            return Err(InvalidWalletId(raw.to_string()));
        }
        Uuid::parse_str(raw)
            .map(WalletId)
            .map_err(|_| InvalidWalletId(raw.to_string()))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Key used by the store and the cache.
    pub fn key(&self) -> String {
        self.0.hyphenated().to_string()
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for WalletId {
    type Err = InvalidWalletId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Uuid> for WalletId {
    fn from(value: Uuid) -> Self {
        WalletId(value)
    }
}

// =============================================================================
// Balance Helpers
// =============================================================================

/// Rescale a balance to exactly two fractional digits.
pub fn normalize_balance(value: Decimal) -> Decimal {
    let mut scaled = value.round_dp(BALANCE_SCALE);
    scaled.rescale(BALANCE_SCALE);
    scaled
}

/// Render a balance as its canonical string, e.g. `"2000.00"`.
pub fn format_balance(value: Decimal) -> String {
    normalize_balance(value).to_string()
}

// =============================================================================
// Wallet Record
// =============================================================================

/// A wallet as held by a [`crate::storage::BalanceStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletRecord {
    pub id: WalletId,
    pub balance: Decimal,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Operation Models
// =============================================================================

/// Balance mutation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationType {
    /// Add the amount to the balance.
    Deposit,
    /// Subtract the amount from the balance; never below zero.
    Withdraw,
}

impl OperationType {
    /// Signed delta this operation applies for `amount`.
    pub fn delta(self, amount: Decimal) -> Decimal {
        match self {
            OperationType::Deposit => amount,
            OperationType::Withdraw => -amount,
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationType::Deposit => f.write_str("DEPOSIT"),
            OperationType::Withdraw => f.write_str("WITHDRAW"),
        }
    }
}

/// Request body for `POST /api/v1/wallets/{wallet_id}/operation`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OperationRequest {
    /// `DEPOSIT` or `WITHDRAW`.
    #[serde(rename = "operationType")]
    pub operation_type: OperationType,
    /// Strictly positive amount with at most two decimal places.
    #[schema(value_type = f64, example = 1000.0)]
    pub amount: Decimal,
}

/// A strictly positive amount with at most [`BALANCE_SCALE`] decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Amount(Decimal);

impl Amount {
    /// Returns `None` for zero, negative, or sub-cent amounts.
    pub fn new(value: Decimal) -> Option<Self> {
        if value <= Decimal::ZERO || value.normalize().scale() > BALANCE_SCALE {
            return None;
        }
        Some(Amount(normalize_balance(value)))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

// =============================================================================
// Response Models
// =============================================================================

/// Balance of a single wallet.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct BalanceResponse {
    /// Wallet identifier (hyphenated UUID).
    pub id: String,
    /// Balance rendered with two decimal places.
    #[schema(example = "1000.00")]
    pub balance: String,
}

impl BalanceResponse {
    pub fn new(id: &WalletId, balance: Decimal) -> Self {
        Self {
            id: id.to_string(),
            balance: format_balance(balance),
        }
    }
}

/// Plain message body used for operation results and errors.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
