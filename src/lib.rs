// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet Ledger - Balance Service
//!
//! Minimal wallet ledger: fetch a balance, apply a deposit or withdrawal.
//! Balances live in an embedded ACID store; reads go through a TTL cache
//! that is refreshed after every committed operation.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `cache` - Read-through balance cache (LRU with TTL)
//! - `service` - Store/cache coordination and the non-negative balance rule
//! - `storage` - Durable balance store (redb)

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod service;
pub mod state;
pub mod storage;
