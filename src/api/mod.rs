// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{BalanceResponse, MessageResponse, OperationRequest, OperationType},
    state::AppState,
};

pub mod health;
pub mod wallets;

pub fn router(state: AppState) -> Router {
    let wallet_routes = Router::new()
        .route("/{wallet_id}", get(wallets::get_balance))
        .route("/{wallet_id}/operation", post(wallets::wallet_operation));

    Router::new()
        .nest("/api/v1/wallets", wallet_routes)
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state)
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(cors())
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Wallet"),
    paths(
        wallets::get_balance,
        wallets::wallet_operation,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            BalanceResponse,
            MessageResponse,
            OperationRequest,
            OperationType,
            health::HealthResponse,
            health::ReadyResponse,
            health::HealthChecks
        )
    ),
    tags(
        (name = "Wallets", description = "Wallet balances and operations"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
