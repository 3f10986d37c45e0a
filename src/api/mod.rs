use std::sync::Arc;

use axum::{
    http::Method,
    routing::{delete, get, post},
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

use crate::app_state::AppState;

pub mod handlers;
pub mod query_api; // 交易状态 / 余额 / Gas 价格
pub mod response;
pub mod transfer_api; // 批量转账会话

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::api_health,
        handlers::healthz,
        handlers::list_chains,
        transfer_api::create_session,
        transfer_api::get_session,
        transfer_api::delete_session,
        transfer_api::append_row,
        transfer_api::remove_row,
        transfer_api::update_row,
        transfer_api::submit,
        transfer_api::reset,
        query_api::tx_status,
        query_api::wallet_balance,
        query_api::gas_price
    ),
    components(
        schemas(
            handlers::HealthResponse,
            handlers::Healthz,
            transfer_api::UpdateRowReq,
            query_api::TxStatusQuery,
            query_api::ChainQuery,
            query_api::BalanceResp,
            query_api::GasPriceResp,
            crate::domain::ChainInfo,
            crate::domain::TransferRequest,
            crate::domain::TransferField,
            crate::domain::SettlementResult,
            crate::domain::BatchStatus,
            crate::service::TxReceipt
        )
    ),
    tags(
        (name = "Chainboard API", description = "Auto-generated OpenAPI via utoipa")
    )
)]
pub struct ApiDoc;

pub fn routes(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    let api = Router::new()
        .route("/api/v1/health", get(handlers::api_health))
        .route("/api/v1/chains", get(handlers::list_chains))
        // 批量转账会话
        .route(
            "/api/v1/transfer-sessions",
            post(transfer_api::create_session),
        )
        .route(
            "/api/v1/transfer-sessions/:id",
            get(transfer_api::get_session).delete(transfer_api::delete_session),
        )
        .route(
            "/api/v1/transfer-sessions/:id/rows",
            post(transfer_api::append_row),
        )
        .route(
            "/api/v1/transfer-sessions/:id/rows/:index",
            delete(transfer_api::remove_row).patch(transfer_api::update_row),
        )
        .route(
            "/api/v1/transfer-sessions/:id/submit",
            post(transfer_api::submit),
        )
        .route(
            "/api/v1/transfer-sessions/:id/reset",
            post(transfer_api::reset),
        )
        // 链上查询
        .route("/api/v1/tx-status", get(query_api::tx_status))
        .route("/api/v1/balance", get(query_api::wallet_balance))
        .route("/api/v1/gas-price", get(query_api::gas_price))
        .route(
            "/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .route("/healthz", get(handlers::healthz));

    api.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    )
    .with_state(state)
}
