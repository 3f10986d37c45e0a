use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    api::response::{success_response, ApiResponse},
    app_state::AppState,
    domain::ChainInfo,
    error::AppError,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses((status = 200, description = "OK", body = crate::api::response::ApiResponse<HealthResponse>))
)]
pub async fn api_health() -> Result<Json<ApiResponse<HealthResponse>>, AppError> {
    success_response(HealthResponse {
        status: "ok".into(),
    })
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Healthz {
    pub status: String,
    pub registry_ok: bool,
    pub upstream: String,
    pub open_sessions: usize,
    pub version: String,
}

/// 注册表加载失败时报告 degraded，进程仍然存活
#[utoipa::path(
    get,
    path = "/healthz",
    responses((status = 200, description = "OK", body = crate::api::response::ApiResponse<Healthz>))
)]
pub async fn healthz(
    State(st): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Healthz>>, AppError> {
    let registry_ok = st.chains.is_ok();
    let status = if registry_ok { "ok" } else { "degraded" };
    let upstream = if st.is_simulated() {
        "simulated".to_string()
    } else {
        "http".to_string()
    };
    let version = format!(
        "{}+{}",
        env!("CARGO_PKG_VERSION"),
        option_env!("GIT_HASH").unwrap_or("dev")
    );
    success_response(Healthz {
        status: status.into(),
        registry_ok,
        upstream,
        open_sessions: st.sessions.len().await,
        version,
    })
}

/// GET /api/v1/chains
///
/// 受支持的链及其原生代币、区块浏览器地址
#[utoipa::path(
    get,
    path = "/api/v1/chains",
    responses(
        (status = 200, description = "Supported chains", body = crate::api::response::ApiResponse<Vec<ChainInfo>>),
        (status = 503, description = "Chain registry unavailable")
    ),
    tag = "Chains"
)]
pub async fn list_chains(
    State(st): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<ChainInfo>>>, AppError> {
    let chains = st.chain_set()?;
    success_response(chains.chains().to_vec())
}
