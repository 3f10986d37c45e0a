// 链上查询 API
// GET /api/v1/tx-status?chain=ETH&txHash=0x...
// GET /api/v1/balance?chain=ETH
// GET /api/v1/gas-price?chain=ETH

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    api::response::{success_response, ApiResponse},
    app_state::AppState,
    domain::{ChainId, ChainSet},
    error::AppError,
    service::TxReceipt,
};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TxStatusQuery {
    #[serde(default)]
    pub chain: String,
    #[serde(default)]
    pub tx_hash: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ChainQuery {
    #[serde(default)]
    pub chain: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResp {
    pub chain: String,
    pub balance: String,
    pub native_token: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GasPriceResp {
    pub chain: String,
    pub gas_price: String,
    pub unit: String,
}

/// 链必须在注册表中
fn supported_chain(chains: &ChainSet, chain: &str) -> Result<ChainId, AppError> {
    if !chains.contains_str(chain) {
        return Err(AppError::chain_not_supported(format!(
            "Unsupported chain: {}",
            chain
        )));
    }
    Ok(ChainId::new(chain))
}

fn upstream_error(e: anyhow::Error) -> AppError {
    AppError::external_service_error(format!("{:#}", e))
}

/// GET /api/v1/tx-status
#[utoipa::path(
    get,
    path = "/api/v1/tx-status",
    params(
        ("chain" = String, Query, description = "Chain id, e.g. ETH"),
        ("txHash" = String, Query, description = "Transaction hash")
    ),
    responses(
        (status = 200, description = "Transaction receipt", body = crate::api::response::ApiResponse<TxReceipt>),
        (status = 400, description = "Missing parameters or unsupported chain"),
        (status = 502, description = "Upstream lookup failed")
    ),
    tag = "Chain Query"
)]
pub async fn tx_status(
    State(st): State<Arc<AppState>>,
    Query(query): Query<TxStatusQuery>,
) -> Result<Json<ApiResponse<TxReceipt>>, AppError> {
    let chain = query.chain.trim();
    let tx_hash = query.tx_hash.trim();
    if chain.is_empty() || tx_hash.is_empty() {
        return Err(AppError::invalid_parameter(
            "Please provide both chain and transaction hash",
        ));
    }
    let chains = st.chain_set()?;
    let chain = supported_chain(&chains, chain)?;

    let receipt = st
        .gateway
        .transaction_status(&chain, tx_hash)
        .await
        .map_err(|e| {
            tracing::warn!(chain=%chain, tx_hash=%tx_hash, error=%e, "tx_status_lookup_failed");
            upstream_error(e)
        })?;

    tracing::info!(
        chain=%chain,
        tx_hash=%tx_hash,
        status=receipt.status,
        block_number=receipt.block_number,
        "tx_status_fetched"
    );
    success_response(receipt)
}

/// GET /api/v1/balance
#[utoipa::path(
    get,
    path = "/api/v1/balance",
    params(("chain" = String, Query, description = "Chain id, e.g. ETH")),
    responses(
        (status = 200, description = "Wallet balance", body = crate::api::response::ApiResponse<BalanceResp>),
        (status = 400, description = "Missing or unsupported chain"),
        (status = 502, description = "Upstream lookup failed")
    ),
    tag = "Chain Query"
)]
pub async fn wallet_balance(
    State(st): State<Arc<AppState>>,
    Query(query): Query<ChainQuery>,
) -> Result<Json<ApiResponse<BalanceResp>>, AppError> {
    let chain = query.chain.trim();
    if chain.is_empty() {
        return Err(AppError::invalid_parameter("Please select a chain"));
    }
    let chains = st.chain_set()?;
    let chain = supported_chain(&chains, chain)?;

    let balance = st.gateway.wallet_balance(&chain).await.map_err(|e| {
        tracing::warn!(chain=%chain, error=%e, "wallet_balance_lookup_failed");
        upstream_error(e)
    })?;

    // 注册表只给了标识符时，原生代币为空
    let native_token = chains
        .get(chain.as_str())
        .map(|c| c.native_token.clone())
        .unwrap_or_default();

    success_response(BalanceResp {
        chain: chain.to_string(),
        balance,
        native_token,
    })
}

/// GET /api/v1/gas-price
#[utoipa::path(
    get,
    path = "/api/v1/gas-price",
    params(("chain" = String, Query, description = "Chain id, e.g. ETH")),
    responses(
        (status = 200, description = "Current gas price in gwei", body = crate::api::response::ApiResponse<GasPriceResp>),
        (status = 400, description = "Missing or unsupported chain"),
        (status = 502, description = "Upstream lookup failed")
    ),
    tag = "Chain Query"
)]
pub async fn gas_price(
    State(st): State<Arc<AppState>>,
    Query(query): Query<ChainQuery>,
) -> Result<Json<ApiResponse<GasPriceResp>>, AppError> {
    let chain = query.chain.trim();
    if chain.is_empty() {
        return Err(AppError::invalid_parameter("Please select a chain"));
    }
    let chains = st.chain_set()?;
    let chain = supported_chain(&chains, chain)?;

    let gas_price = st.gateway.gas_price(&chain).await.map_err(|e| {
        tracing::warn!(chain=%chain, error=%e, "gas_price_lookup_failed");
        upstream_error(e)
    })?;

    success_response(GasPriceResp {
        chain: chain.to_string(),
        gas_price,
        unit: "gwei".into(),
    })
}
