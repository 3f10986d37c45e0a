//! 链上查询：交易状态、钱包余额、Gas 价格
//!
//! 与批量转账共享同一个链注册表，但各自独立，不经过批次状态机

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{domain::ChainId, infrastructure::upstream::UpstreamClient};

pub const TX_STATUS_FALLBACK_ERROR: &str = "Failed to fetch transaction status";
pub const BALANCE_FALLBACK_ERROR: &str = "Failed to fetch wallet balance";
pub const GAS_PRICE_FALLBACK_ERROR: &str = "Failed to fetch gas price";

/// 交易回执
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub transaction_hash: String,
    pub status: bool,
    pub block_number: u64,
    pub gas_used: u64,
}

#[async_trait]
pub trait ChainQueryGateway: Send + Sync {
    async fn transaction_status(&self, chain: &ChainId, tx_hash: &str) -> Result<TxReceipt>;

    /// Dashboard 配置钱包在该链上的余额（原生代币，十进制字符串）
    async fn wallet_balance(&self, chain: &ChainId) -> Result<String>;

    /// 当前 Gas 价格（Gwei，十进制字符串）
    async fn gas_price(&self, chain: &ChainId) -> Result<String>;
}

// ============ 上游实现 ============

fn default_success() -> bool {
    true
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TxStatusEnvelope {
    #[serde(default = "default_success")]
    success: bool,
    tx_receipt: Option<TxReceipt>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct BalanceEnvelope {
    #[serde(default = "default_success")]
    success: bool,
    balance: Option<serde_json::Value>,
    error: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GasPriceEnvelope {
    #[serde(default = "default_success")]
    success: bool,
    gas_price: Option<serde_json::Value>,
    error: Option<String>,
}

/// 失败信封优先使用上游的 error 文本
fn open_envelope<T>(
    success: bool,
    payload: Option<T>,
    error: Option<String>,
    fallback: &str,
) -> Result<T> {
    match payload {
        Some(payload) if success => Ok(payload),
        _ => anyhow::bail!(error
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| fallback.to_string())),
    }
}

/// 上游有时返回数字，有时返回字符串
fn numeric_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

pub struct UpstreamChainQuery {
    client: Arc<UpstreamClient>,
}

impl UpstreamChainQuery {
    pub fn new(client: Arc<UpstreamClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChainQueryGateway for UpstreamChainQuery {
    async fn transaction_status(&self, chain: &ChainId, tx_hash: &str) -> Result<TxReceipt> {
        let envelope: TxStatusEnvelope = self
            .client
            .get_json("tx-status", &[("chain", chain.as_str()), ("txHash", tx_hash)])
            .await?;
        open_envelope(
            envelope.success,
            envelope.tx_receipt,
            envelope.error,
            TX_STATUS_FALLBACK_ERROR,
        )
    }

    async fn wallet_balance(&self, chain: &ChainId) -> Result<String> {
        let envelope: BalanceEnvelope = self
            .client
            .get_json("balance", &[("chain", chain.as_str())])
            .await?;
        open_envelope(
            envelope.success,
            envelope.balance,
            envelope.error,
            BALANCE_FALLBACK_ERROR,
        )
        .map(numeric_string)
    }

    async fn gas_price(&self, chain: &ChainId) -> Result<String> {
        let envelope: GasPriceEnvelope = self
            .client
            .get_json("gas-price", &[("chain", chain.as_str())])
            .await?;
        open_envelope(
            envelope.success,
            envelope.gas_price,
            envelope.error,
            GAS_PRICE_FALLBACK_ERROR,
        )
        .map(numeric_string)
    }
}

// ============ 模拟实现（开发环境） ============

pub struct SimulatedChainQuery {
    latency: Duration,
}

impl SimulatedChainQuery {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    async fn pause(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl ChainQueryGateway for SimulatedChainQuery {
    async fn transaction_status(&self, chain: &ChainId, tx_hash: &str) -> Result<TxReceipt> {
        self.pause().await;
        let mut rng = rand::thread_rng();
        let receipt = TxReceipt {
            transaction_hash: tx_hash.to_string(),
            status: true,
            block_number: rng.gen_range(5_000_000..6_000_000),
            gas_used: rng.gen_range(21_000..200_000),
        };
        tracing::debug!(chain=%chain, tx_hash=%tx_hash, "simulated_tx_status");
        Ok(receipt)
    }

    async fn wallet_balance(&self, chain: &ChainId) -> Result<String> {
        self.pause().await;
        let balance: f64 = rand::thread_rng().gen_range(0.0..10.0);
        tracing::debug!(chain=%chain, "simulated_wallet_balance");
        Ok(format!("{:.6}", balance))
    }

    async fn gas_price(&self, chain: &ChainId) -> Result<String> {
        self.pause().await;
        let gwei: f64 = rand::thread_rng().gen_range(1.0..80.0);
        tracing::debug!(chain=%chain, "simulated_gas_price");
        Ok(format!("{:.2}", gwei))
    }
}
