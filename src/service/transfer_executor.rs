//! 转账执行方
//!
//! 每个批次只调用一次 `submit`，返回与请求顺序一一对应的结算结果

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

pub use crate::domain::ValidatedTransfer;
use crate::{
    domain::SettlementResult, error::TransferError, infrastructure::upstream::UpstreamClient,
};

#[async_trait]
pub trait TransferExecutor: Send + Sync {
    /// 提交整批转账
    ///
    /// 失败信封和传输错误都以 `TransferError::ExecutorFailed` 返回
    async fn submit(
        &self,
        transfers: &[ValidatedTransfer],
    ) -> Result<Vec<SettlementResult>, TransferError>;
}

/// 上游响应信封：`{ success, results }` 或 `{ success: false, error }`
#[derive(Debug, Deserialize)]
pub struct ExecutorEnvelope {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub results: Option<Vec<SettlementResult>>,
    #[serde(default)]
    pub error: Option<String>,
}

pub const DEFAULT_EXECUTOR_ERROR: &str = "Failed to process transfers";

impl ExecutorEnvelope {
    pub fn into_results(self) -> Result<Vec<SettlementResult>, TransferError> {
        match (self.success, self.results) {
            (Some(false), _) | (_, None) => Err(TransferError::ExecutorFailed(
                self.error
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| DEFAULT_EXECUTOR_ERROR.to_string()),
            )),
            (_, Some(results)) => Ok(results),
        }
    }
}

// ============ 上游实现 ============

#[derive(Serialize)]
struct MultiTransferBody<'a> {
    transfers: &'a [ValidatedTransfer],
}

pub struct UpstreamTransferExecutor {
    client: Arc<UpstreamClient>,
}

impl UpstreamTransferExecutor {
    pub fn new(client: Arc<UpstreamClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TransferExecutor for UpstreamTransferExecutor {
    async fn submit(
        &self,
        transfers: &[ValidatedTransfer],
    ) -> Result<Vec<SettlementResult>, TransferError> {
        let envelope: ExecutorEnvelope = self
            .client
            .post_json("multi-transfer", &MultiTransferBody { transfers })
            .await
            .map_err(|e| {
                tracing::error!(error=?e, "multi_transfer_request_failed");
                TransferError::ExecutorFailed(format!("{:#}", e))
            })?;
        envelope.into_results()
    }
}

// ============ 模拟实现（开发环境） ============

pub struct SimulatedTransferExecutor {
    latency: Duration,
}

impl SimulatedTransferExecutor {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

/// 由请求内容和随机数派生一个 0x 前缀的 Keccak-256 交易哈希
pub fn simulated_tx_hash(transfer: &ValidatedTransfer, index: usize, salt: u64) -> String {
    let mut hasher = Keccak256::new();
    hasher.update(transfer.from_chain.as_str().as_bytes());
    hasher.update(transfer.to_chain.as_str().as_bytes());
    hasher.update(transfer.amount.as_bytes());
    hasher.update((index as u64).to_be_bytes());
    hasher.update(salt.to_be_bytes());
    format!("0x{}", hex::encode(hasher.finalize()))
}

#[async_trait]
impl TransferExecutor for SimulatedTransferExecutor {
    async fn submit(
        &self,
        transfers: &[ValidatedTransfer],
    ) -> Result<Vec<SettlementResult>, TransferError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let mut rng = rand::thread_rng();
        let base_block: u64 = rng.gen_range(5_000_000..6_000_000);
        let results = transfers
            .iter()
            .enumerate()
            .map(|(index, transfer)| SettlementResult {
                transaction_hash: simulated_tx_hash(transfer, index, rng.gen()),
                succeeded: true,
                block_number: base_block + index as u64,
            })
            .collect();

        tracing::debug!(count = transfers.len(), "simulated_multi_transfer");
        Ok(results)
    }
}
