//! 链注册表
//!
//! 启动时加载一次，之后在整个会话期间只读

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    domain::{ChainInfo, ChainSet},
    error::TransferError,
    infrastructure::upstream::UpstreamClient,
};

#[async_trait]
pub trait ChainRegistry: Send + Sync {
    /// 列出所有受支持的链
    async fn list_chains(&self) -> Result<Vec<ChainInfo>>;
}

/// 加载链集合；加载失败或列表为空都视为注册表不可用
pub async fn load_chain_set(registry: &dyn ChainRegistry) -> Result<ChainSet, TransferError> {
    let chains = registry.list_chains().await.map_err(|e| {
        tracing::error!(error=%e, "chain_registry_load_failed");
        TransferError::RegistryUnavailable(e.to_string())
    })?;

    let set = ChainSet::new(chains);
    if set.is_empty() {
        tracing::error!("chain_registry_empty");
        return Err(TransferError::RegistryUnavailable(
            "no supported chains".to_string(),
        ));
    }

    tracing::info!(
        chains=?set.chains().iter().map(|c| c.id.as_str()).collect::<Vec<_>>(),
        "chain_registry_loaded"
    );
    Ok(set)
}

// ============ 静态实现（配置文件） ============

pub struct StaticChainRegistry {
    chains: Vec<ChainInfo>,
}

impl StaticChainRegistry {
    pub fn new(chains: Vec<ChainInfo>) -> Self {
        Self { chains }
    }
}

#[async_trait]
impl ChainRegistry for StaticChainRegistry {
    async fn list_chains(&self) -> Result<Vec<ChainInfo>> {
        Ok(self.chains.clone())
    }
}

// ============ 上游实现 ============

/// 上游可能只返回链标识，也可能返回完整信息
#[derive(Deserialize)]
#[serde(untagged)]
enum ChainEntry {
    Id(String),
    Info(ChainInfo),
}

#[derive(Deserialize)]
struct ChainsEnvelope {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default)]
    chains: Vec<ChainEntry>,
    error: Option<String>,
}

fn default_success() -> bool {
    true
}

pub struct UpstreamChainRegistry {
    client: Arc<UpstreamClient>,
}

impl UpstreamChainRegistry {
    pub fn new(client: Arc<UpstreamClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChainRegistry for UpstreamChainRegistry {
    async fn list_chains(&self) -> Result<Vec<ChainInfo>> {
        let envelope: ChainsEnvelope = self.client.get_json("chains", &[]).await?;
        if !envelope.success {
            anyhow::bail!(envelope
                .error
                .unwrap_or_else(|| "Failed to fetch supported chains".to_string()));
        }
        Ok(envelope
            .chains
            .into_iter()
            .map(|entry| match entry {
                ChainEntry::Id(id) => ChainInfo::bare(id),
                ChainEntry::Info(info) => info,
            })
            .collect())
    }
}
