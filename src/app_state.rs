use std::{sync::Arc, time::Duration};

use crate::{
    config::Config,
    domain::ChainSet,
    error::TransferError,
    infrastructure::upstream::UpstreamClient,
    service::{
        load_chain_set, ChainQueryGateway, ChainRegistry, SessionStore, SimulatedChainQuery,
        SimulatedTransferExecutor, StaticChainRegistry, TransferExecutor, UpstreamChainQuery,
        UpstreamChainRegistry, UpstreamTransferExecutor,
    },
};

/// 应用状态
/// 包含所有共享资源
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// 启动时加载一次；降级启动时保存加载错误，会话创建直接返回该错误
    pub chains: Result<Arc<ChainSet>, TransferError>,
    pub executor: Arc<dyn TransferExecutor>,
    pub gateway: Arc<dyn ChainQueryGateway>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    /// 根据配置装配协作方：配置了上游地址时全部走 HTTP，否则使用静态目录和模拟实现
    pub async fn new(config: Arc<Config>) -> anyhow::Result<Self> {
        let (registry, executor, gateway): (
            Box<dyn ChainRegistry>,
            Arc<dyn TransferExecutor>,
            Arc<dyn ChainQueryGateway>,
        ) = match UpstreamClient::from_config(&config.upstream)? {
            Some(client) => {
                tracing::info!(base_url=%client.base_url(), "using_upstream_collaborators");
                let client = Arc::new(client);
                (
                    Box::new(UpstreamChainRegistry::new(client.clone())),
                    Arc::new(UpstreamTransferExecutor::new(client.clone())),
                    Arc::new(UpstreamChainQuery::new(client)),
                )
            }
            None => {
                let latency = Duration::from_millis(config.simulation.latency_ms);
                tracing::info!(
                    latency_ms = config.simulation.latency_ms,
                    "using_simulated_collaborators"
                );
                (
                    Box::new(StaticChainRegistry::new(config.chains.supported.clone())),
                    Arc::new(SimulatedTransferExecutor::new(latency)),
                    Arc::new(SimulatedChainQuery::new(latency)),
                )
            }
        };

        let chains = load_chain_set(registry.as_ref()).await.map(Arc::new);
        Ok(Self::with_parts(config, chains, executor, gateway))
    }

    pub fn with_parts(
        config: Arc<Config>,
        chains: Result<Arc<ChainSet>, TransferError>,
        executor: Arc<dyn TransferExecutor>,
        gateway: Arc<dyn ChainQueryGateway>,
    ) -> Self {
        let sessions = Arc::new(SessionStore::new(
            config.sessions.max_sessions,
            Duration::from_secs(config.sessions.idle_ttl_secs),
        ));
        Self {
            config,
            chains,
            executor,
            gateway,
            sessions,
        }
    }

    pub fn chain_set(&self) -> Result<Arc<ChainSet>, TransferError> {
        self.chains.clone()
    }

    pub fn is_simulated(&self) -> bool {
        self.config.upstream.base_url.is_none()
    }
}
