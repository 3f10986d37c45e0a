//! Chainboard 主入口

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use chainboard::{api, app_state::AppState, config::Config, infrastructure::logging};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. 加载环境变量
    dotenvy::dotenv().ok();

    // 2. 加载配置（CONFIG_PATH 指向的 TOML 文件优先）
    let config_path = std::env::var("CONFIG_PATH").ok();
    let config = Config::from_env_and_file(config_path.as_deref())?;
    config.validate().context("invalid configuration")?;

    // 3. 初始化日志；guard 必须活到进程退出
    let _log_guard = logging::init_logging(&config.logging)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config_path = config_path.as_deref().unwrap_or("-"),
        "starting_chainboard"
    );

    // 4. 装配协作方并加载链注册表
    let config = Arc::new(config);
    let state = AppState::new(config.clone()).await?;
    if let Err(e) = &state.chains {
        if !config.server.allow_degraded_start {
            tracing::error!(error=%e, "chain_registry_unavailable_aborting");
            return Err(anyhow::anyhow!(e.clone())).context("chain registry unavailable");
        }
        tracing::warn!(error=%e, "starting_degraded_without_chain_registry");
    }

    // 5. 空闲会话清扫
    let sweep_every = Duration::from_secs((config.sessions.idle_ttl_secs / 4).max(1));
    let _sweeper = state.sessions.spawn_sweeper(sweep_every);

    // 6. 启动 HTTP 服务
    let app = api::routes(Arc::new(state));
    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_addr))?;
    tracing::info!(bind_addr=%config.server.bind_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("shutdown_complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error=%e, "failed_to_listen_for_shutdown_signal");
    }
    tracing::info!("shutdown_signal_received");
}
