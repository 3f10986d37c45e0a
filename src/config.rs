//! 配置管理模块
//! 支持从环境变量和配置文件加载配置

use std::{collections::HashSet, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::{chain::default_catalog, ChainInfo};

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub chains: ChainsConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// 链注册表加载失败时仍然启动（会话创建返回 503）
    pub allow_degraded_start: bool,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "text"
    pub enable_file_logging: bool,
    pub log_file_path: Option<String>,
}

/// 静态链目录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainsConfig {
    pub supported: Vec<ChainInfo>,
}

/// 上游 Dashboard API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// 设置后链注册表、转账执行、链上查询都走 HTTP
    pub base_url: Option<String>,
    pub timeout_ms: u64,
    #[serde(default)]
    pub retries: usize,
}

/// 模拟执行器配置（未配置上游时使用）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub latency_ms: u64,
}

/// 会话配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    pub max_sessions: usize,
    /// 非 Submitting 会话空闲超过该秒数即被回收
    #[serde(default = "default_idle_ttl_secs")]
    pub idle_ttl_secs: u64,
}

fn default_idle_ttl_secs() -> u64 {
    1800
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8088".into()),
            allow_degraded_start: std::env::var("ALLOW_DEGRADED_START")
                .ok()
                .map(|v| v == "1")
                .unwrap_or(false),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".into()),
            enable_file_logging: std::env::var("LOG_FILE_ENABLED")
                .ok()
                .map(|v| v == "1")
                .unwrap_or(false),
            log_file_path: std::env::var("LOG_FILE_PATH").ok(),
        }
    }
}

impl Default for ChainsConfig {
    fn default() -> Self {
        Self {
            supported: default_catalog(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("UPSTREAM_BASE_URL")
                .ok()
                .filter(|s| !s.is_empty()),
            timeout_ms: std::env::var("UPSTREAM_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10_000),
            retries: std::env::var("UPSTREAM_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            latency_ms: std::env::var("SIMULATED_LATENCY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(800),
        }
    }
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            max_sessions: std::env::var("MAX_TRANSFER_SESSIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024),
            idle_ttl_secs: std::env::var("TRANSFER_SESSION_IDLE_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_idle_ttl_secs),
        }
    }
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            chains: ChainsConfig::default(),
            upstream: UpstreamConfig::default(),
            simulation: SimulationConfig::default(),
            sessions: SessionsConfig::default(),
        })
    }

    /// 从配置文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse config file as TOML")?;

        Ok(config)
    }

    /// 从环境变量和配置文件合并加载（配置文件存在时整体覆盖）
    pub fn from_env_and_file<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let mut config = Self::from_env()?;

        if let Some(path) = path {
            if path.as_ref().exists() {
                config = Self::from_file(path)?;
            }
        }

        Ok(config)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("LOG_LEVEL must be one of: {:?}", valid_levels);
        }

        if self.logging.format != "json" && self.logging.format != "text" {
            anyhow::bail!("LOG_FORMAT must be 'json' or 'text'");
        }

        let mut seen = HashSet::new();
        for chain in &self.chains.supported {
            if chain.id.is_empty() {
                anyhow::bail!("chains.supported contains an empty chain id");
            }
            if !seen.insert(chain.id.as_str()) {
                anyhow::bail!("duplicate chain id in chains.supported: {}", chain.id);
            }
        }

        if let Some(url) = &self.upstream.base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("UPSTREAM_BASE_URL must start with http:// or https://");
            }
        }

        if self.sessions.max_sessions == 0 {
            anyhow::bail!("MAX_TRANSFER_SESSIONS must be greater than 0");
        }

        if self.sessions.idle_ttl_secs == 0 {
            anyhow::bail!("TRANSFER_SESSION_IDLE_TTL_SECS must be greater than 0");
        }

        Ok(())
    }
}
