//! 日志系统配置模块
//! 支持结构化日志、日志级别配置和按天轮转的文件日志

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    fmt::{self, time::ChronoUtc},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::config::LoggingConfig;

const LOG_FILE_PREFIX: &str = "chainboard.log";

/// 初始化日志系统
///
/// 启用文件日志时返回后台写线程的 guard，调用方必须持有到进程退出
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    // RUST_LOG 优先于配置文件
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let json = config.format == "json";

    let stdout_layer = if json {
        fmt::layer()
            .json()
            .with_timer(ChronoUtc::rfc_3339())
            .boxed()
    } else {
        fmt::layer()
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(true)
            .boxed()
    };

    let (file_layer, guard) = if config.enable_file_logging {
        let log_dir = log_dir(config);
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory: {:?}", log_dir))?;

        let (writer, guard) = non_blocking(rolling::daily(&log_dir, LOG_FILE_PREFIX));
        let layer = if json {
            fmt::layer()
                .json()
                .with_writer(writer)
                .with_timer(ChronoUtc::rfc_3339())
                .boxed()
        } else {
            fmt::layer()
                .with_writer(writer)
                .with_timer(ChronoUtc::rfc_3339())
                .with_ansi(false)
                .boxed()
        };
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    Registry::default()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}

/// log_file_path 指向文件时取其目录，未配置时写到 ./logs
fn log_dir(config: &LoggingConfig) -> PathBuf {
    config
        .log_file_path
        .as_deref()
        .and_then(|p| Path::new(p).parent())
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("./logs"))
}
