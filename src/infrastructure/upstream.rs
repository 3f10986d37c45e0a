//! 上游 Dashboard API 客户端：带超时的 JSON over HTTP
//!
//! 环境变量：
//! - UPSTREAM_BASE_URL（未设置时使用模拟实现）
//! - UPSTREAM_TIMEOUT_MS（默认 10000）
//! - UPSTREAM_RETRIES（默认 2，仅用于幂等的 GET 查询，且只重试传输失败和 5xx）

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};

use crate::config::UpstreamConfig;

#[derive(Clone)]
pub struct UpstreamClient {
    base_url: String,
    retries: usize,
    client: reqwest::Client,
}

impl UpstreamClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration, retries: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build upstream HTTP client")?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retries,
            client,
        })
    }

    /// 从配置创建；未配置 base_url 时返回 None
    pub fn from_config(config: &UpstreamConfig) -> Result<Option<Self>> {
        config
            .base_url
            .as_deref()
            .map(|url| {
                Self::new(
                    url,
                    Duration::from_millis(config.timeout_ms),
                    config.retries,
                )
            })
            .transpose()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET 查询；传输失败和 5xx 按指数回退重试，4xx 与响应体解析失败直接返回
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = self.url(path);
        let mut attempt = 0usize;
        loop {
            let start = Instant::now();
            let res = self.client.get(&url).query(query).send().await;
            match Self::decode::<T>(res).await {
                Ok(v) => {
                    tracing::debug!(
                        url=%url,
                        elapsed_ms=start.elapsed().as_millis() as u64,
                        "upstream_get_ok"
                    );
                    return Ok(v);
                }
                Err(UpstreamFailure::Transient(e)) if attempt < self.retries => {
                    attempt += 1;
                    tracing::warn!(url=%url, attempt, error=%e, "upstream_get_retry");
                    let backoff = 50 * (1u64 << attempt.min(5));
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
                Err(failure) => return Err(failure.into_inner()),
            }
        }
    }

    /// POST 请求，只尝试一次
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.url(path);
        let start = Instant::now();
        let res = self.client.post(&url).json(body).send().await;
        let decoded = Self::decode::<T>(res)
            .await
            .map_err(UpstreamFailure::into_inner);
        tracing::debug!(
            url=%url,
            elapsed_ms=start.elapsed().as_millis() as u64,
            ok=decoded.is_ok(),
            "upstream_post"
        );
        decoded
    }

    async fn decode<T: DeserializeOwned>(
        res: reqwest::Result<reqwest::Response>,
    ) -> Result<T, UpstreamFailure> {
        let resp = res
            .context("upstream request failed")
            .map_err(UpstreamFailure::Transient)?;
        let status = resp.status();
        if !status.is_success() {
            let err = anyhow::anyhow!("upstream returned HTTP {}", status.as_u16());
            return Err(if status.is_server_error() {
                UpstreamFailure::Transient(err)
            } else {
                UpstreamFailure::Permanent(err)
            });
        }
        resp.json::<T>()
            .await
            .context("upstream returned an undecodable body")
            .map_err(UpstreamFailure::Permanent)
    }
}

/// 单次请求的失败分类
enum UpstreamFailure {
    /// 传输失败或 5xx，重试可能成功
    Transient(anyhow::Error),
    /// 4xx 或响应体无法解析，重试结果相同
    Permanent(anyhow::Error),
}

impl UpstreamFailure {
    fn into_inner(self) -> anyhow::Error {
        match self {
            Self::Transient(e) | Self::Permanent(e) => e,
        }
    }
}
