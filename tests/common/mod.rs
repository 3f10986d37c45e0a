//! 测试辅助模块
//! 提供测试用应用状态、路由请求和假执行方

#![allow(dead_code)]

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chainboard::{
    api,
    app_state::AppState,
    config::Config,
    domain::{ChainSet, SettlementResult},
    error::TransferError,
    service::{ChainQueryGateway, SimulatedChainQuery, TransferExecutor, ValidatedTransfer},
};
use serde_json::Value;
use tokio::sync::Notify;
use tower::ServiceExt;

/// 固定结果的执行方，记录收到的批次；设置 gate 后在 release 前挂起
pub struct FakeExecutor {
    pub calls: AtomicUsize,
    pub batches: Mutex<Vec<Vec<ValidatedTransfer>>>,
    pub response: Result<Vec<SettlementResult>, TransferError>,
    pub gate: Option<Notify>,
}

impl FakeExecutor {
    pub fn returning(response: Result<Vec<SettlementResult>, TransferError>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            batches: Mutex::new(Vec::new()),
            response,
            gate: None,
        })
    }

    pub fn gated(response: Result<Vec<SettlementResult>, TransferError>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            batches: Mutex::new(Vec::new()),
            response,
            gate: Some(Notify::new()),
        })
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransferExecutor for FakeExecutor {
    async fn submit(
        &self,
        transfers: &[ValidatedTransfer],
    ) -> Result<Vec<SettlementResult>, TransferError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.batches.lock().unwrap().push(transfers.to_vec());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.response.clone()
    }
}

pub fn settlement(hash: &str, succeeded: bool, block: u64) -> SettlementResult {
    SettlementResult {
        transaction_hash: hash.to_string(),
        succeeded,
        block_number: block,
    }
}

pub fn test_config(max_sessions: usize) -> Arc<Config> {
    let mut config = Config::from_env().expect("config");
    config.upstream.base_url = None;
    config.simulation.latency_ms = 0;
    config.sessions.max_sessions = max_sessions;
    Arc::new(config)
}

/// 链集合为 ETH / POLYGON / BNB 的测试应用
pub fn test_app(executor: Arc<dyn TransferExecutor>) -> Router {
    test_app_with(
        Ok(Arc::new(ChainSet::from_ids(["ETH", "POLYGON", "BNB"]))),
        executor,
        Arc::new(SimulatedChainQuery::new(Duration::ZERO)),
        16,
    )
}

pub fn test_app_with(
    chains: Result<Arc<ChainSet>, TransferError>,
    executor: Arc<dyn TransferExecutor>,
    gateway: Arc<dyn ChainQueryGateway>,
    max_sessions: usize,
) -> Router {
    let state = AppState::with_parts(test_config(max_sessions), chains, executor, gateway);
    api::routes(Arc::new(state))
}

/// 发送请求并解析 JSON 响应
pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// 创建会话并返回 id
pub async fn open_session(app: &Router) -> String {
    let (status, body) = send(app, "POST", "/api/v1/transfer-sessions", None).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["sessionId"].as_str().unwrap().to_string()
}

pub async fn fill_row(app: &Router, session: &str, index: usize, from: &str, to: &str, amount: &str) {
    let uri = format!("/api/v1/transfer-sessions/{session}/rows/{index}");
    for (field, value) in [("fromChain", from), ("toChain", to), ("amount", amount)] {
        let (status, body) = send(
            app,
            "PATCH",
            &uri,
            Some(serde_json::json!({ "field": field, "value": value })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }
}

/// 轮询直到批次离开 submitting
pub async fn wait_for_terminal(app: &Router, session: &str) -> Value {
    let uri = format!("/api/v1/transfer-sessions/{session}");
    for _ in 0..100 {
        let (_, body) = send(app, "GET", &uri, None).await;
        if body["data"]["state"]["status"] != "submitting" {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("batch never left submitting");
}
