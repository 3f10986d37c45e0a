//! 批量转账会话 API 集成测试
//!
//! 通过 tower::ServiceExt::oneshot 直接驱动路由，不需要监听端口

mod common;

use std::{sync::Arc, time::Duration};

use axum::http::StatusCode;
use chainboard::{error::TransferError, service::SimulatedChainQuery};
use common::*;
use serde_json::json;

#[tokio::test]
async fn test_create_session_has_one_empty_row() {
    let app = test_app(FakeExecutor::returning(Ok(vec![])));
    let (status, body) = send(&app, "POST", "/api/v1/transfer-sessions", None).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["code"], 0);
    assert_eq!(body["message"], "success");
    assert_eq!(body["data"]["state"], json!({ "status": "idle" }));
    assert_eq!(
        body["data"]["rows"],
        json!([{ "fromChain": null, "toChain": null, "amount": "" }])
    );
}

#[tokio::test]
async fn test_single_transfer_settles_end_to_end() {
    let executor = FakeExecutor::returning(Ok(vec![settlement("0xabc", true, 100)]));
    let app = test_app(executor.clone());
    let session = open_session(&app).await;
    fill_row(&app, &session, 0, "ETH", "POLYGON", "0.5").await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/transfer-sessions/{session}/submit"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED, "{body}");
    assert_eq!(body["data"]["applied"], true);

    let body = wait_for_terminal(&app, &session).await;
    assert_eq!(
        body["data"]["state"],
        json!({
            "status": "settled",
            "results": [{ "transactionHash": "0xabc", "succeeded": true, "blockNumber": 100 }]
        })
    );

    let batches = executor.batches.lock().unwrap().clone();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0][0].from_chain.as_str(), "ETH");
    assert_eq!(batches[0][0].to_chain.as_str(), "POLYGON");
    assert_eq!(batches[0][0].amount, "0.5");
}

#[tokio::test]
async fn test_missing_chain_is_rejected_before_executor() {
    let executor = FakeExecutor::returning(Ok(vec![]));
    let app = test_app(executor.clone());
    let session = open_session(&app).await;
    fill_row(&app, &session, 0, "", "POLYGON", "1").await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/transfer-sessions/{session}/submit"),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_failed");
    assert_eq!(body["message"], "Please fill in all fields with valid values");
    assert_eq!(
        body["details"]["invalidRows"],
        json!([{ "index": 0, "result": { "outcome": "invalidChainSelection", "side": "from" } }])
    );
    assert_eq!(executor.call_count(), 0);

    let (_, body) = send(
        &app,
        "GET",
        &format!("/api/v1/transfer-sessions/{session}"),
        None,
    )
    .await;
    assert_eq!(body["data"]["state"]["status"], "idle");
}

#[tokio::test]
async fn test_executor_error_becomes_failed_state() {
    let executor =
        FakeExecutor::returning(Err(TransferError::ExecutorFailed("network down".into())));
    let app = test_app(executor);
    let session = open_session(&app).await;
    fill_row(&app, &session, 0, "ETH", "BNB", "2").await;

    send(
        &app,
        "POST",
        &format!("/api/v1/transfer-sessions/{session}/submit"),
        None,
    )
    .await;
    let body = wait_for_terminal(&app, &session).await;
    assert_eq!(
        body["data"]["state"],
        json!({ "status": "failed", "reason": "network down" })
    );
}

#[tokio::test]
async fn test_submitting_session_ignores_edits_and_resubmit() {
    let executor = FakeExecutor::gated(Ok(vec![settlement("0x01", true, 7)]));
    let app = test_app(executor.clone());
    let session = open_session(&app).await;
    fill_row(&app, &session, 0, "ETH", "POLYGON", "1").await;

    let submit_uri = format!("/api/v1/transfer-sessions/{session}/submit");
    let (status, _) = send(&app, "POST", &submit_uri, None).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (status, body) = send(&app, "POST", &submit_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["applied"], false);
    assert_eq!(body["data"]["state"]["status"], "submitting");

    let (_, body) = send(
        &app,
        "POST",
        &format!("/api/v1/transfer-sessions/{session}/rows"),
        None,
    )
    .await;
    assert_eq!(body["data"]["applied"], false);
    assert_eq!(body["data"]["rows"].as_array().unwrap().len(), 1);

    let (_, body) = send(
        &app,
        "POST",
        &format!("/api/v1/transfer-sessions/{session}/reset"),
        None,
    )
    .await;
    assert_eq!(body["data"]["applied"], false);

    // 后台任务可能还没跑到执行方
    for _ in 0..100 {
        if executor.call_count() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    executor.release();
    let body = wait_for_terminal(&app, &session).await;
    assert_eq!(body["data"]["state"]["status"], "settled");
    assert_eq!(executor.call_count(), 1);
}

#[tokio::test]
async fn test_row_editing() {
    let app = test_app(FakeExecutor::returning(Ok(vec![])));
    let session = open_session(&app).await;
    let rows_uri = format!("/api/v1/transfer-sessions/{session}/rows");

    // 只有一行时删除是空操作
    let (status, body) = send(&app, "DELETE", &format!("{rows_uri}/0"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["applied"], false);
    assert_eq!(body["data"]["rows"].as_array().unwrap().len(), 1);

    send(&app, "POST", &rows_uri, None).await;
    let (_, body) = send(&app, "POST", &rows_uri, None).await;
    assert_eq!(body["data"]["rows"].as_array().unwrap().len(), 3);

    fill_row(&app, &session, 2, "BNB", "ETH", "3").await;
    let (_, body) = send(&app, "DELETE", &format!("{rows_uri}/0"), None).await;
    assert_eq!(body["data"]["applied"], true);
    let rows = body["data"]["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1]["fromChain"], "BNB");

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("{rows_uri}/9"),
        Some(json!({ "field": "amount", "value": "1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_parameter");

    let (status, _) = send(&app, "DELETE", &format!("{rows_uri}/9"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reset_after_settle() {
    let executor = FakeExecutor::returning(Ok(vec![settlement("0xabc", true, 100)]));
    let app = test_app(executor);
    let session = open_session(&app).await;
    fill_row(&app, &session, 0, "ETH", "POLYGON", "0.5").await;
    send(
        &app,
        "POST",
        &format!("/api/v1/transfer-sessions/{session}/submit"),
        None,
    )
    .await;
    wait_for_terminal(&app, &session).await;

    let (_, body) = send(
        &app,
        "POST",
        &format!("/api/v1/transfer-sessions/{session}/reset"),
        None,
    )
    .await;
    assert_eq!(body["data"]["applied"], true);
    assert_eq!(body["data"]["state"]["status"], "idle");
    assert_eq!(
        body["data"]["rows"],
        json!([{ "fromChain": null, "toChain": null, "amount": "" }])
    );
}

#[tokio::test]
async fn test_delete_session() {
    let app = test_app(FakeExecutor::returning(Ok(vec![])));
    let session = open_session(&app).await;
    let uri = format!("/api/v1/transfer-sessions/{session}");

    let (status, body) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["closed"], true);

    let (status, body) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn test_session_limit() {
    let app = test_app_with(
        Ok(Arc::new(chainboard::domain::ChainSet::from_ids(["ETH"]))),
        FakeExecutor::returning(Ok(vec![])),
        Arc::new(SimulatedChainQuery::new(Duration::ZERO)),
        1,
    );
    open_session(&app).await;
    let (status, body) = send(&app, "POST", "/api/v1/transfer-sessions", None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], "rate_limit_exceeded");
}

#[tokio::test]
async fn test_abandoned_sessions_do_not_exhaust_limit() {
    let mut config = (*test_config(1)).clone();
    config.sessions.idle_ttl_secs = 1;
    let state = chainboard::app_state::AppState::with_parts(
        Arc::new(config),
        Ok(Arc::new(chainboard::domain::ChainSet::from_ids(["ETH"]))),
        FakeExecutor::returning(Ok(vec![])),
        Arc::new(SimulatedChainQuery::new(Duration::ZERO)),
    );
    let app = chainboard::api::routes(Arc::new(state));

    let abandoned = open_session(&app).await;
    let (status, _) = send(&app, "POST", "/api/v1/transfer-sessions", None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    tokio::time::sleep(Duration::from_millis(1100)).await;

    let (status, _) = send(&app, "POST", "/api/v1/transfer-sessions", None).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/v1/transfer-sessions/{abandoned}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_registry_unavailable_refuses_sessions() {
    let app = test_app_with(
        Err(TransferError::RegistryUnavailable("connection refused".into())),
        FakeExecutor::returning(Ok(vec![])),
        Arc::new(SimulatedChainQuery::new(Duration::ZERO)),
        4,
    );

    let (status, body) = send(&app, "POST", "/api/v1/transfer-sessions", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "service_unavailable");
    assert_eq!(
        body["message"],
        "chain registry unavailable: connection refused"
    );

    let (status, body) = send(&app, "GET", "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "degraded");
}

#[tokio::test]
async fn test_unknown_session_id() {
    let app = test_app(FakeExecutor::returning(Ok(vec![])));
    let (status, _) = send(
        &app,
        "GET",
        "/api/v1/transfer-sessions/00000000-0000-0000-0000-000000000000",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
