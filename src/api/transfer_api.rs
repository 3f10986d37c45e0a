// 批量转账会话 API
// POST   /api/v1/transfer-sessions
// GET    /api/v1/transfer-sessions/:id
// DELETE /api/v1/transfer-sessions/:id
// POST   /api/v1/transfer-sessions/:id/rows
// PATCH  /api/v1/transfer-sessions/:id/rows/:index
// DELETE /api/v1/transfer-sessions/:id/rows/:index
// POST   /api/v1/transfer-sessions/:id/submit
// POST   /api/v1/transfer-sessions/:id/reset

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    api::response::{success_response, success_with_status, ApiResponse},
    app_state::AppState,
    domain::TransferField,
    error::AppError,
    service::{BatchOrchestrator, SessionSnapshot},
};

/// 修改一行
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateRowReq {
    pub field: TransferField,
    #[serde(default)]
    pub value: String,
}

/// 行编辑 / 重置 / 提交的结果
///
/// applied=false 表示操作被忽略（Submitting 期间，或删除最后一行）
#[derive(Debug, Serialize)]
pub struct MutationResp {
    pub applied: bool,
    #[serde(flatten)]
    pub snapshot: SessionSnapshot,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClosedResp {
    pub session_id: Uuid,
    pub closed: bool,
}

fn mutation(applied: bool, orchestrator: &BatchOrchestrator) -> MutationResp {
    MutationResp {
        applied,
        snapshot: orchestrator.snapshot(),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/transfer-sessions",
    responses(
        (status = 201, description = "Session created with one empty row"),
        (status = 429, description = "Too many open sessions"),
        (status = 503, description = "Chain registry unavailable")
    ),
    tag = "Multi Transfer"
)]
pub async fn create_session(
    State(st): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<ApiResponse<SessionSnapshot>>), AppError> {
    let chains = st.chain_set()?;
    let orchestrator = st
        .sessions
        .insert(BatchOrchestrator::new(chains, st.executor.clone()))
        .await?;
    success_with_status(StatusCode::CREATED, orchestrator.snapshot())
}

#[utoipa::path(
    get,
    path = "/api/v1/transfer-sessions/{id}",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Rows and batch state"),
        (status = 404, description = "Unknown session")
    ),
    tag = "Multi Transfer"
)]
pub async fn get_session(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<SessionSnapshot>>, AppError> {
    let orchestrator = st.sessions.get(id).await?;
    success_response(orchestrator.snapshot())
}

#[utoipa::path(
    delete,
    path = "/api/v1/transfer-sessions/{id}",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session closed, pending result abandoned"),
        (status = 404, description = "Unknown session")
    ),
    tag = "Multi Transfer"
)]
pub async fn delete_session(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<SessionClosedResp>>, AppError> {
    st.sessions.remove(id).await?;
    success_response(SessionClosedResp {
        session_id: id,
        closed: true,
    })
}

#[utoipa::path(
    post,
    path = "/api/v1/transfer-sessions/{id}/rows",
    params(("id" = Uuid, Path, description = "Session id")),
    responses((status = 200, description = "Empty row appended")),
    tag = "Multi Transfer"
)]
pub async fn append_row(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MutationResp>>, AppError> {
    let orchestrator = st.sessions.get(id).await?;
    let applied = orchestrator.append_row();
    success_response(mutation(applied, &orchestrator))
}

#[utoipa::path(
    delete,
    path = "/api/v1/transfer-sessions/{id}/rows/{index}",
    params(
        ("id" = Uuid, Path, description = "Session id"),
        ("index" = usize, Path, description = "Zero-based row index")
    ),
    responses(
        (status = 200, description = "Row removed (applied=false when it is the last row)"),
        (status = 400, description = "Index out of range")
    ),
    tag = "Multi Transfer"
)]
pub async fn remove_row(
    State(st): State<Arc<AppState>>,
    Path((id, index)): Path<(Uuid, usize)>,
) -> Result<Json<ApiResponse<MutationResp>>, AppError> {
    let orchestrator = st.sessions.get(id).await?;
    let applied = orchestrator.remove_row(index)?;
    success_response(mutation(applied, &orchestrator))
}

#[utoipa::path(
    patch,
    path = "/api/v1/transfer-sessions/{id}/rows/{index}",
    params(
        ("id" = Uuid, Path, description = "Session id"),
        ("index" = usize, Path, description = "Zero-based row index")
    ),
    request_body = UpdateRowReq,
    responses(
        (status = 200, description = "Field updated"),
        (status = 400, description = "Index out of range")
    ),
    tag = "Multi Transfer"
)]
pub async fn update_row(
    State(st): State<Arc<AppState>>,
    Path((id, index)): Path<(Uuid, usize)>,
    Json(req): Json<UpdateRowReq>,
) -> Result<Json<ApiResponse<MutationResp>>, AppError> {
    let orchestrator = st.sessions.get(id).await?;
    let applied = orchestrator.update_row(index, req.field, &req.value)?;
    success_response(mutation(applied, &orchestrator))
}

/// 校验通过后立即返回 202，执行方在后台任务中完成；
/// 通过 GET 会话轮询最终状态
#[utoipa::path(
    post,
    path = "/api/v1/transfer-sessions/{id}/submit",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 202, description = "Batch accepted, state is submitting"),
        (status = 200, description = "Ignored, a submission is already in flight"),
        (status = 400, description = "Please fill in all fields with valid values")
    ),
    tag = "Multi Transfer"
)]
pub async fn submit(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<ApiResponse<MutationResp>>), AppError> {
    let orchestrator = st.sessions.get(id).await?;
    let accepted = orchestrator.spawn_submit()?;
    let status = if accepted {
        StatusCode::ACCEPTED
    } else {
        StatusCode::OK
    };
    success_with_status(status, mutation(accepted, &orchestrator))
}

#[utoipa::path(
    post,
    path = "/api/v1/transfer-sessions/{id}/reset",
    params(("id" = Uuid, Path, description = "Session id")),
    responses((status = 200, description = "Rows cleared, state idle")),
    tag = "Multi Transfer"
)]
pub async fn reset(
    State(st): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MutationResp>>, AppError> {
    let orchestrator = st.sessions.get(id).await?;
    let applied = orchestrator.reset_batch();
    success_response(mutation(applied, &orchestrator))
}
