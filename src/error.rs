use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::domain::ValidationOutcome;

/// 批量转账核心错误
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransferError {
    /// 任意一行校验失败，整批不提交
    #[error("Please fill in all fields with valid values")]
    ValidationGateFailed { outcomes: Vec<ValidationOutcome> },

    /// 执行方返回错误或传输失败，原样展示给用户
    #[error("{0}")]
    ExecutorFailed(String),

    /// 调用方传入了不存在的行号
    #[error("row index {index} out of range (rows: {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// 链注册表加载失败，无法校验任何转账
    #[error("chain registry unavailable: {0}")]
    RegistryUnavailable(String),
}

impl TransferError {
    /// 校验失败的行号及其结果
    pub fn invalid_rows(&self) -> Vec<(usize, ValidationOutcome)> {
        match self {
            Self::ValidationGateFailed { outcomes } => outcomes
                .iter()
                .copied()
                .enumerate()
                .filter(|(_, o)| !o.is_valid())
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// 会话存储错误
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("transfer session {0} not found")]
    NotFound(uuid::Uuid),

    #[error("too many open transfer sessions (max {max})")]
    LimitReached { max: usize },
}

#[derive(Debug, Clone)]
pub enum AppErrorCode {
    NotFound,
    ChainNotSupported,
    InvalidParameter,
    ValidationFailed,
    ServiceUnavailable,
    ExternalServiceError,
    RateLimitExceeded,
}

impl AppErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppErrorCode::NotFound => "not_found",
            AppErrorCode::ChainNotSupported => "chain_not_supported",
            AppErrorCode::InvalidParameter => "invalid_parameter",
            AppErrorCode::ValidationFailed => "validation_failed",
            AppErrorCode::ServiceUnavailable => "service_unavailable",
            AppErrorCode::ExternalServiceError => "external_service_error",
            AppErrorCode::RateLimitExceeded => "rate_limit_exceeded",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppError {
    pub code: AppErrorCode,
    pub message: String,
    pub status: StatusCode,
    pub details: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code.as_str(),
            message: &self.message,
            details: self.details.as_ref(),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    fn new(code: AppErrorCode, status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            code,
            message: msg.into(),
            status,
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::NotFound, StatusCode::NOT_FOUND, msg)
    }

    pub fn chain_not_supported(msg: impl Into<String>) -> Self {
        Self::new(
            AppErrorCode::ChainNotSupported,
            StatusCode::BAD_REQUEST,
            msg,
        )
    }

    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::InvalidParameter, StatusCode::BAD_REQUEST, msg)
    }

    pub fn validation_failed(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::ValidationFailed, StatusCode::BAD_REQUEST, msg)
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::new(
            AppErrorCode::ServiceUnavailable,
            StatusCode::SERVICE_UNAVAILABLE,
            msg,
        )
    }

    pub fn external_service_error(msg: impl Into<String>) -> Self {
        Self::new(
            AppErrorCode::ExternalServiceError,
            StatusCode::BAD_GATEWAY,
            msg,
        )
    }

    pub fn rate_limit_exceeded(msg: impl Into<String>) -> Self {
        Self::new(
            AppErrorCode::RateLimitExceeded,
            StatusCode::TOO_MANY_REQUESTS,
            msg,
        )
    }
}

impl From<TransferError> for AppError {
    fn from(err: TransferError) -> Self {
        match &err {
            TransferError::ValidationGateFailed { .. } => {
                let rows: Vec<_> = err
                    .invalid_rows()
                    .into_iter()
                    .map(|(index, outcome)| serde_json::json!({ "index": index, "result": outcome }))
                    .collect();
                Self::validation_failed(err.to_string())
                    .with_details(serde_json::json!({ "invalidRows": rows }))
            }
            TransferError::ExecutorFailed(reason) => Self::external_service_error(reason.clone()),
            TransferError::IndexOutOfRange { .. } => Self::invalid_parameter(err.to_string()),
            TransferError::RegistryUnavailable(_) => Self::service_unavailable(err.to_string()),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound(_) => Self::not_found(err.to_string()),
            SessionError::LimitReached { .. } => Self::rate_limit_exceeded(err.to_string()),
        }
    }
}
