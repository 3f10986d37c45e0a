//! 批量转账状态机
//!
//! ```text
//! Idle -> Submitting          提交通过校验
//! Submitting -> Settled       执行方返回结果
//! Submitting -> Failed        执行方返回错误 / 传输失败
//! Settled | Failed -> Idle    重置或开始下一次提交
//! ```

use serde::{Deserialize, Serialize};

/// 单笔转账的结算结果，与提交顺序一一对应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettlementResult {
    pub transaction_hash: String,
    /// 上游字段名为 status
    #[serde(alias = "status")]
    pub succeeded: bool,
    pub block_number: u64,
}

/// 批次状态
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BatchState {
    #[default]
    Idle,
    Submitting,
    Settled { results: Vec<SettlementResult> },
    Failed { reason: String },
}

impl BatchState {
    pub fn status(&self) -> BatchStatus {
        match self {
            Self::Idle => BatchStatus::Idle,
            Self::Submitting => BatchStatus::Submitting,
            Self::Settled { .. } => BatchStatus::Settled,
            Self::Failed { .. } => BatchStatus::Failed,
        }
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self, Self::Submitting)
    }

    pub fn results(&self) -> Option<&[SettlementResult]> {
        match self {
            Self::Settled { results } => Some(results),
            _ => None,
        }
    }
}

/// 状态标签（不含负载），用于转换表和日志
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Idle,
    Submitting,
    Settled,
    Failed,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Submitting => "submitting",
            Self::Settled => "settled",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Settled | Self::Failed)
    }
}

/// 转换规则
pub struct BatchStateMachine;

impl BatchStateMachine {
    /// 验证状态转换是否合法
    pub fn can_transition(from: BatchStatus, to: BatchStatus) -> bool {
        use BatchStatus::*;

        matches!(
            (from, to),
            (Idle, Submitting)
                | (Submitting, Settled)
                | (Submitting, Failed)
                | (Settled, Idle)
                | (Failed, Idle)
                // 重置是幂等的
                | (Idle, Idle)
        )
    }

    /// 可以开始新一次提交的状态
    pub fn accepts_submit(current: BatchStatus) -> bool {
        current != BatchStatus::Submitting
    }
}
