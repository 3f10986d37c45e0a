//! 批量转账编排器
//!
//! 每个会话一个实例，独占自己的转账行和批次状态。
//! Submitting 期间行和状态都被锁定：重复提交、编辑、重置全部忽略，
//! 直到执行方返回。执行方调用是唯一的挂起点，锁不会跨 await 持有。

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    domain::{
        BatchState, BatchStateMachine, BatchStatus, ChainSet, SettlementResult, TransferField,
        TransferRequest, TransferRequestList,
    },
    error::TransferError,
    service::{
        batch_validation::validate_batch,
        chain_registry::{load_chain_set, ChainRegistry},
        transfer_executor::{TransferExecutor, ValidatedTransfer},
    },
};

/// 会话快照（行与状态取自同一时刻）
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub opened_at: DateTime<Utc>,
    pub rows: Vec<TransferRequest>,
    pub state: BatchState,
}

/// 一次已进入 Submitting 的提交
#[derive(Debug)]
pub struct SubmissionTicket {
    epoch: u64,
    transfers: Vec<ValidatedTransfer>,
}

impl SubmissionTicket {
    pub fn transfers(&self) -> &[ValidatedTransfer] {
        &self.transfers
    }
}

struct Session {
    rows: TransferRequestList,
    state: BatchState,
    /// 每次提交 / 重置 / 关闭递增，用于丢弃过期结果
    epoch: u64,
    closed: bool,
}

impl Session {
    fn transition(&mut self, to: BatchState) {
        let from = self.state.status();
        debug_assert!(
            BatchStateMachine::can_transition(from, to.status()),
            "illegal batch transition {:?} -> {:?}",
            from,
            to.status()
        );
        self.state = to;
    }

    fn is_locked(&self) -> bool {
        self.closed || self.state.is_submitting()
    }
}

pub struct BatchOrchestrator {
    id: Uuid,
    opened_at: DateTime<Utc>,
    chains: Arc<ChainSet>,
    executor: Arc<dyn TransferExecutor>,
    session: Mutex<Session>,
}

impl fmt::Debug for BatchOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let session = self.lock();
        f.debug_struct("BatchOrchestrator")
            .field("id", &self.id)
            .field("opened_at", &self.opened_at)
            .field("rows", &session.rows.len())
            .field("status", &session.state.status())
            .field("closed", &session.closed)
            .finish_non_exhaustive()
    }
}

impl BatchOrchestrator {
    pub fn new(chains: Arc<ChainSet>, executor: Arc<dyn TransferExecutor>) -> Self {
        Self {
            id: Uuid::new_v4(),
            opened_at: Utc::now(),
            chains,
            executor,
            session: Mutex::new(Session {
                rows: TransferRequestList::new(),
                state: BatchState::default(),
                epoch: 0,
                closed: false,
            }),
        }
    }

    /// 先加载链注册表再创建会话；注册表不可用时不允许编辑任何行
    pub async fn open(
        registry: &dyn ChainRegistry,
        executor: Arc<dyn TransferExecutor>,
    ) -> Result<Self, TransferError> {
        let chains = load_chain_set(registry).await?;
        Ok(Self::new(Arc::new(chains), executor))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn chains(&self) -> &ChainSet {
        &self.chains
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn rows(&self) -> Vec<TransferRequest> {
        self.lock().rows.rows().to_vec()
    }

    pub fn state(&self) -> BatchState {
        self.lock().state.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let session = self.lock();
        SessionSnapshot {
            session_id: self.id,
            opened_at: self.opened_at,
            rows: session.rows.rows().to_vec(),
            state: session.state.clone(),
        }
    }

    /// 追加空行；Submitting 期间忽略
    pub fn append_row(&self) -> bool {
        let mut session = self.lock();
        if session.is_locked() {
            tracing::debug!(session_id=%self.id, "append_row_ignored");
            return false;
        }
        session.rows.append();
        true
    }

    /// 删除行；只剩一行或 Submitting 期间返回 `Ok(false)`
    pub fn remove_row(&self, index: usize) -> Result<bool, TransferError> {
        let mut session = self.lock();
        if session.is_locked() {
            tracing::debug!(session_id=%self.id, index, "remove_row_ignored");
            return Ok(false);
        }
        session.rows.remove(index)
    }

    /// 修改一行的一个字段；不会清除已有的批次结果
    pub fn update_row(
        &self,
        index: usize,
        field: TransferField,
        value: &str,
    ) -> Result<bool, TransferError> {
        let mut session = self.lock();
        if session.is_locked() {
            tracing::debug!(
                session_id=%self.id,
                index,
                field=field.as_str(),
                "update_row_ignored"
            );
            return Ok(false);
        }
        session.rows.update(index, field, value)?;
        Ok(true)
    }

    /// 清空行并回到 Idle；Submitting 期间忽略
    pub fn reset_batch(&self) -> bool {
        let mut session = self.lock();
        if session.is_locked() {
            tracing::debug!(session_id=%self.id, "reset_batch_ignored");
            return false;
        }
        session.rows.reset();
        session.transition(BatchState::Idle);
        session.epoch += 1;
        true
    }

    /// 关闭会话，未返回的执行结果会被丢弃
    pub fn close(&self) {
        let mut session = self.lock();
        session.closed = true;
        session.epoch += 1;
        tracing::debug!(session_id=%self.id, "session_closed");
    }

    /// 校验闸门 + 进入 Submitting
    ///
    /// 已在 Submitting 时返回 `Ok(None)`；任意一行不合法时回到 Idle 并返回
    /// `ValidationGateFailed`，执行方不会被调用
    pub fn begin_submit(&self) -> Result<Option<SubmissionTicket>, TransferError> {
        let mut session = self.lock();
        if session.closed || !BatchStateMachine::accepts_submit(session.state.status()) {
            tracing::debug!(session_id=%self.id, "submit_ignored");
            return Ok(None);
        }

        // 上一次的结果 / 错误在新提交开始时清除
        session.transition(BatchState::Idle);

        let transfers = match validate_batch(session.rows.rows(), &self.chains) {
            Ok(transfers) => transfers,
            Err(e) => {
                tracing::info!(
                    session_id=%self.id,
                    invalid_rows=?e.invalid_rows(),
                    "batch_validation_failed"
                );
                return Err(e);
            }
        };

        session.transition(BatchState::Submitting);
        session.epoch += 1;
        tracing::info!(
            session_id=%self.id,
            rows = transfers.len(),
            epoch = session.epoch,
            "batch_submitting"
        );

        Ok(Some(SubmissionTicket {
            epoch: session.epoch,
            transfers,
        }))
    }

    /// 写回执行结果，返回结果是否被采用
    ///
    /// 会话已关闭、已重置或票据过期时丢弃结果
    pub fn finish_submit(
        &self,
        ticket: SubmissionTicket,
        outcome: Result<Vec<SettlementResult>, TransferError>,
    ) -> bool {
        let mut session = self.lock();
        if session.closed || session.epoch != ticket.epoch || !session.state.is_submitting() {
            tracing::info!(session_id=%self.id, epoch = ticket.epoch, "batch_result_abandoned");
            return false;
        }

        let next = match outcome {
            Ok(results) if results.len() == ticket.transfers.len() => {
                let failed = results.iter().filter(|r| !r.succeeded).count();
                tracing::info!(
                    session_id=%self.id,
                    transfers = results.len(),
                    failed,
                    "batch_settled"
                );
                BatchState::Settled { results }
            }
            Ok(results) => {
                let reason = format!(
                    "executor returned {} results for {} transfers",
                    results.len(),
                    ticket.transfers.len()
                );
                tracing::error!(session_id=%self.id, reason=%reason, "batch_result_mismatch");
                BatchState::Failed { reason }
            }
            Err(e) => {
                let reason = match e {
                    TransferError::ExecutorFailed(reason) => reason,
                    other => other.to_string(),
                };
                tracing::warn!(session_id=%self.id, reason=%reason, "batch_failed");
                BatchState::Failed { reason }
            }
        };

        session.transition(next);
        true
    }

    /// 提交整批并等待执行方返回
    ///
    /// 被忽略（已在 Submitting）或结果被丢弃时返回 `Ok(())`；
    /// 本次提交落入 Failed 时返回 `ExecutorFailed`
    pub async fn submit(&self) -> Result<(), TransferError> {
        let Some(ticket) = self.begin_submit()? else {
            return Ok(());
        };

        let outcome = self.executor.submit(ticket.transfers()).await;
        if self.finish_submit(ticket, outcome) {
            if let BatchState::Failed { reason } = self.state() {
                return Err(TransferError::ExecutorFailed(reason));
            }
        }
        Ok(())
    }

    /// 在后台任务中等待执行方，立即返回是否已进入 Submitting
    ///
    /// 后台任务只持有弱引用：会话被销毁后结果直接丢弃
    pub fn spawn_submit(self: &Arc<Self>) -> Result<bool, TransferError> {
        let Some(ticket) = self.begin_submit()? else {
            return Ok(false);
        };

        let executor = self.executor.clone();
        let weak: Weak<Self> = Arc::downgrade(self);
        let session_id = self.id;
        tokio::spawn(async move {
            let outcome = executor.submit(ticket.transfers()).await;
            match weak.upgrade() {
                Some(orchestrator) => {
                    orchestrator.finish_submit(ticket, outcome);
                }
                None => {
                    tracing::info!(session_id=%session_id, "batch_result_dropped_after_teardown");
                }
            }
        });
        Ok(true)
    }

    pub fn status(&self) -> BatchStatus {
        self.lock().state.status()
    }
}
