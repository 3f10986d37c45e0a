//! 转账会话存储
//!
//! 每个浏览器会话对应一个编排器；删除会话时关闭编排器，未返回的执行结果被丢弃。
//! 空闲超过 TTL 的会话在插入新会话前或后台清扫时回收，Submitting 中的会话保留。

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError, Weak},
    time::{Duration, Instant},
};

use tokio::{sync::RwLock, task::JoinHandle};
use uuid::Uuid;

use crate::{error::SessionError, service::batch_orchestrator::BatchOrchestrator};

struct SessionEntry {
    orchestrator: Arc<BatchOrchestrator>,
    last_seen: Mutex<Instant>,
}

impl SessionEntry {
    fn touch(&self) {
        *self.last_seen.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        self.last_seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed()
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        !self.orchestrator.state().is_submitting() && self.idle_for() >= ttl
    }
}

pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
    max_sessions: usize,
    idle_ttl: Duration,
}

impl SessionStore {
    pub fn new(max_sessions: usize, idle_ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions,
            idle_ttl,
        }
    }

    pub async fn insert(
        &self,
        orchestrator: BatchOrchestrator,
    ) -> Result<Arc<BatchOrchestrator>, SessionError> {
        let mut sessions = self.sessions.write().await;
        Self::evict_expired(&mut sessions, self.idle_ttl);
        if sessions.len() >= self.max_sessions {
            tracing::warn!(max = self.max_sessions, "transfer_session_limit_reached");
            return Err(SessionError::LimitReached {
                max: self.max_sessions,
            });
        }

        let orchestrator = Arc::new(orchestrator);
        sessions.insert(
            orchestrator.id(),
            SessionEntry {
                orchestrator: orchestrator.clone(),
                last_seen: Mutex::new(Instant::now()),
            },
        );
        tracing::info!(
            session_id=%orchestrator.id(),
            open_sessions = sessions.len(),
            "transfer_session_opened"
        );
        Ok(orchestrator)
    }

    /// 取会话并刷新活跃时间
    pub async fn get(&self, id: Uuid) -> Result<Arc<BatchOrchestrator>, SessionError> {
        let sessions = self.sessions.read().await;
        let entry = sessions.get(&id).ok_or(SessionError::NotFound(id))?;
        entry.touch();
        Ok(entry.orchestrator.clone())
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), SessionError> {
        let entry = self
            .sessions
            .write()
            .await
            .remove(&id)
            .ok_or(SessionError::NotFound(id))?;
        entry.orchestrator.close();
        tracing::info!(session_id=%id, "transfer_session_closed");
        Ok(())
    }

    /// 回收空闲会话，返回回收数量
    pub async fn purge_idle(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        Self::evict_expired(&mut sessions, self.idle_ttl)
    }

    fn evict_expired(sessions: &mut HashMap<Uuid, SessionEntry>, ttl: Duration) -> usize {
        let expired: Vec<Uuid> = sessions
            .iter()
            .filter(|(_, entry)| entry.is_expired(ttl))
            .map(|(id, _)| *id)
            .collect();

        for id in &expired {
            if let Some(entry) = sessions.remove(id) {
                entry.orchestrator.close();
                tracing::info!(session_id=%id, "transfer_session_evicted");
            }
        }
        expired.len()
    }

    /// 后台定时清扫；存储被释放后任务自行退出
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let store: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(store) = store.upgrade() else {
                    break;
                };
                let evicted = store.purge_idle().await;
                if evicted > 0 {
                    tracing::debug!(evicted, "transfer_session_sweep");
                }
            }
        })
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
