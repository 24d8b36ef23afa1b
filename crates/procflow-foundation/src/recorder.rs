//! 执行历史记录器
//! Execution recorder
//!
//! 有界的只追加历史：新记录排在最前，每次写入裁剪到容量上限，
//! 不提供更新或删除
//! Bounded append-only history: newest first, trimmed to capacity on
//! every write, no update or delete operations

use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::RwLock;
use tracing::debug;

use procflow_kernel::process::ProcessExecution;
use procflow_kernel::store::{ExecutionHistory, StoreResult};

/// 默认保留的执行条数
/// Default number of executions retained
pub const DEFAULT_CAPACITY: usize = 50;

/// 有界内存执行历史
/// Bounded in-memory execution history
pub struct ExecutionRecorder {
    capacity: usize,
    entries: RwLock<VecDeque<ProcessExecution>>,
}

impl ExecutionRecorder {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            entries: RwLock::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// 追加一条执行记录
    /// Append one execution record
    pub async fn record(&self, execution: ProcessExecution) {
        let mut entries = self.entries.write().await;
        entries.push_front(execution);
        entries.truncate(self.capacity);
        debug!(retained = entries.len(), "execution recorded");
    }

    /// 最近的执行记录，从新到旧
    /// Most recent executions, newest first
    pub async fn recent(&self, limit: usize) -> Vec<ProcessExecution> {
        let entries = self.entries.read().await;
        entries.iter().take(limit).cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for ExecutionRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExecutionHistory for ExecutionRecorder {
    async fn record(&self, execution: ProcessExecution) -> StoreResult<()> {
        ExecutionRecorder::record(self, execution).await;
        Ok(())
    }

    async fn recent(&self, limit: usize) -> StoreResult<Vec<ProcessExecution>> {
        Ok(ExecutionRecorder::recent(self, limit).await)
    }
}
