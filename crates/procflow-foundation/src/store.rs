//! 内存流程定义存储
//! In-memory process definition store
//!
//! 实现内核的 DefinitionStore 契约；真实部署里由持久化协作方替换
//! Implements the kernel's DefinitionStore contract; a persistence
//! collaborator replaces it in real deployments

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use procflow_kernel::process::Process;
use procflow_kernel::store::{DefinitionStore, StoreError, StoreResult};

/// 内存定义存储
/// In-memory definition store
///
/// 定义永不物理删除；save 为 upsert 并刷新 updated_at
/// Definitions are never physically deleted; save upserts and bumps
/// updated_at
#[derive(Default)]
pub struct MemoryDefinitionStore {
    processes: RwLock<HashMap<String, Process>>,
}

impl MemoryDefinitionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.processes.read().await.len()
    }
}

#[async_trait]
impl DefinitionStore for MemoryDefinitionStore {
    async fn create(&self, process: Process) -> StoreResult<Process> {
        let mut processes = self.processes.write().await;
        if processes.contains_key(&process.id) {
            return Err(StoreError::Conflict(process.id));
        }
        debug!(process_id = %process.id, "process created");
        processes.insert(process.id.clone(), process.clone());
        Ok(process)
    }

    async fn load(&self, process_id: &str) -> StoreResult<Process> {
        let processes = self.processes.read().await;
        processes
            .get(process_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(process_id.to_string()))
    }

    async fn save(&self, mut process: Process) -> StoreResult<Process> {
        process.touch();
        let mut processes = self.processes.write().await;
        debug!(process_id = %process.id, version = process.version, "process saved");
        processes.insert(process.id.clone(), process.clone());
        Ok(process)
    }

    async fn list(&self) -> StoreResult<Vec<Process>> {
        let processes = self.processes.read().await;
        let mut all: Vec<Process> = processes.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(all)
    }
}
