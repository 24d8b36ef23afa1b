//! Storage contracts.
//!
//! Interfaces the executor core expects its persistence collaborators to
//! implement. The definition store produces process definitions for the
//! orchestrator to consume; the execution history consumes completed
//! executions for later inspection. The backing technology is a
//! collaborator concern; `procflow-foundation` ships in-memory
//! implementations of both.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::process::{Process, ProcessExecution};

/// Errors raised by storage backends.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// No record exists under the requested id.
    #[error("record not found: {0}")]
    NotFound(String),

    /// A record already exists under the id being created.
    #[error("record already exists: {0}")]
    Conflict(String),

    /// The record could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Backend-specific failure.
    #[error("store error: {0}")]
    Other(String),
}

/// Convenience result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Create/load/save operations for process definitions.
///
/// Definitions are created on first user save and mutated on every
/// edit; there is no delete operation in this contract, processes are
/// never physically removed by this core.
#[async_trait]
pub trait DefinitionStore: Send + Sync {
    /// Persist a brand-new definition. Fails with [`StoreError::Conflict`]
    /// when the id is already taken.
    async fn create(&self, process: Process) -> StoreResult<Process>;

    /// Load a definition by id.
    async fn load(&self, process_id: &str) -> StoreResult<Process>;

    /// Persist an edited definition (upsert). Implementations stamp
    /// `updated_at` on every save.
    async fn save(&self, process: Process) -> StoreResult<Process>;

    /// All known definitions.
    async fn list(&self) -> StoreResult<Vec<Process>>;
}

/// Append-only, bounded execution history.
///
/// Write-once: no update or delete operations exist. Implementations
/// trim to their capacity on every write; unbounded growth is
/// disallowed.
#[async_trait]
pub trait ExecutionHistory: Send + Sync {
    /// Append a completed execution.
    async fn record(&self, execution: ProcessExecution) -> StoreResult<()>;

    /// The most recent executions, newest first.
    async fn recent(&self, limit: usize) -> StoreResult<Vec<ProcessExecution>>;
}

/// Dynamic dispatch store types.
pub type DynDefinitionStore = Arc<dyn DefinitionStore>;
pub type DynExecutionHistory = Arc<dyn ExecutionHistory>;
