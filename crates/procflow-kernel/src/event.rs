//! Execution event schema.
//!
//! Canonical, serializable events emitted by the orchestrator while a
//! process runs, for live progress display by collaborators. The stream
//! is an observable, not part of the correctness contract: senders drop
//! events when no observer is attached.

use serde::{Deserialize, Serialize};

use crate::process::{ExecutionStatus, StepExecutionResult};

/// Events emitted over the lifetime of one process execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ExecutionEvent {
    /// The run was created and is about to execute its first step.
    ExecutionStarted {
        execution_id: String,
        process_id: String,
    },

    /// A step entered the running state.
    StepStarted { step_id: String, step_label: String },

    /// A step reached a terminal status; carries the full result record.
    StepFinished {
        step_id: String,
        result: StepExecutionResult,
    },

    /// The run reached a terminal status.
    ExecutionFinished {
        execution_id: String,
        status: ExecutionStatus,
    },
}
