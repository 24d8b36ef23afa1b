//! Crate-level error types for `procflow-kernel`.
//!
//! Graph validation failures are surfaced to the caller of `run()`
//! immediately and never dropped; cyclic ordering is deliberately NOT an
//! error (see [`crate::schedule`]).

use thiserror::Error;

/// Errors raised by the process model and its validation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProcessError {
    /// The process defines no steps at all.
    #[error("process has no steps")]
    EmptyProcess,

    /// A connection references a step id absent from the process.
    #[error("connection '{connection}' references unknown step '{step}'")]
    DanglingConnection { connection: String, step: String },

    /// A step id was looked up that the process does not contain.
    #[error("unknown step '{0}'")]
    UnknownStep(String),

    /// A JSON (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience result alias for kernel operations.
pub type ProcessResult<T> = Result<T, ProcessError>;
