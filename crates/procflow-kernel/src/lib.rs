// process graph model
pub mod process;
pub use process::*;

// fluent process construction
pub mod builder;
pub use builder::ProcessBuilder;

// topological scheduling
pub mod schedule;
pub use schedule::execution_order;

// execution event schema
pub mod event;
pub use event::ExecutionEvent;

// storage contracts
pub mod store;
pub use store::{
    DefinitionStore, DynDefinitionStore, DynExecutionHistory, ExecutionHistory, StoreError,
    StoreResult,
};

// error module
pub mod error;
pub use error::{ProcessError, ProcessResult};
