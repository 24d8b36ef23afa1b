// llm module
pub mod llm;

// steps module - step executor registry
pub mod steps;

// orchestrator module
pub mod orchestrator;

// recorder module - bounded execution history
pub mod recorder;

// store module - in-memory definition store
pub mod store;

// Re-export orchestration types
pub use orchestrator::ProcessOrchestrator;
pub use recorder::{DEFAULT_CAPACITY, ExecutionRecorder};
pub use steps::{StepError, StepServices, execute_step};
pub use store::MemoryDefinitionStore;

// Re-export the kernel for downstream convenience
pub use procflow_kernel as kernel;
