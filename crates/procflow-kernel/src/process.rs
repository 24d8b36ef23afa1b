//! Process graph model.
//!
//! Plain data structures for a process definition (typed steps, directed
//! connections, the versioned process envelope) and for the per-run
//! execution records. These types carry no behavior beyond validation;
//! scheduling lives in [`crate::schedule`] and execution in
//! `procflow-foundation`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use crate::error::ProcessError;

/// Shared execution context type: a flat key/value map accumulating one
/// entry per successfully executed step.
///
/// The namespace is flat on purpose. Two steps that choose the same
/// output variable overwrite each other silently; see the open questions
/// in DESIGN.md.
pub type Context = serde_json::Map<String, Value>;

// ---------------------------------------------------------------------------
// Step kinds and per-kind configuration
// ---------------------------------------------------------------------------

/// Error policy a step may declare for its own failures.
///
/// `Retry` is accepted as a configuration value but no retry loop is
/// executed; it currently behaves like `Skip`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnError {
    Retry,
    #[default]
    Skip,
    Fail,
}

/// Tabular data source payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSourceConfig {
    /// Display name of the source.
    pub name: String,
    #[serde(default)]
    pub columns: Vec<String>,
    /// Rows loaded at authoring time. When empty a small canned sample
    /// is served instead.
    #[serde(default)]
    pub rows: Vec<Value>,
}

/// Reference to a domain object whose snapshot the step materializes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BusinessObjectConfig {
    pub object_id: String,
    pub name: String,
    #[serde(default)]
    pub classification: String,
    #[serde(default)]
    pub fields: serde_json::Map<String, Value>,
}

/// Operation applied by a transform step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformOperation {
    Map,
    Filter,
    Aggregate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformConfig {
    pub operation: TransformOperation,
    /// Field projected by `map` or matched by `filter`.
    #[serde(default)]
    pub field: Option<String>,
    /// Comparison value for `filter`.
    #[serde(default)]
    pub value: Option<Value>,
}

/// Comparison operator of a conditional step.
///
/// The ordering operators coerce both sides to numbers before comparing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOperator {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "contains")]
    Contains,
}

impl CompareOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOperator::Eq => "==",
            CompareOperator::Ne => "!=",
            CompareOperator::Gt => ">",
            CompareOperator::Lt => "<",
            CompareOperator::Contains => "contains",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionalConfig {
    /// Context key resolved as the left-hand side.
    pub variable: String,
    pub operator: CompareOperator,
    pub value: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmPromptConfig {
    /// Prompt template; every context key is substituted for its
    /// `{{key}}` placeholder before the request is issued.
    pub prompt: String,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub on_error: OnError,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MathConfig {
    /// Arithmetic formula over context variable names, e.g. `"a + b * 2"`.
    pub formula: String,
    /// Decimal places the result is rounded to.
    #[serde(default = "default_precision")]
    pub precision: u32,
}

fn default_precision() -> u32 {
    2
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateMarkerConfig {
    /// State name this marker records, e.g. `"approved"`.
    pub state: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Join strategy a branching step records.
///
/// Recorded intent only; the orchestrator never fans out execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchStrategy {
    #[default]
    Parallel,
    Race,
    Sequential,
    Priority,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BranchingConfig {
    #[serde(default)]
    pub strategy: BranchStrategy,
    #[serde(default = "default_branch_count")]
    pub branch_count: u32,
}

fn default_branch_count() -> u32 {
    2
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InferenceConfig {
    pub model: String,
    /// Model family, `"classification"` or `"regression"`.
    #[serde(default)]
    pub kind: String,
}

/// Closed set of step kinds, tagged by `kind` with the kind-specific
/// payload under `config`.
///
/// A step's config shape is fully determined by its kind and never
/// shared across kinds. The executor registry in `procflow-foundation`
/// matches this enum exhaustively, so adding a variant is a compile
/// error until every dispatch site handles it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "config", rename_all = "snake_case")]
pub enum StepKind {
    DataSource(DataSourceConfig),
    BusinessObject(BusinessObjectConfig),
    Transform(TransformConfig),
    Conditional(ConditionalConfig),
    LlmPrompt(LlmPromptConfig),
    Math(MathConfig),
    StateMarker(StateMarkerConfig),
    Branching(BranchingConfig),
    Inference(InferenceConfig),
}

impl StepKind {
    /// The wire discriminator for this kind.
    pub fn name(&self) -> &'static str {
        match self {
            StepKind::DataSource(_) => "data_source",
            StepKind::BusinessObject(_) => "business_object",
            StepKind::Transform(_) => "transform",
            StepKind::Conditional(_) => "conditional",
            StepKind::LlmPrompt(_) => "llm_prompt",
            StepKind::Math(_) => "math",
            StepKind::StateMarker(_) => "state_marker",
            StepKind::Branching(_) => "branching",
            StepKind::Inference(_) => "inference",
        }
    }

    /// The error policy this kind declares, if any.
    ///
    /// Only the language-model prompt kind currently exposes one.
    pub fn on_error(&self) -> Option<OnError> {
        match self {
            StepKind::LlmPrompt(cfg) => Some(cfg.on_error),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Steps, connections, processes
// ---------------------------------------------------------------------------

/// Canvas layout hint. Carries no runtime meaning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// One configured unit of work in a process graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: StepKind,
    #[serde(default)]
    pub position: Position,
    /// Advisory list of upstream variable names this step reads.
    #[serde(default)]
    pub input_variables: Vec<String>,
    /// Context key the step's output is stored under. Uniqueness is
    /// advisory and not enforced; absent, the step id is used.
    #[serde(default)]
    pub output_variable: Option<String>,
}

impl Step {
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: StepKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
            position: Position::default(),
            input_variables: Vec::new(),
            output_variable: None,
        }
    }

    pub fn with_output_variable(mut self, name: impl Into<String>) -> Self {
        self.output_variable = Some(name.into());
        self
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = Position { x, y };
        self
    }

    pub fn with_input_variable(mut self, name: impl Into<String>) -> Self {
        self.input_variables.push(name.into());
        self
    }

    /// The context key this step writes its output under.
    pub fn output_key(&self) -> &str {
        self.output_variable.as_deref().unwrap_or(&self.id)
    }
}

/// A directed dependency link between two steps.
///
/// Handles disambiguate multiple outputs of a branching-style step for
/// display purposes only; the scheduler ignores them entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub source_handle: Option<String>,
    #[serde(default)]
    pub target_handle: Option<String>,
}

impl Connection {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
        }
    }

    pub fn with_source_handle(mut self, handle: impl Into<String>) -> Self {
        self.source_handle = Some(handle.into());
        self
    }

    pub fn with_target_handle(mut self, handle: impl Into<String>) -> Self {
        self.target_handle = Some(handle.into());
        self
    }
}

/// Authoring lifecycle of a process definition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleStatus {
    #[default]
    Draft,
    Active,
    Inactive,
    Archived,
}

/// A named, versioned collection of steps and connections.
///
/// Created on first save, mutated on every edit, never physically
/// deleted by this core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Process {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub version: u32,
    #[serde(default)]
    pub lifecycle: LifecycleStatus,
    pub steps: Vec<Step>,
    pub connections: Vec<Connection>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Process {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            version: 1,
            lifecycle: LifecycleStatus::Draft,
            steps: Vec::new(),
            connections: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn get_step(&self, step_id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == step_id)
    }

    /// Stamp the definition as edited.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Validate the graph for execution.
    ///
    /// Checks the two conditions the orchestrator refuses to run on: an
    /// empty step list and connections whose endpoints reference steps
    /// absent from this process. Cycles are not an error here; the
    /// scheduler orders cyclic graphs best-effort.
    pub fn validate(&self) -> Result<(), ProcessError> {
        if self.steps.is_empty() {
            return Err(ProcessError::EmptyProcess);
        }

        let ids: HashSet<&str> = self.steps.iter().map(|s| s.id.as_str()).collect();
        for connection in &self.connections {
            for endpoint in [&connection.source, &connection.target] {
                if !ids.contains(endpoint.as_str()) {
                    return Err(ProcessError::DanglingConnection {
                        connection: connection.id.clone(),
                        step: endpoint.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Execution records
// ---------------------------------------------------------------------------

/// Status of one step within one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Running,
    Success,
    Error,
    Skipped,
}

impl StepStatus {
    /// Returns `true` once the result is immutable.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StepStatus::Success | StepStatus::Error | StepStatus::Skipped
        )
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StepStatus::Success)
    }
}

/// Status of a whole execution. Transitions monotonically from
/// `Running` to exactly one terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ExecutionStatus::Running)
    }
}

/// The per-step outcome record within one execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepExecutionResult {
    pub step_id: String,
    pub step_label: String,
    pub status: StepStatus,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl StepExecutionResult {
    /// Marker pushed before the executor is invoked, visible to
    /// observers immediately.
    pub fn running(step: &Step) -> Self {
        Self {
            step_id: step.id.clone(),
            step_label: step.label.clone(),
            status: StepStatus::Running,
            output: None,
            error: None,
            duration_ms: 0,
        }
    }

    pub fn success(step: &Step, output: Value, duration_ms: u64) -> Self {
        Self {
            step_id: step.id.clone(),
            step_label: step.label.clone(),
            status: StepStatus::Success,
            output: Some(output),
            error: None,
            duration_ms,
        }
    }

    pub fn failed(step: &Step, error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            step_id: step.id.clone(),
            step_label: step.label.clone(),
            status: StepStatus::Error,
            output: None,
            error: Some(error.into()),
            duration_ms,
        }
    }

    pub fn skipped(step: &Step) -> Self {
        Self {
            step_id: step.id.clone(),
            step_label: step.label.clone(),
            status: StepStatus::Skipped,
            output: None,
            error: None,
            duration_ms: 0,
        }
    }
}

/// One complete run of a process definition.
///
/// Created fresh for every run, fully populated during the run, and
/// handed to the execution recorder on completion; never mutated after
/// being recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessExecution {
    /// Unique per run.
    pub id: String,
    pub process_id: String,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    pub status: ExecutionStatus,
    pub results: Vec<StepExecutionResult>,
    pub context: Context,
}

impl ProcessExecution {
    pub fn new(process_id: impl Into<String>, initial_context: Option<Context>) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            process_id: process_id.into(),
            started_at: Utc::now(),
            ended_at: None,
            status: ExecutionStatus::Running,
            results: Vec::new(),
            context: initial_context.unwrap_or_default(),
        }
    }

    pub fn result_for(&self, step_id: &str) -> Option<&StepExecutionResult> {
        self.results.iter().find(|r| r.step_id == step_id)
    }
}
