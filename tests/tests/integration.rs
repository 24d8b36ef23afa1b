//! End-to-end tests driving the orchestrator through complete process
//! definitions, with the language-model service stubbed out.

use std::sync::Arc;

use serde_json::json;
use tokio_util::sync::CancellationToken;

use procflow_foundation::{
    ExecutionRecorder, MemoryDefinitionStore, ProcessOrchestrator, StepServices,
};
use procflow_kernel::process::{
    CompareOperator, ConditionalConfig, Context, DataSourceConfig, ExecutionStatus,
    LlmPromptConfig, MathConfig, OnError, Step, StepKind, StepStatus, TransformConfig,
    TransformOperation,
};
use procflow_kernel::store::DefinitionStore;
use procflow_kernel::{ProcessBuilder, execution_order};
use procflow_testing::MockChatBackend;

fn services(backend: MockChatBackend) -> StepServices {
    StepServices::new(Arc::new(backend))
}

fn data_step(id: &str) -> Step {
    Step::new(
        id,
        "Load incidents",
        StepKind::DataSource(DataSourceConfig {
            name: "incidents".into(),
            columns: vec!["name".into(), "severity".into()],
            rows: vec![
                json!({"name": "outage", "severity": "high"}),
                json!({"name": "phish", "severity": "low"}),
            ],
        }),
    )
}

#[tokio::test]
async fn linear_chain_propagates_context_through_all_steps() {
    let process = ProcessBuilder::new("risk-review", "Risk review")
        .description("Load, count, escalate")
        .then(data_step("load"))
        .then(Step::new(
            "count",
            "Count incidents",
            StepKind::Transform(TransformConfig {
                operation: TransformOperation::Aggregate,
                field: None,
                value: None,
            }),
        ))
        .then(Step::new(
            "summary",
            "Summarize",
            StepKind::LlmPrompt(LlmPromptConfig {
                prompt: "Summarize {{count}} incidents".into(),
                ..Default::default()
            }),
        ))
        .build();

    let backend = MockChatBackend::new();
    backend.add_mock_response("incidents", "Two incidents on record.");

    let orchestrator = ProcessOrchestrator::new(services(backend));
    let execution = orchestrator.run(&process, None).await.unwrap();

    assert_eq!(execution.status, ExecutionStatus::Completed);
    assert_eq!(execution.process_id, "risk-review");

    let order: Vec<_> = execution
        .results
        .iter()
        .map(|r| r.step_id.as_str())
        .collect();
    assert_eq!(order, vec!["load", "count", "summary"]);
    assert!(
        execution
            .results
            .iter()
            .all(|r| r.status == StepStatus::Success)
    );

    // One context entry per successful step, keyed by step id here.
    assert_eq!(execution.context["load"]["row_count"], 2);
    assert_eq!(execution.context["count"]["count"], 2);
    assert_eq!(
        execution.context["summary"]["response"],
        "Two incidents on record."
    );
}

#[tokio::test]
async fn llm_fail_policy_stops_processing_later_steps() {
    let process = ProcessBuilder::new("gated", "Gated")
        .then(data_step("load"))
        .then(Step::new(
            "gate",
            "Mandatory assessment",
            StepKind::LlmPrompt(LlmPromptConfig {
                prompt: "Assess the loaded incidents".into(),
                on_error: OnError::Fail,
                ..Default::default()
            }),
        ))
        .then(Step::new(
            "never",
            "Unreached",
            StepKind::StateMarker(Default::default()),
        ))
        .build();

    let orchestrator =
        ProcessOrchestrator::new(services(MockChatBackend::failing("model unavailable")));
    let execution = orchestrator.run(&process, None).await.unwrap();

    assert_eq!(execution.status, ExecutionStatus::Failed);
    // Results stop at the failing step; the third step never ran.
    assert_eq!(execution.results.len(), 2);
    assert_eq!(execution.results[1].step_id, "gate");
    assert_eq!(execution.results[1].status, StepStatus::Error);
    assert!(execution.ended_at.is_some());
    assert!(execution.result_for("never").is_none());
}

#[tokio::test]
async fn missing_credential_is_a_soft_error_by_default() {
    let process = ProcessBuilder::new("soft", "Soft")
        .then(Step::new(
            "ask",
            "Ask",
            StepKind::LlmPrompt(LlmPromptConfig {
                prompt: "Anything at all".into(),
                ..Default::default()
            }),
        ))
        .then(Step::new(
            "after",
            "After",
            StepKind::StateMarker(Default::default()),
        ))
        .build();

    let orchestrator =
        ProcessOrchestrator::new(services(MockChatBackend::without_credential()));
    let execution = orchestrator.run(&process, None).await.unwrap();

    assert_eq!(execution.status, ExecutionStatus::Completed);
    assert_eq!(
        execution.context["ask"]["error"],
        "no credential configured"
    );
    assert!(execution.context["ask"]["response"].is_null());
    assert_eq!(execution.results[1].status, StepStatus::Success);
}

#[tokio::test]
async fn conditional_and_math_steps_read_the_initial_context() {
    let mut initial = Context::new();
    initial.insert("x".into(), json!(5));
    initial.insert("a".into(), json!(2));
    initial.insert("b".into(), json!(3));

    let process = ProcessBuilder::new("calc", "Calc")
        .then(Step::new(
            "check",
            "Threshold check",
            StepKind::Conditional(ConditionalConfig {
                variable: "x".into(),
                operator: CompareOperator::Gt,
                value: json!("3"),
            }),
        ))
        .then(Step::new(
            "sum",
            "Sum",
            StepKind::Math(MathConfig {
                formula: "a+b".into(),
                precision: 2,
            }),
        ))
        .build();

    let orchestrator = ProcessOrchestrator::new(services(MockChatBackend::new()));
    let execution = orchestrator.run(&process, Some(initial)).await.unwrap();

    assert_eq!(execution.context["check"]["result"], true);
    assert_eq!(execution.context["check"]["branch"], "true");
    assert_eq!(execution.context["sum"]["result"].as_f64().unwrap(), 5.0);
}

#[tokio::test]
async fn cyclic_graph_still_executes_every_step_once() {
    // a <-> b cycle plus independent c.
    let process = ProcessBuilder::new("cyclic", "Cyclic")
        .step(Step::new("a", "A", StepKind::StateMarker(Default::default())))
        .step(Step::new("b", "B", StepKind::StateMarker(Default::default())))
        .step(Step::new("c", "C", StepKind::StateMarker(Default::default())))
        .connect("a", "b")
        .connect("b", "a")
        .build();

    let ordered: Vec<_> = execution_order(&process.steps, &process.connections)
        .iter()
        .map(|s| s.id.clone())
        .collect();
    assert_eq!(ordered, vec!["c", "a", "b"]);

    let orchestrator = ProcessOrchestrator::new(services(MockChatBackend::new()));
    let execution = orchestrator.run(&process, None).await.unwrap();

    assert_eq!(execution.status, ExecutionStatus::Completed);
    assert_eq!(execution.results.len(), 3);
    assert_eq!(execution.context.len(), 3);
}

#[tokio::test]
async fn cancellation_mid_run_stops_at_the_next_step_boundary() {
    let token = CancellationToken::new();
    let backend = MockChatBackend::cancelling(token.clone());

    let process = ProcessBuilder::new("cancelled", "Cancelled")
        .then(Step::new(
            "ask",
            "Ask",
            StepKind::LlmPrompt(LlmPromptConfig {
                prompt: "Kick things off".into(),
                ..Default::default()
            }),
        ))
        .then(data_step("load"))
        .build();

    let orchestrator =
        ProcessOrchestrator::new(services(backend)).with_cancellation(token);
    let execution = orchestrator.run(&process, None).await.unwrap();

    // The in-flight step ran to completion; the next one never started.
    assert_eq!(execution.status, ExecutionStatus::Cancelled);
    assert_eq!(execution.results.len(), 1);
    assert_eq!(execution.results[0].step_id, "ask");
    assert_eq!(execution.results[0].status, StepStatus::Success);
    assert!(execution.ended_at.is_some());
    assert!(execution.result_for("load").is_none());
}

#[tokio::test]
async fn recorder_keeps_the_newest_n_executions() {
    let recorder = Arc::new(ExecutionRecorder::with_capacity(5));
    let orchestrator = ProcessOrchestrator::new(services(MockChatBackend::new()))
        .with_history(recorder.clone());

    for n in 0..8 {
        let process = ProcessBuilder::new(&format!("p{n}"), "Repeat")
            .then(Step::new(
                "mark",
                "Mark",
                StepKind::StateMarker(Default::default()),
            ))
            .build();
        orchestrator.run(&process, None).await.unwrap();
    }

    let recent = recorder.recent(10).await;
    assert_eq!(recent.len(), 5);
    let ids: Vec<_> = recent.iter().map(|e| e.process_id.as_str()).collect();
    assert_eq!(ids, vec!["p7", "p6", "p5", "p4", "p3"]);
    assert!(recent.iter().all(|e| e.status == ExecutionStatus::Completed));
}

#[tokio::test]
async fn definition_store_round_trips_and_bumps_updated_at() {
    let store = MemoryDefinitionStore::new();

    let process = ProcessBuilder::new("stored", "Stored")
        .then(data_step("load"))
        .build();
    let created = store.create(process).await.unwrap();

    let mut edited = store.load("stored").await.unwrap();
    edited.description = "edited".into();
    let saved = store.save(edited).await.unwrap();

    assert!(saved.updated_at >= created.updated_at);
    assert_eq!(store.load("stored").await.unwrap().description, "edited");
    assert!(store.load("ghost").await.is_err());
}

#[tokio::test]
async fn executing_a_loaded_definition_works_end_to_end() {
    let store = MemoryDefinitionStore::new();
    let definition = ProcessBuilder::new("full", "Full loop")
        .then(data_step("load"))
        .then(Step::new(
            "high_only",
            "High severity only",
            StepKind::Transform(TransformConfig {
                operation: TransformOperation::Filter,
                field: Some("severity".into()),
                value: Some(json!("high")),
            }),
        ))
        .build();
    store.create(definition).await.unwrap();

    let loaded = store.load("full").await.unwrap();
    let orchestrator = ProcessOrchestrator::new(services(MockChatBackend::new()));
    let execution = orchestrator.run(&loaded, None).await.unwrap();

    assert_eq!(execution.status, ExecutionStatus::Completed);
    assert_eq!(execution.context["high_only"].as_array().unwrap().len(), 1);
}
