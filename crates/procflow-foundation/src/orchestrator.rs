//! 流程编排器
//! Process orchestrator
//!
//! 驱动调度器与执行器注册表，维护共享上下文并累积每步结果
//! Drives the scheduler and the executor registry, maintains the shared
//! context and accumulates per-step results
//!
//! 执行严格顺序：即使两步之间没有依赖边，编排器也等待上一步
//! 完成后才开始下一步。唯一的挂起点是语言模型调用。
//! Execution is strictly sequential: even steps with no dependency edge
//! between them run one at a time, each awaited to completion. The only
//! suspension point is the language-model call.
//!
//! 取消为协作式：仅在步骤边界检查，进行中的步骤总是跑完
//! Cancellation is cooperative: checked at step boundaries only, an
//! in-flight step always runs to completion

use chrono::Utc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use procflow_kernel::event::ExecutionEvent;
use procflow_kernel::process::{
    Context, ExecutionStatus, OnError, Process, ProcessExecution, Step, StepExecutionResult,
};
use procflow_kernel::schedule::execution_order;
use procflow_kernel::store::DynExecutionHistory;
use procflow_kernel::ProcessError;

use crate::steps::{StepServices, execute_step};

/// 流程编排器
/// Process orchestrator
///
/// 每次 `run` 产生一个全新的 `ProcessExecution`；同一定义的并发执行
/// 互不共享上下文
/// Each `run` produces a fresh `ProcessExecution`; concurrent executions
/// of the same definition never share a context instance
pub struct ProcessOrchestrator {
    services: StepServices,
    /// 事件发送器（可选，仅用于进度展示）
    /// Event transmitter (optional, progress display only)
    event_tx: Option<mpsc::Sender<ExecutionEvent>>,
    /// 执行历史（可选）
    /// Execution history (optional)
    history: Option<DynExecutionHistory>,
    /// 协作式取消令牌
    /// Cooperative cancellation token
    cancel: CancellationToken,
}

impl ProcessOrchestrator {
    pub fn new(services: StepServices) -> Self {
        Self {
            services,
            event_tx: None,
            history: None,
            cancel: CancellationToken::new(),
        }
    }

    /// 设置事件发送器
    /// Set event transmitter
    pub fn with_event_sender(mut self, tx: mpsc::Sender<ExecutionEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    /// 挂接执行历史
    /// Attach execution history
    pub fn with_history(mut self, history: DynExecutionHistory) -> Self {
        self.history = Some(history);
        self
    }

    /// 使用外部取消令牌
    /// Use an externally owned cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// 取消句柄；跨任务触发 `cancel()` 即请求停止
    /// Cancellation handle; call `cancel()` from another task to request
    /// a stop
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 请求协作式取消
    /// Request cooperative cancellation
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// 发送执行事件
    /// Emit execution event
    async fn emit(&self, event: ExecutionEvent) {
        if let Some(ref tx) = self.event_tx {
            let _ = tx.send(event).await;
        }
    }

    /// 执行流程
    /// Execute a process
    ///
    /// 校验失败立即上抛；其余情况总是返回完整的执行记录，
    /// 包含失败与取消
    /// Validation failures surface immediately; otherwise the caller
    /// always receives the complete execution record, failures and
    /// cancellations included
    pub async fn run(
        &self,
        process: &Process,
        initial_context: Option<Context>,
    ) -> Result<ProcessExecution, ProcessError> {
        process.validate().inspect_err(|err| {
            error!(process_id = %process.id, %err, "process validation failed");
        })?;

        let mut execution = ProcessExecution::new(&process.id, initial_context);
        let run_started = Instant::now();

        info!(
            process_id = %process.id,
            execution_id = %execution.id,
            steps = process.steps.len(),
            "starting process execution"
        );
        self.emit(ExecutionEvent::ExecutionStarted {
            execution_id: execution.id.clone(),
            process_id: process.id.clone(),
        })
        .await;

        let ordered = execution_order(&process.steps, &process.connections);

        for step in ordered {
            // 步骤边界是唯一的取消检查点
            // Step boundaries are the only cancellation checkpoints
            if self.cancel.is_cancelled() {
                info!(
                    execution_id = %execution.id,
                    "execution cancelled before step '{}'", step.id
                );
                execution.status = ExecutionStatus::Cancelled;
                break;
            }

            // 先写入 running 记录，让观察者立即可见
            // Push the running record first so observers see it
            // immediately
            execution.results.push(StepExecutionResult::running(step));
            self.emit(ExecutionEvent::StepStarted {
                step_id: step.id.clone(),
                step_label: step.label.clone(),
            })
            .await;

            let started = Instant::now();
            let outcome = execute_step(step, &execution.context, &self.services).await;
            let duration_ms = started.elapsed().as_millis() as u64;

            let result = self.settle_step(&mut execution, step, outcome, duration_ms);
            let failed = result.status == procflow_kernel::process::StepStatus::Error
                && matches!(step.kind.on_error(), Some(OnError::Fail));

            if let Some(slot) = execution.results.last_mut() {
                *slot = result.clone();
            }
            self.emit(ExecutionEvent::StepFinished {
                step_id: step.id.clone(),
                result,
            })
            .await;

            if failed {
                execution.status = ExecutionStatus::Failed;
                break;
            }
        }

        if execution.status == ExecutionStatus::Running {
            execution.status = ExecutionStatus::Completed;
        }
        execution.ended_at = Some(Utc::now());

        info!(
            execution_id = %execution.id,
            status = ?execution.status,
            elapsed_ms = run_started.elapsed().as_millis() as u64,
            "process execution finished"
        );
        self.emit(ExecutionEvent::ExecutionFinished {
            execution_id: execution.id.clone(),
            status: execution.status,
        })
        .await;

        if let Some(ref history) = self.history {
            if let Err(err) = history.record(execution.clone()).await {
                warn!(%err, "failed to record execution history");
            }
        }

        Ok(execution)
    }

    /// 结算单步结果并合并上下文
    /// Settle one step outcome and merge the context
    ///
    /// 错误形输出在 on_error 为 fail 时等同于抛错；其余错误仅记录在
    /// 本步结果中，执行继续
    /// An error-shaped output counts as a throw when on_error is fail;
    /// every other error is recovered into the step result and the run
    /// continues
    fn settle_step(
        &self,
        execution: &mut ProcessExecution,
        step: &Step,
        outcome: Result<serde_json::Value, crate::steps::StepError>,
        duration_ms: u64,
    ) -> StepExecutionResult {
        match outcome {
            Ok(output) => {
                let soft_error = output
                    .get("error")
                    .map(|e| !e.is_null())
                    .unwrap_or(false);

                if soft_error && matches!(step.kind.on_error(), Some(OnError::Fail)) {
                    let message = output["error"]
                        .as_str()
                        .unwrap_or("step reported an error")
                        .to_string();
                    warn!(step_id = %step.id, %message, "step failed, stopping execution");
                    return StepExecutionResult::failed(step, message, duration_ms);
                }

                execution
                    .context
                    .insert(step.output_key().to_string(), output.clone());
                StepExecutionResult::success(step, output, duration_ms)
            }
            Err(err) => {
                warn!(step_id = %step.id, %err, "step executor failed");
                StepExecutionResult::failed(step, err.to_string(), duration_ms)
            }
        }
    }
}
