//! 步骤执行器注册表
//! Step executor registry
//!
//! 按步骤类型分发到对应的执行器，所有执行器共享同一个异步签名
//! Dispatches on step kind to the matching executor; every executor
//! shares the same async signature over (config, context)
//!
//! 分发基于封闭的 `StepKind` 枚举，可被编译器穷举检查
//! Dispatch is over the closed `StepKind` enum, exhaustively checked by
//! the compiler

use serde_json::Value;
use thiserror::Error;

use procflow_kernel::process::{Context, Step, StepKind};

use crate::llm::{DynChatProvider, HttpChatProvider};

pub mod branching;
pub mod business_object;
pub mod conditional;
pub mod data_source;
pub mod inference;
pub mod llm_prompt;
pub mod math;
pub mod state_marker;
pub mod transform;

/// 步骤执行错误
/// Step execution error
///
/// 仅覆盖本地可判定的失败；语言模型与公式错误按规约以错误形输出返回
/// Covers locally decidable failures only; language-model and formula
/// errors are returned as error-shaped outputs instead
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StepError {
    /// 上下文中没有数组类型的值可供转换
    /// No array-typed value available in the context to transform
    #[error("no array value found in context")]
    NoArrayInContext,
}

/// 执行器共享的服务句柄
/// Service handles shared by the executors
///
/// 注册表与调度器均为无状态，可跨并发执行安全复用
/// Registry and scheduler are stateless and safely reusable across
/// concurrent executions
#[derive(Clone)]
pub struct StepServices {
    /// Chat-completion backend used by the llm_prompt kind.
    pub chat: DynChatProvider,
}

impl StepServices {
    pub fn new(chat: DynChatProvider) -> Self {
        Self { chat }
    }

    /// Environment-configured services. An absent credential is not an
    /// error here; the prompt executor reports it per request.
    pub fn from_env() -> Self {
        Self {
            chat: std::sync::Arc::new(HttpChatProvider::from_env()),
        }
    }
}

/// 执行单个步骤
/// Execute a single step
///
/// 读取自身配置与共享上下文，返回输出值；不修改上下文
/// Reads its own config plus the shared context and returns an output
/// value; never mutates the context
pub async fn execute_step(
    step: &Step,
    context: &Context,
    services: &StepServices,
) -> Result<Value, StepError> {
    match &step.kind {
        StepKind::DataSource(cfg) => data_source::execute(cfg),
        StepKind::BusinessObject(cfg) => business_object::execute(cfg),
        StepKind::Transform(cfg) => transform::execute(cfg, context),
        StepKind::Conditional(cfg) => conditional::execute(cfg, context),
        StepKind::LlmPrompt(cfg) => llm_prompt::execute(cfg, context, &services.chat).await,
        StepKind::Math(cfg) => math::execute(cfg, context),
        StepKind::StateMarker(cfg) => state_marker::execute(cfg, &step.label),
        StepKind::Branching(cfg) => branching::execute(cfg, context),
        StepKind::Inference(cfg) => inference::execute(cfg),
    }
}

/// 将上下文值按数值解释
/// Interpret a context value as a number
///
/// 数字直接取值，字符串按十进制解析，布尔按 0/1
/// Numbers pass through, strings parse as decimal, booleans map to 0/1
pub(crate) fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// 将上下文值渲染为替换文本
/// Render a context value as substitution text
///
/// 字符串不带引号，其余按紧凑 JSON
/// Strings render unquoted, everything else as compact JSON
pub(crate) fn to_display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
