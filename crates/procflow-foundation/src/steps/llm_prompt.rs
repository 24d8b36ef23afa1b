//! 语言模型提示步骤
//! Language-model prompt step
//!
//! 将上下文键以 {{key}} 形式代入提示词后调用外部模型服务
//! Substitutes every context key into the prompt as {{key}} and issues
//! a request against the external model service
//!
//! 永不抛错：空提示、缺少凭证、服务失败一律以错误形输出返回，
//! 是否升级为执行失败由编排器按 on_error 策略决定
//! Never fails hard: empty prompt, missing credential and service
//! failure all come back as error-shaped outputs; elevation to a run
//! failure is the orchestrator's on_error decision

use serde_json::{Value, json};
use tracing::warn;

use procflow_kernel::process::{Context, LlmPromptConfig};

use super::{StepError, to_display};
use crate::llm::{ChatMessage, ChatRequest, DynChatProvider};

pub(crate) async fn execute(
    config: &LlmPromptConfig,
    context: &Context,
    chat: &DynChatProvider,
) -> Result<Value, StepError> {
    let prompt = substitute(&config.prompt, context);

    if prompt.trim().is_empty() {
        return Ok(error_output("prompt is empty"));
    }
    if !chat.is_configured() {
        return Ok(json!({"error": "no credential configured", "response": null}));
    }

    let mut messages = Vec::new();
    if let Some(system) = &config.system_prompt {
        messages.push(ChatMessage::system(system));
    }
    messages.push(ChatMessage::user(&prompt));

    let mut request = ChatRequest::new(messages);
    if let Some(model) = &config.model {
        request = request.with_model(model);
    }
    if let Some(temperature) = config.temperature {
        request = request.with_temperature(temperature);
    }
    if let Some(max_tokens) = config.max_tokens {
        request = request.with_max_tokens(max_tokens);
    }

    match chat.complete(request).await {
        Ok(response) => Ok(json!({
            "prompt": prompt,
            "response": response.content,
            "total_tokens": response.total_tokens,
        })),
        Err(err) => {
            warn!(provider = chat.name(), error = %err, "language model call failed");
            Ok(error_output(err.to_string()))
        }
    }
}

fn error_output(message: impl Into<String>) -> Value {
    json!({"error": message.into(), "response": null})
}

/// 对每个上下文键做 {{key}} 字面替换
/// Literal {{key}} replacement for every context key
fn substitute(template: &str, context: &Context) -> String {
    let mut rendered = template.to_string();
    for (key, value) in context {
        let placeholder = format!("{{{{{key}}}}}");
        if rendered.contains(&placeholder) {
            rendered = rendered.replace(&placeholder, &to_display(value));
        }
    }
    rendered
}
