//! 条件判断步骤
//! Conditional step
//!
//! 解析上下文变量并与配置值比较，输出走向哪个分支
//! Resolves a context variable, compares it against the configured
//! value and reports which branch the result selects
//!
//! 序数比较符将两侧强制转为数值；缺失的变量按 null 参与比较
//! Ordering operators coerce both sides to numbers; a missing variable
//! participates as null

use serde_json::{Value, json};
use tracing::debug;

use procflow_kernel::process::{CompareOperator, ConditionalConfig, Context};

use super::{StepError, to_display, to_number};

pub(crate) fn execute(config: &ConditionalConfig, context: &Context) -> Result<Value, StepError> {
    let actual = context.get(&config.variable).cloned().unwrap_or(Value::Null);
    let result = compare(&actual, config.operator, &config.value);
    let branch = if result { "true" } else { "false" };

    debug!(
        variable = %config.variable,
        operator = config.operator.symbol(),
        branch,
        "conditional evaluated"
    );

    Ok(json!({
        "condition": format!(
            "{} {} {}",
            config.variable,
            config.operator.symbol(),
            to_display(&config.value)
        ),
        "result": result,
        "branch": branch,
    }))
}

fn compare(actual: &Value, operator: CompareOperator, expected: &Value) -> bool {
    match operator {
        CompareOperator::Eq => loose_eq(actual, expected),
        CompareOperator::Ne => !loose_eq(actual, expected),
        CompareOperator::Gt => match (to_number(actual), to_number(expected)) {
            (Some(a), Some(b)) => a > b,
            _ => false,
        },
        CompareOperator::Lt => match (to_number(actual), to_number(expected)) {
            (Some(a), Some(b)) => a < b,
            _ => false,
        },
        CompareOperator::Contains => match (actual, expected) {
            (Value::String(haystack), needle) => haystack.contains(&to_display(needle)),
            (Value::Array(items), needle) => items.iter().any(|item| item == needle),
            _ => false,
        },
    }
}

/// 等值比较：双方可数值化时按数值比，否则按渲染文本比
/// Loose equality: numeric when both sides coerce, textual otherwise
fn loose_eq(actual: &Value, expected: &Value) -> bool {
    match (to_number(actual), to_number(expected)) {
        (Some(a), Some(b)) => a == b,
        _ => to_display(actual) == to_display(expected),
    }
}
