//! 算术公式步骤
//! Math formula step
//!
//! 将上下文中的数值按变量名字面代入公式，净化后求值并按精度取整
//! Substitutes numeric context values into the formula by literal token
//! replacement, sanitizes, evaluates and rounds to the configured
//! precision
//!
//! 永不抛错：求值失败返回 result 为 0 并附 error 字段
//! Never fails hard: evaluation failures return result 0 with an error
//! field

use serde_json::{Value, json};

use procflow_kernel::process::{Context, MathConfig};

use super::{StepError, to_number};

/// Characters allowed to reach the evaluator.
const ALLOWED: &str = "0123456789+-*/(). ";

pub(crate) fn execute(config: &MathConfig, context: &Context) -> Result<Value, StepError> {
    let substituted = substitute(&config.formula, context);
    let sanitized: String = substituted.chars().filter(|c| ALLOWED.contains(*c)).collect();

    match evaluate(&sanitized) {
        Ok(value) => {
            let factor = 10f64.powi(config.precision as i32);
            let rounded = (value * factor).round() / factor;
            Ok(json!({"formula": config.formula, "result": rounded}))
        }
        Err(err) => Ok(json!({
            "formula": config.formula,
            "result": 0,
            "error": err,
        })),
    }
}

/// 变量名按长度降序替换，避免短名吃掉长名的前缀
/// Variable names replace longest-first so a short name cannot eat the
/// prefix of a longer one
fn substitute(formula: &str, context: &Context) -> String {
    let mut numeric: Vec<(&String, f64)> = context
        .iter()
        .filter_map(|(key, value)| to_number(value).map(|n| (key, n)))
        .collect();
    numeric.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    let mut rendered = formula.to_string();
    for (key, number) in numeric {
        if rendered.contains(key.as_str()) {
            rendered = rendered.replace(key.as_str(), &float_token(number));
        }
    }
    rendered
}

/// Render substitutions as float literals so `/` evaluates in floating
/// point, matching the source system's evaluator.
fn float_token(number: f64) -> String {
    if number.fract() == 0.0 && number.abs() < 1e15 {
        format!("{number:.1}")
    } else {
        number.to_string()
    }
}

fn evaluate(expression: &str) -> Result<f64, String> {
    if expression.trim().is_empty() {
        return Err("formula is empty after sanitization".to_string());
    }

    let engine = rhai::Engine::new();
    let value = engine
        .eval_expression::<rhai::Dynamic>(expression)
        .map_err(|e| e.to_string())?;

    value
        .clone()
        .try_cast::<f64>()
        .or_else(|| value.try_cast::<i64>().map(|i| i as f64))
        .ok_or_else(|| "formula did not evaluate to a number".to_string())
}
