//! 数据转换步骤
//! Data transform step
//!
//! 取上下文中第一个数组类型的值并应用 map/filter/aggregate
//! Takes the first array-typed value found in the context and applies
//! map/filter/aggregate per the configured operation
//!
//! 取值策略为先到先得而非按边取数，属于已知的扁平命名空间约定
//! First match wins rather than edge-keyed lookup; part of the known
//! flat-namespace contract

use serde_json::{Value, json};

use procflow_kernel::process::{Context, TransformConfig, TransformOperation};

use super::StepError;

pub(crate) fn execute(config: &TransformConfig, context: &Context) -> Result<Value, StepError> {
    let items = first_array(context).ok_or(StepError::NoArrayInContext)?;

    let output = match config.operation {
        TransformOperation::Map => Value::Array(map_items(items, config.field.as_deref())),
        TransformOperation::Filter => {
            Value::Array(filter_items(items, config.field.as_deref(), config.value.as_ref()))
        }
        TransformOperation::Aggregate => json!({
            "count": items.len(),
            "items": items,
        }),
    };

    Ok(output)
}

/// 按插入顺序找到第一个数组值
/// First array value in insertion order
///
/// 表格型输出把数据包在 "rows" / "items" 下，查找时仅下探这两个键
/// Tabular outputs wrap their data under "rows" / "items"; the lookup
/// descends into exactly those keys
fn first_array(context: &Context) -> Option<Vec<Value>> {
    for value in context.values() {
        if let Value::Array(items) = value {
            return Some(items.clone());
        }
        if let Value::Object(map) = value {
            for key in ["rows", "items"] {
                if let Some(Value::Array(items)) = map.get(key) {
                    return Some(items.clone());
                }
            }
        }
    }
    None
}

fn map_items(items: Vec<Value>, field: Option<&str>) -> Vec<Value> {
    match field {
        Some(field) => items
            .into_iter()
            .map(|item| item.get(field).cloned().unwrap_or(Value::Null))
            .collect(),
        None => items,
    }
}

fn filter_items(items: Vec<Value>, field: Option<&str>, expected: Option<&Value>) -> Vec<Value> {
    items
        .into_iter()
        .filter(|item| {
            let candidate = match field {
                Some(field) => item.get(field),
                None => Some(item),
            };
            match (candidate, expected) {
                (Some(actual), Some(expected)) => actual == expected,
                (Some(actual), None) => !actual.is_null(),
                (None, _) => false,
            }
        })
        .collect()
}
