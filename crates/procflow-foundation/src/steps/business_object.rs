//! 业务对象引用步骤
//! Business-object reference step
//!
//! 返回被引用领域对象的字段快照，含确定性的风险评分
//! Returns a snapshot of the referenced domain object's fields with a
//! deterministic computed risk score; never reads the context

use serde_json::{Value, json};

use procflow_kernel::process::BusinessObjectConfig;

use super::StepError;

pub(crate) fn execute(config: &BusinessObjectConfig) -> Result<Value, StepError> {
    Ok(json!({
        "id": config.object_id,
        "name": config.name,
        "classification": config.classification,
        "risk_score": risk_score(&config.object_id, &config.classification),
        "fields": Value::Object(config.fields.clone()),
    }))
}

/// Deterministic 0..=100 score derived from the object identity.
///
/// The real scoring model lives with a collaborator; this snapshot only
/// has to be stable across runs for the same object.
fn risk_score(object_id: &str, classification: &str) -> f64 {
    let base: u32 = object_id.bytes().map(u32::from).sum::<u32>() % 61;
    let weight: u32 = match classification {
        "critical" => 40,
        "high" => 30,
        "medium" => 15,
        _ => 5,
    };
    f64::from((base + weight).min(100))
}
