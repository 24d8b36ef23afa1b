//! 模型推理占位步骤
//! ML inference stub step
//!
//! 返回合成的预测结果；真实推理服务是外部协作方
//! Returns a synthetic prediction; the real inference service is an
//! external collaborator

use serde_json::{Value, json};

use procflow_kernel::process::InferenceConfig;

use super::StepError;

pub(crate) fn execute(config: &InferenceConfig) -> Result<Value, StepError> {
    let seed: u32 = config.model.bytes().map(u32::from).sum();

    let prediction: Value = match config.kind.as_str() {
        "regression" => json!(f64::from(seed % 1000) / 10.0),
        _ => {
            if seed % 2 == 0 {
                json!("approve")
            } else {
                json!("review")
            }
        }
    };
    let confidence = 0.5 + f64::from(seed % 50) / 100.0;

    Ok(json!({
        "model": config.model,
        "kind": if config.kind.is_empty() { "classification" } else { config.kind.as_str() },
        "prediction": prediction,
        "confidence": confidence,
    }))
}
