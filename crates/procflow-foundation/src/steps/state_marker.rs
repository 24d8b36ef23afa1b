//! 状态标记步骤
//! State marker step
//!
//! 纯元数据输出，不做任何计算
//! Pure metadata output, no computation

use chrono::Utc;
use serde_json::{Value, json};

use procflow_kernel::process::StateMarkerConfig;

use super::StepError;

pub(crate) fn execute(config: &StateMarkerConfig, label: &str) -> Result<Value, StepError> {
    Ok(json!({
        "state": config.state,
        "label": label,
        "message": config.message,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
