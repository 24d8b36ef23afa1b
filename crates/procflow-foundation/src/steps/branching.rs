//! 并行分支步骤
//! Branching step
//!
//! 只记录分支意图与上下文快照；本核心不做真正的并行扇出，
//! 执行始终严格顺序进行
//! Records branch intent and a context snapshot only; this core never
//! fans out, execution stays strictly sequential

use serde_json::{Value, json};

use procflow_kernel::process::{BranchingConfig, Context};

use super::StepError;

pub(crate) fn execute(config: &BranchingConfig, context: &Context) -> Result<Value, StepError> {
    Ok(json!({
        "strategy": config.strategy,
        "branch_count": config.branch_count,
        "context_snapshot": Value::Object(context.clone()),
    }))
}
