//! 数据源步骤
//! Data source step
//!
//! 返回预置的表格数据，不读取上下文
//! Returns a canned tabular payload; never reads the context

use serde_json::{Value, json};

use procflow_kernel::process::DataSourceConfig;

use super::StepError;

pub(crate) fn execute(config: &DataSourceConfig) -> Result<Value, StepError> {
    let (columns, rows) = if config.rows.is_empty() {
        sample_table()
    } else {
        (config.columns.clone(), config.rows.clone())
    };

    Ok(json!({
        "source": config.name,
        "columns": columns,
        "rows": rows,
        "row_count": rows.len(),
    }))
}

/// Fallback table served when the definition carries no rows.
fn sample_table() -> (Vec<String>, Vec<Value>) {
    let columns = vec!["id".to_string(), "name".to_string(), "amount".to_string()];
    let rows = vec![
        json!({"id": 1, "name": "Contoso Ltd", "amount": 1250.0}),
        json!({"id": 2, "name": "Fabrikam Inc", "amount": 890.5}),
        json!({"id": 3, "name": "Northwind", "amount": 2310.75}),
    ];
    (columns, rows)
}
