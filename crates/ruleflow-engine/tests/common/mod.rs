//! 集成测试公共工具

use ruleflow::{NamedLists, WorkflowDocument};
use serde_json::Value;
use std::sync::Once;

static INIT: Once = Once::new();

/// 安装测试日志输出（RUST_LOG 控制级别）
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "ruleflow=debug".into()),
            )
            .with_test_writer()
            .try_init();
    });
}

pub fn document(json: Value) -> WorkflowDocument {
    serde_json::from_value(json).expect("workflow document should deserialize")
}

pub fn lists(entries: &[(&str, Value)]) -> NamedLists {
    entries
        .iter()
        .map(|(name, items)| {
            let items = items.as_array().cloned().expect("named list must be an array");
            (name.to_string(), items)
        })
        .collect()
}
