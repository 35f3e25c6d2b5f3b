//! 评估指标
//!
//! 只通过 metrics 门面记录，recorder/exporter 由宿主进程安装。

use std::sync::Once;

static DESCRIBE: Once = Once::new();

/// 注册指标描述（只执行一次）
pub fn describe_metrics() {
    DESCRIBE.call_once(|| {
        metrics::describe_counter!(
            "ruleflow_evaluations_total",
            "Total number of workflow evaluations"
        );
        metrics::describe_histogram!(
            "ruleflow_evaluation_duration_seconds",
            "Workflow evaluation duration in seconds"
        );
    });
}

/// 记录一次工作流评估
///
/// `outcome` 取值：matched（命中规则）、default（落入默认子句）、failed（致命错误）。
pub fn record_workflow_evaluation(workflow: &str, outcome: &str, duration_secs: f64) {
    metrics::counter!(
        "ruleflow_evaluations_total",
        "workflow" => workflow.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    metrics::histogram!(
        "ruleflow_evaluation_duration_seconds",
        "workflow" => workflow.to_string()
    )
    .record(duration_secs);
}
