//! 工作流执行器
//!
//! 按声明顺序遍历规则集与规则，规则/规则集边界是唯一把故障降级为警告的地方：
//! 单个规则失败只跳过该规则，守卫条件失败只跳过该规则集，遍历继续。

use crate::actions::ActionResolver;
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::context::EvaluationContext;
use crate::error::{Result, RuleError, Severity};
use crate::evaluator::ExpressionEvaluator;
use crate::metrics;
use crate::models::{
    ActionCall, ActionCallNode, Decision, EvaluationMode, MatchedRule, NamedLists, Outcome, Rule,
    RuleSet, WorkflowDocument,
};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, instrument, warn};

/// 故障发生的位置，用于生成警告文本
#[derive(Debug, Clone, Copy)]
enum FaultSite<'a> {
    Ruleset(&'a str),
    Rule(&'a str),
    Default,
}

impl fmt::Display for FaultSite<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ruleset(name) => write!(f, "ruleset {}", name),
            Self::Rule(name) => write!(f, "rule {}", name),
            Self::Default => write!(f, "default"),
        }
    }
}

/// 单次评估过程中累积的状态
#[derive(Debug, Default)]
struct Traversal {
    warnings: BTreeSet<String>,
    error: bool,
    matches: Vec<MatchedRule>,
}

impl Traversal {
    fn record_fault(&mut self, err: &RuleError, site: FaultSite<'_>) {
        let message = if err.is_type_comparison() {
            format!("There is a comparison between different dataTypes in {}", site)
        } else {
            let text = err.to_string();
            if text.is_empty() {
                format!("unexpected fault at {}", site)
            } else {
                text
            }
        };

        match err.severity() {
            Severity::Recoverable => match err {
                RuleError::PropertyNotFound(_) => debug!("{} 跳过: {}", site, message),
                _ => warn!("{} 跳过: {}", site, message),
            },
            Severity::Degrading | Severity::Fatal => {
                error!("{} 求值失败: {}", site, err);
                self.error = true;
            }
        }
        self.warnings.insert(message);
    }

    /// 动作参数解析失败时丢弃整个动作列表，规则仍然命中
    fn resolve_actions(
        &mut self,
        actions: &[ActionCallNode],
        ctx: &EvaluationContext<'_>,
    ) -> Vec<ActionCall> {
        match ActionResolver::resolve(actions, ctx) {
            Ok(calls) => calls,
            Err(e) => {
                warn!("动作参数解析失败，丢弃动作列表: {}", e);
                self.warnings.insert(e.to_string());
                Vec::new()
            }
        }
    }
}

/// 工作流执行器
///
/// 持有注入的时钟与配置；执行器本身不保存评估状态，可在多线程间共享。
#[derive(Clone)]
pub struct WorkflowExecutor {
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl Default for WorkflowExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowExecutor {
    pub fn new() -> Self {
        metrics::describe_metrics();
        Self {
            clock: Arc::new(SystemClock),
            config: EngineConfig::default(),
        }
    }

    /// 注入时钟
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 评估工作流文档
    ///
    /// 只有文档结构错误（缺少默认结果）会返回 `Err`，其余故障都记录在决策的警告中。
    /// 文档不经过 [`WorkflowLoader`](crate::loader::WorkflowLoader) 校验，
    /// 字面量中的非法日期单位、geohash 精度和正则在这里表现为运行时故障（警告 + `error=true`）。
    #[instrument(skip_all, fields(workflow = %document.name))]
    pub fn execute(
        &self,
        document: &WorkflowDocument,
        payload: &JsonValue,
        lists: &NamedLists,
    ) -> Result<Decision> {
        let start = Instant::now();

        let empty = Map::new();
        let data = match payload.as_object() {
            Some(map) => map,
            None => {
                warn!("请求数据不是 JSON 对象，按空对象处理");
                &empty
            }
        };

        let result = self.resolve(document, data, lists);

        let outcome = match &result {
            Ok(decision) if decision.is_default() => "default",
            Ok(_) => "matched",
            Err(_) => "failed",
        };
        metrics::record_workflow_evaluation(
            &document.name,
            outcome,
            start.elapsed().as_secs_f64(),
        );

        result
    }

    fn resolve(
        &self,
        document: &WorkflowDocument,
        data: &Map<String, JsonValue>,
        lists: &NamedLists,
    ) -> Result<Decision> {
        let Some(default_outcome) = &document.default.outcome else {
            return Err(RuleError::InvalidDocument(format!(
                "workflow '{}' has no default outcome",
                document.name
            )));
        };

        let ctx = EvaluationContext::new(data, lists, self.clock.as_ref(), &self.config);
        let mut traversal = Traversal::default();

        for ruleset in &document.rulesets {
            if !Self::ruleset_included(ruleset, &ctx, &mut traversal) {
                continue;
            }

            for rule in &ruleset.rules {
                let Some(matched) = Self::evaluate_rule(ruleset, rule, &ctx, &mut traversal)
                else {
                    continue;
                };

                debug!("规则命中: {}.{} => {}", ruleset.name, rule.name, matched.result);
                match document.evaluation_mode {
                    EvaluationMode::Single => {
                        return Ok(Self::decision(document, matched, Vec::new(), traversal));
                    }
                    EvaluationMode::Multi => traversal.matches.push(matched),
                }
            }
        }

        if let Some(first) = traversal.matches.first().cloned() {
            let matches = std::mem::take(&mut traversal.matches);
            debug!("多匹配模式命中 {} 条规则", matches.len());
            return Ok(Self::decision(document, first, matches, traversal));
        }

        let result = match Self::resolve_outcome(default_outcome, &ctx) {
            Ok(result) => result,
            Err(e) => {
                traversal.record_fault(&e, FaultSite::Default);
                traversal.error = true;
                Decision::DEFAULT_ID.to_string()
            }
        };
        let action_calls = traversal.resolve_actions(&document.default.actions, &ctx);

        debug!("未命中任何规则，使用默认结果: {}", result);
        let fallback = MatchedRule {
            ruleset_id: Decision::DEFAULT_ID.to_string(),
            rule_id: Decision::DEFAULT_ID.to_string(),
            result,
            action_calls,
        };
        Ok(Self::decision(document, fallback, Vec::new(), traversal))
    }

    /// 守卫条件不成立或求值失败时跳过整个规则集
    fn ruleset_included(
        ruleset: &RuleSet,
        ctx: &EvaluationContext<'_>,
        traversal: &mut Traversal,
    ) -> bool {
        let Some(guard) = &ruleset.condition else {
            return true;
        };
        match ExpressionEvaluator::evaluate_condition(guard, ctx) {
            Ok(included) => {
                if !included {
                    debug!("规则集守卫条件不成立，跳过: {}", ruleset.name);
                }
                included
            }
            Err(e) => {
                traversal.record_fault(&e, FaultSite::Ruleset(&ruleset.name));
                false
            }
        }
    }

    fn evaluate_rule(
        ruleset: &RuleSet,
        rule: &Rule,
        ctx: &EvaluationContext<'_>,
        traversal: &mut Traversal,
    ) -> Option<MatchedRule> {
        let outcome = ExpressionEvaluator::evaluate_condition(&rule.condition, ctx)
            .and_then(|matched| {
                if matched {
                    Self::resolve_outcome(&rule.outcome, ctx).map(Some)
                } else {
                    Ok(None)
                }
            });

        let result = match outcome {
            Ok(Some(result)) => result,
            Ok(None) => return None,
            Err(e) => {
                traversal.record_fault(&e, FaultSite::Rule(&rule.name));
                return None;
            }
        };

        let action_calls = traversal.resolve_actions(&rule.actions, ctx);
        Some(MatchedRule {
            ruleset_id: ruleset.name.clone(),
            rule_id: rule.name.clone(),
            result,
            action_calls,
        })
    }

    fn resolve_outcome(outcome: &Outcome, ctx: &EvaluationContext<'_>) -> Result<String> {
        match outcome {
            Outcome::State(state) => Ok(state.clone()),
            Outcome::Expr(expr) => Ok(ExpressionEvaluator::evaluate(expr, ctx)?.canonical_string()),
        }
    }

    fn decision(
        document: &WorkflowDocument,
        primary: MatchedRule,
        matched_rules: Vec<MatchedRule>,
        traversal: Traversal,
    ) -> Decision {
        Decision {
            workflow: document.name.clone(),
            ruleset_id: primary.ruleset_id,
            rule_id: primary.rule_id,
            result: primary.result,
            action_calls: primary.action_calls,
            warnings: traversal.warnings,
            error: traversal.error,
            matched_rules,
        }
    }
}

/// 使用系统时钟与默认配置评估文档
///
/// 日期单位等字面量的校验发生在加载阶段（[`WorkflowLoader`](crate::loader::WorkflowLoader)）；
/// 直接评估未加载的文档时，非法单位记为降级故障而不是中止评估。
pub fn evaluate(
    document: &WorkflowDocument,
    payload: &JsonValue,
    lists: &NamedLists,
) -> Result<Decision> {
    WorkflowExecutor::new().execute(document, payload, lists)
}
