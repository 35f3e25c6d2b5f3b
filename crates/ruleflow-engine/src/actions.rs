//! 动作解析
//!
//! 在命中规则的上下文中求值动作参数，生成有序的动作调用列表。

use crate::context::EvaluationContext;
use crate::error::{Result, RuleError};
use crate::evaluator::ExpressionEvaluator;
use crate::models::{ActionCall, ActionCallNode, ActionParams};

pub struct ActionResolver;

impl ActionResolver {
    /// 解析动作列表
    ///
    /// 同名动作保留为独立条目；参数按声明顺序排列，值统一转为字符串。
    /// 任一参数求值失败时返回 [`RuleError::ActionParameterResolution`]，调用方丢弃整个列表。
    pub fn resolve(
        actions: &[ActionCallNode],
        ctx: &EvaluationContext<'_>,
    ) -> Result<Vec<ActionCall>> {
        actions
            .iter()
            .map(|action| Self::resolve_call(action, ctx))
            .collect()
    }

    fn resolve_call(action: &ActionCallNode, ctx: &EvaluationContext<'_>) -> Result<ActionCall> {
        let mut params = ActionParams::new();
        for param in &action.params {
            let value = ExpressionEvaluator::evaluate(&param.value, ctx).map_err(|e| {
                RuleError::ActionParameterResolution(format!(
                    "Error resolving parameter '{}' of action '{}': {}",
                    param.key, action.name, e
                ))
            })?;
            params.insert(param.key.as_str(), value.canonical_string());
        }

        Ok(ActionCall {
            name: action.name.clone(),
            params,
        })
    }
}
