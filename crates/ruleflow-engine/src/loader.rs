//! 工作流加载器
//!
//! 把 JSON 或内存中的文档校验为可评估的 [`LoadedWorkflow`]，并提取文档引用的输入字段与命名列表。
//! 加载阶段不求值任何表达式。

use crate::ast::{Expr, Qualifier};
use crate::config::{EngineConfig, MAX_GEOHASH_PRECISION};
use crate::error::{Result, RuleError};
use crate::functions::date::DateUnit;
use crate::functions::pattern;
use crate::models::{ActionCallNode, Outcome, WorkflowDocument};
use std::collections::HashSet;
use std::sync::Arc;

const FEATURES_PREFIX: &str = "features.";

/// 加载完成的工作流
#[derive(Debug, Clone)]
pub struct LoadedWorkflow {
    pub document: Arc<WorkflowDocument>,
    /// 文档引用的请求字段路径（不含 `elem` 路径与 `features.` 字段）
    pub input_fields: HashSet<String>,
    /// `features.` 前缀下的字段（去掉前缀）
    pub feature_fields: HashSet<String>,
    /// `list('…')` 与 `evalInList('…', …)` 引用的命名列表
    pub list_names: HashSet<String>,
    /// 加载版本号（用于缓存失效）
    pub load_version: u64,
}

impl LoadedWorkflow {
    pub fn name(&self) -> &str {
        &self.document.name
    }
}

/// 工作流加载器
pub struct WorkflowLoader {
    load_version: u64,
    regex_size_limit: usize,
}

impl WorkflowLoader {
    pub fn new() -> Self {
        Self::with_config(&EngineConfig::default())
    }

    pub fn with_config(config: &EngineConfig) -> Self {
        Self {
            load_version: 0,
            regex_size_limit: config.regex_size_limit,
        }
    }

    /// 从 JSON 字符串加载
    pub fn load_from_json(&mut self, json: &str) -> Result<LoadedWorkflow> {
        let document: WorkflowDocument = serde_json::from_str(json)?;
        self.load(document)
    }

    pub fn load(&mut self, document: WorkflowDocument) -> Result<LoadedWorkflow> {
        self.validate_document(&document)?;

        let mut fields = FieldCollector::default();
        fields.collect_document(&document);

        self.load_version += 1;

        Ok(LoadedWorkflow {
            document: Arc::new(document),
            input_fields: fields.input_fields,
            feature_fields: fields.feature_fields,
            list_names: fields.list_names,
            load_version: self.load_version,
        })
    }

    fn validate_document(&self, document: &WorkflowDocument) -> Result<()> {
        if document.name.trim().is_empty() {
            return Err(invalid("工作流名称不能为空"));
        }

        match &document.default.outcome {
            None => {
                return Err(invalid(format!(
                    "工作流 '{}' 缺少默认结果",
                    document.name
                )));
            }
            Some(outcome) => self.validate_outcome(outcome, "default")?,
        }
        self.validate_actions(&document.default.actions, "default")?;

        for (i, ruleset) in document.rulesets.iter().enumerate() {
            if ruleset.name.trim().is_empty() {
                return Err(invalid(format!("第 {} 个规则集名称不能为空", i)));
            }
            if let Some(guard) = &ruleset.condition {
                self.validate_expr(guard, &ruleset.name)?;
            }

            for (j, rule) in ruleset.rules.iter().enumerate() {
                if rule.name.trim().is_empty() {
                    return Err(invalid(format!(
                        "规则集 '{}' 的第 {} 条规则名称不能为空",
                        ruleset.name, j
                    )));
                }
                let path = format!("{}.{}", ruleset.name, rule.name);
                self.validate_expr(&rule.condition, &path)?;
                self.validate_outcome(&rule.outcome, &path)?;
                self.validate_actions(&rule.actions, &path)?;
            }
        }

        Ok(())
    }

    fn validate_outcome(&self, outcome: &Outcome, path: &str) -> Result<()> {
        match outcome {
            Outcome::State(state) if state.is_empty() => {
                Err(invalid(format!("'{}' 的结果不能为空", path)))
            }
            Outcome::State(_) => Ok(()),
            Outcome::Expr(expr) => self.validate_expr(expr, path),
        }
    }

    fn validate_actions(&self, actions: &[ActionCallNode], path: &str) -> Result<()> {
        for action in actions {
            if action.name.trim().is_empty() {
                return Err(invalid(format!("'{}' 的动作名称不能为空", path)));
            }
            for param in &action.params {
                if param.key.is_empty() {
                    return Err(invalid(format!(
                        "'{}' 的动作 '{}' 存在空参数名",
                        path, action.name
                    )));
                }
                self.validate_expr(&param.value, path)?;
            }
        }
        Ok(())
    }

    /// 校验表达式中可静态判定的错误
    fn validate_expr(&self, expr: &Expr, path: &str) -> Result<()> {
        match expr {
            Expr::Property(property)
                if property.qualifier != Some(Qualifier::Elem) && property.segments.is_empty() =>
            {
                return Err(invalid(format!("'{}' 包含空属性路径", path)));
            }
            Expr::StoredList { name } | Expr::EvalInList { list: name, .. } if name.is_empty() => {
                return Err(invalid(format!("'{}' 引用了空的列表名", path)));
            }
            Expr::DateAdd { unit, .. } | Expr::DateSubtract { unit, .. } | Expr::DateDiff { unit, .. } => {
                unit.parse::<DateUnit>()
                    .map_err(|e| invalid(format!("'{}': {}", path, e)))?;
            }
            Expr::GeohashEncode {
                precision: Some(precision),
                ..
            } => {
                if let Expr::Literal { value } = precision.as_ref() {
                    let valid = value
                        .as_f64()
                        .is_some_and(|p| p >= 1.0 && p <= MAX_GEOHASH_PRECISION as f64);
                    if !valid {
                        return Err(invalid(format!(
                            "'{}' 的 geohash 精度必须在 1 到 {} 之间",
                            path, MAX_GEOHASH_PRECISION
                        )));
                    }
                }
            }
            Expr::Regex {
                pattern: pattern_expr,
                ..
            } => {
                // 预验证字面量正则
                if let Expr::Literal { value } = pattern_expr.as_ref()
                    && let Some(text) = value.as_str()
                {
                    pattern::compile(text, self.regex_size_limit)
                        .map_err(|e| invalid(format!("'{}': {}", path, e)))?;
                }
            }
            _ => {}
        }

        for child in expr.children() {
            self.validate_expr(child, path)?;
        }
        Ok(())
    }
}

impl Default for WorkflowLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn invalid(message: impl Into<String>) -> RuleError {
    RuleError::InvalidDocument(message.into())
}

/// 字段与命名列表收集
#[derive(Default)]
struct FieldCollector {
    input_fields: HashSet<String>,
    feature_fields: HashSet<String>,
    list_names: HashSet<String>,
}

impl FieldCollector {
    fn collect_document(&mut self, document: &WorkflowDocument) {
        for ruleset in &document.rulesets {
            if let Some(guard) = &ruleset.condition {
                self.collect(guard);
            }
            for rule in &ruleset.rules {
                self.collect(&rule.condition);
                if let Outcome::Expr(expr) = &rule.outcome {
                    self.collect(expr);
                }
                self.collect_actions(&rule.actions);
            }
        }
        if let Some(Outcome::Expr(expr)) = &document.default.outcome {
            self.collect(expr);
        }
        self.collect_actions(&document.default.actions);
    }

    fn collect_actions(&mut self, actions: &[ActionCallNode]) {
        for param in actions.iter().flat_map(|a| &a.params) {
            self.collect(&param.value);
        }
    }

    fn collect(&mut self, expr: &Expr) {
        match expr {
            Expr::Property(property) if property.qualifier != Some(Qualifier::Elem) => {
                let dotted = property.dotted();
                match dotted.strip_prefix(FEATURES_PREFIX) {
                    Some(feature) => {
                        self.feature_fields.insert(feature.to_string());
                    }
                    None => {
                        self.input_fields.insert(dotted);
                    }
                }
            }
            Expr::StoredList { name } | Expr::EvalInList { list: name, .. } => {
                self.list_names.insert(name.clone());
            }
            _ => {}
        }

        for child in expr.children() {
            self.collect(child);
        }
    }
}
