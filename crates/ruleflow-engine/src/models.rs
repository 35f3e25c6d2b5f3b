//! 工作流领域模型

use crate::ast::Expr;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// 评估时提供的命名列表
pub type NamedLists = HashMap<String, Vec<JsonValue>>;

/// 匹配策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    /// 返回第一个命中的规则
    #[default]
    #[serde(alias = "single_match")]
    Single,
    /// 收集所有命中的规则
    #[serde(alias = "multi_match")]
    Multi,
}

/// 工作流文档
///
/// 由前端解析后构建一次，此后只读，可被任意多次（并发）评估。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDocument {
    pub name: String,
    #[serde(default)]
    pub evaluation_mode: EvaluationMode,
    #[serde(default)]
    pub rulesets: Vec<RuleSet>,
    pub default: DefaultClause,
}

impl WorkflowDocument {
    pub fn new(name: impl Into<String>, default: DefaultClause) -> Self {
        Self {
            name: name.into(),
            evaluation_mode: EvaluationMode::Single,
            rulesets: Vec::new(),
            default,
        }
    }

    pub fn with_mode(mut self, mode: EvaluationMode) -> Self {
        self.evaluation_mode = mode;
        self
    }

    pub fn with_ruleset(mut self, ruleset: RuleSet) -> Self {
        self.rulesets.push(ruleset);
        self
    }

    /// 文档中规则总数
    pub fn rule_count(&self) -> usize {
        self.rulesets.iter().map(|rs| rs.rules.len()).sum()
    }
}

/// 规则集：可选守卫条件 + 有序规则
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSet {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Expr>,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            condition: None,
            rules: Vec::new(),
        }
    }

    pub fn with_condition(mut self, condition: Expr) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    pub condition: Expr,
    pub outcome: Outcome,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<ActionCallNode>,
}

impl Rule {
    pub fn new(name: impl Into<String>, condition: Expr, outcome: Outcome) -> Self {
        Self {
            name: name.into(),
            condition,
            outcome,
            actions: Vec::new(),
        }
    }

    pub fn with_action(mut self, action: ActionCallNode) -> Self {
        self.actions.push(action);
        self
    }
}

/// 规则结果：字面状态或表达式
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    State(String),
    Expr(Expr),
}

impl Outcome {
    pub fn state(s: impl Into<String>) -> Self {
        Self::State(s.into())
    }
}

/// 默认子句
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultClause {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<ActionCallNode>,
}

impl DefaultClause {
    pub fn state(s: impl Into<String>) -> Self {
        Self {
            outcome: Some(Outcome::state(s)),
            actions: Vec::new(),
        }
    }
}

/// 动作调用节点（参数保持声明顺序）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionCallNode {
    pub name: String,
    #[serde(default)]
    pub params: Vec<ActionParam>,
}

impl ActionCallNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: Expr) -> Self {
        self.params.push(ActionParam {
            key: key.into(),
            value,
        });
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionParam {
    pub key: String,
    pub value: Expr,
}

/// 已解析的动作参数，键值均为字符串，保持声明顺序
///
/// 序列化为 JSON 对象。重复的键覆盖原值并保留首次出现的位置。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionParams(Vec<(String, String)>);

impl ActionParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ActionParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

impl Serialize for ActionParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ActionParams {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ParamsVisitor;

        impl<'de> Visitor<'de> for ParamsVisitor {
            type Value = ActionParams;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of string parameters")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<ActionParams, A::Error> {
                let mut params = ActionParams::new();
                while let Some((key, value)) = access.next_entry::<String, String>()? {
                    params.insert(key, value);
                }
                Ok(params)
            }
        }

        deserializer.deserialize_map(ParamsVisitor)
    }
}

/// 解析完成的动作调用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionCall {
    pub name: String,
    pub params: ActionParams,
}

/// 多匹配模式下的单条命中记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedRule {
    pub ruleset_id: String,
    pub rule_id: String,
    pub result: String,
    pub action_calls: Vec<ActionCall>,
}

/// 评估结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub workflow: String,
    pub ruleset_id: String,
    pub rule_id: String,
    pub result: String,
    pub action_calls: Vec<ActionCall>,
    pub warnings: BTreeSet<String>,
    pub error: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matched_rules: Vec<MatchedRule>,
}

impl Decision {
    pub const DEFAULT_ID: &'static str = "default";

    pub fn is_default(&self) -> bool {
        self.ruleset_id == Self::DEFAULT_ID && self.rule_id == Self::DEFAULT_ID
    }

    /// 按动作名称分组的派生视图
    ///
    /// 有序的 `action_calls` 是唯一数据源；同名动作按出现顺序归入同一组。
    pub fn actions_by_name(&self) -> HashMap<&str, Vec<&ActionParams>> {
        let mut grouped: HashMap<&str, Vec<&ActionParams>> = HashMap::new();
        for call in &self.action_calls {
            grouped.entry(call.name.as_str()).or_default().push(&call.params);
        }
        grouped
    }
}
