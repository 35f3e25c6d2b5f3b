//! 运行时值模型
//!
//! 每次表达式求值产生且仅产生一个 [`Value`]。请求数据中的 JSON 在读取时转换为运行时值，
//! 对象保持为 [`Value::Mapping`]，以便列表元素按字段名暴露给谓词。

use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

/// 运行时值
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Number(f64),
    Text(String),
    Bool(bool),
    Instant(DateTime<FixedOffset>),
    Sequence(Vec<Value>),
    Tuple(Vec<Value>),
    Mapping(Map<String, JsonValue>),
}

impl Value {
    /// 从 JSON 转换（对象保留字段声明顺序）
    pub fn from_json(json: &JsonValue) -> Self {
        match json {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Bool(*b),
            JsonValue::Number(n) => n.as_f64().map(Self::Number).unwrap_or(Self::Null),
            JsonValue::String(s) => Self::Text(s.clone()),
            JsonValue::Array(arr) => Self::Sequence(arr.iter().map(Self::from_json).collect()),
            JsonValue::Object(map) => Self::Mapping(map.clone()),
        }
    }

    /// 获取值的类型名称
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Number(_) => "number",
            Self::Text(_) => "string",
            Self::Bool(_) => "boolean",
            Self::Instant(_) => "datetime",
            Self::Sequence(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Mapping(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// 条件结果只有 `Bool(true)` 视为命中
    pub fn is_true(&self) -> bool {
        matches!(self, Self::Bool(true))
    }

    /// 序列或元组的元素
    pub fn items(&self) -> Option<&[Value]> {
        match self {
            Self::Sequence(items) | Self::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// 比较中使用的规范字符串形式；`Null` 视为空串
    pub fn canonical_string(&self) -> String {
        match self {
            Self::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// 尝试把文本解析为浮点数（前后空白忽略，空串不是数字）
///
/// `inf`、`nan` 等非有限值不算数字，按普通文本处理。
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// 整数值不输出小数部分
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Number(n) => write!(f, "{}", format_number(*n)),
            Self::Text(s) => write!(f, "{}", s),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Instant(dt) => write!(f, "{}", dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Self::Sequence(items) => {
                write!(f, "[")?;
                write_items(f, items)?;
                write!(f, "]")
            }
            Self::Tuple(items) => {
                write!(f, "(")?;
                write_items(f, items)?;
                write!(f, ")")
            }
            Self::Mapping(map) => write!(f, "{}", JsonValue::Object(map.clone())),
        }
    }
}

impl From<&JsonValue> for Value {
    fn from(json: &JsonValue) -> Self {
        Self::from_json(json)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}
