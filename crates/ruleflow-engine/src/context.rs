//! 评估上下文与属性解析
//!
//! 上下文构成一条作用域链：根上下文持有请求数据，逐元素谓词在其上派生出元素作用域，
//! 元素作用域找不到的普通路径交给外层作用域继续解析。

use crate::ast::{PropertyPath, Qualifier};
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::error::{Result, RuleError};
use crate::models::NamedLists;
use crate::value::Value;
use serde_json::{Map, Value as JsonValue};

/// 当前作用域的数据来源
#[derive(Debug, Clone, Copy)]
enum Scope<'a> {
    Payload(&'a Map<String, JsonValue>),
    Item(&'a Value),
}

/// 评估上下文
///
/// 每次评估调用新建，不在调用之间共享。
pub struct EvaluationContext<'a> {
    scope: Scope<'a>,
    root: &'a Map<String, JsonValue>,
    lists: &'a NamedLists,
    parent: Option<&'a EvaluationContext<'a>>,
    clock: &'a dyn Clock,
    config: &'a EngineConfig,
}

impl<'a> EvaluationContext<'a> {
    /// 以请求数据构建根上下文
    pub fn new(
        payload: &'a Map<String, JsonValue>,
        lists: &'a NamedLists,
        clock: &'a dyn Clock,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            scope: Scope::Payload(payload),
            root: payload,
            lists,
            parent: None,
            clock,
            config,
        }
    }

    /// 派生元素作用域，当前上下文作为外层作用域
    pub fn with_item<'b>(&'b self, item: &'b Value) -> EvaluationContext<'b> {
        EvaluationContext {
            scope: Scope::Item(item),
            root: self.root,
            lists: self.lists,
            parent: Some(self),
            clock: self.clock,
            config: self.config,
        }
    }

    pub fn named_list(&self, name: &str) -> Option<&'a Vec<JsonValue>> {
        self.lists.get(name)
    }

    pub fn clock(&self) -> &'a dyn Clock {
        self.clock
    }

    pub fn config(&self) -> &'a EngineConfig {
        self.config
    }

    /// 当前是否处于元素作用域
    pub fn in_item_scope(&self) -> bool {
        matches!(self.scope, Scope::Item(_))
    }

    /// 解析属性路径
    pub fn resolve(&self, path: &PropertyPath) -> Result<Value> {
        match path.qualifier {
            Some(Qualifier::Root) => {
                if path.segments.is_empty() {
                    return Ok(Value::Mapping(self.root.clone()));
                }
                navigate_map(self.root, &path.segments)
            }
            Some(Qualifier::Elem) => match self.scope {
                Scope::Item(item) => navigate_item(item, &path.segments),
                Scope::Payload(_) => Err(RuleError::UnexpectedSymbol(format!(
                    "'{}' used outside of a list predicate",
                    path
                ))),
            },
            None => self.resolve_simple(path),
        }
    }

    fn resolve_simple(&self, path: &PropertyPath) -> Result<Value> {
        let Some(first) = path.first_segment() else {
            return Err(RuleError::UnexpectedSymbol("empty property path".to_string()));
        };

        match self.scope {
            Scope::Payload(map) => match (navigate_map(map, &path.segments), self.parent) {
                (Ok(value), _) => Ok(value),
                (Err(_), Some(parent)) => parent.resolve(path),
                (Err(e), None) => Err(e),
            },
            Scope::Item(item) => {
                if let Value::Mapping(map) = item
                    && map.contains_key(first)
                    && let Ok(value) = navigate_map(map, &path.segments)
                {
                    return Ok(value);
                }
                match self.parent {
                    Some(parent) => parent.resolve(path),
                    None => Err(RuleError::property_not_found(first)),
                }
            }
        }
    }
}

/// 逐段导航对象；遇到非对象值时提前返回该值
///
/// 值为 JSON `null` 的键与缺失的键同样视为找不到。
fn navigate_map(map: &Map<String, JsonValue>, segments: &[String]) -> Result<Value> {
    let Some((first, rest)) = segments.split_first() else {
        return Ok(Value::Mapping(map.clone()));
    };

    let mut current = present(map, first)?;

    for segment in rest {
        match current {
            JsonValue::Object(obj) => current = present(obj, segment)?,
            _ => break,
        }
    }

    Ok(Value::from_json(current))
}

fn present<'m>(map: &'m Map<String, JsonValue>, key: &str) -> Result<&'m JsonValue> {
    map.get(key)
        .filter(|value| !value.is_null())
        .ok_or_else(|| RuleError::property_not_found(key))
}

fn navigate_item(item: &Value, segments: &[String]) -> Result<Value> {
    if segments.is_empty() {
        return Ok(item.clone());
    }
    match item {
        Value::Mapping(map) => navigate_map(map, segments),
        _ => Err(RuleError::property_not_found(&segments[0])),
    }
}
