//! 值比较器
//!
//! 按运行时类型组合分派比较操作符，并提供列表成员检查所需的宽松相等。

use crate::error::{Result, RuleError};
use crate::operators::{Comparator, MembershipOperator};
use crate::value::{Value, format_number, parse_number};
use serde_json::Value as JsonValue;
use std::cmp::Ordering;
use tracing::debug;

/// 值比较器
pub struct ValueComparator;

impl ValueComparator {
    /// 比较两个值
    ///
    /// 类型组合按以下优先级处理：
    /// 1. `==` 总是忽略大小写比较两侧的规范字符串
    /// 2. 任一侧为 null：只有 `=`/`<>` 有意义，其余返回 false
    /// 3. 数字与数字：数值比较
    /// 4. 文本与文本：两侧都能解析为数字时按数值比较，否则按字典序
    /// 5. 布尔与布尔：`false < true`
    /// 6. 时间与时间：先比较时刻，再比较偏移
    /// 7. 文本与数字：文本能解析时按数值比较；否则 `=`/`<>` 退化为字符串比较，排序比较报错
    /// 8. 同类序列/元组/对象：仅支持 `=`/`<>`
    pub fn compare(left: &Value, op: Comparator, right: &Value) -> Result<bool> {
        let result = Self::compare_inner(left, op, right)?;
        debug!("比较: {} {} {} => {}", left, op, right, result);
        Ok(result)
    }

    fn compare_inner(left: &Value, op: Comparator, right: &Value) -> Result<bool> {
        if op == Comparator::EqIc {
            return Ok(left.canonical_string().to_lowercase()
                == right.canonical_string().to_lowercase());
        }

        if left.is_null() || right.is_null() {
            let both = left.is_null() && right.is_null();
            return Ok(match op {
                Comparator::Eq => both,
                Comparator::Ne => !both,
                _ => false,
            });
        }

        let ordering = match (left, right) {
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
            (Value::Text(a), Value::Text(b)) => match (parse_number(a), parse_number(b)) {
                (Some(x), Some(y)) => x.partial_cmp(&y),
                _ => Some(a.as_str().cmp(b.as_str())),
            },
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Instant(a), Value::Instant(b)) => Some(a.cmp(b).then_with(|| {
                a.offset()
                    .local_minus_utc()
                    .cmp(&b.offset().local_minus_utc())
            })),
            (Value::Text(s), Value::Number(n)) => {
                return Self::compare_text_number(s, *n, op, false);
            }
            (Value::Number(n), Value::Text(s)) => {
                return Self::compare_text_number(s, *n, op, true);
            }
            (Value::Sequence(a), Value::Sequence(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
                return Self::equality_only(left, op, right, Self::items_eq(a, b));
            }
            (Value::Mapping(a), Value::Mapping(b)) => {
                return Self::equality_only(left, op, right, a == b);
            }
            _ => return Err(Self::type_fault(left, op, right)),
        };

        // NaN 不参与排序
        let Some(ordering) = ordering else {
            return Ok(op == Comparator::Ne);
        };

        Ok(Self::apply(op, ordering))
    }

    fn compare_text_number(text: &str, n: f64, op: Comparator, swapped: bool) -> Result<bool> {
        match parse_number(text) {
            Some(parsed) => {
                let (a, b) = if swapped { (n, parsed) } else { (parsed, n) };
                Ok(a.partial_cmp(&b)
                    .map(|ordering| Self::apply(op, ordering))
                    .unwrap_or(op == Comparator::Ne))
            }
            None => {
                let equal = text == format_number(n);
                match op {
                    Comparator::Eq => Ok(equal),
                    Comparator::Ne => Ok(!equal),
                    _ => Err(RuleError::TypeComparison(format!(
                        "cannot order non-numeric string '{}' against number {} using {}",
                        text,
                        format_number(n),
                        op
                    ))),
                }
            }
        }
    }

    fn equality_only(left: &Value, op: Comparator, right: &Value, equal: bool) -> Result<bool> {
        match op {
            Comparator::Eq => Ok(equal),
            Comparator::Ne => Ok(!equal),
            _ => Err(Self::type_fault(left, op, right)),
        }
    }

    fn apply(op: Comparator, ordering: Ordering) -> bool {
        match op {
            Comparator::Eq | Comparator::EqIc => ordering == Ordering::Equal,
            Comparator::Ne => ordering != Ordering::Equal,
            Comparator::Lt => ordering == Ordering::Less,
            Comparator::Le => ordering != Ordering::Greater,
            Comparator::Gt => ordering == Ordering::Greater,
            Comparator::Ge => ordering != Ordering::Less,
        }
    }

    fn items_eq(a: &[Value], b: &[Value]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| Self::loose_eq(x, y))
    }

    fn type_fault(left: &Value, op: Comparator, right: &Value) -> RuleError {
        RuleError::TypeComparison(format!(
            "cannot compare {} with {} using {}",
            left.type_name(),
            right.type_name(),
            op
        ))
    }

    /// 宽松相等：比较失败视为不相等
    pub fn loose_eq(a: &Value, b: &Value) -> bool {
        Self::compare_inner(a, Comparator::Eq, b).unwrap_or(false)
    }

    /// 列表成员检查
    ///
    /// 候选集合中的对象元素按字段值参与匹配：标量与任一字段值相等即命中，
    /// 元组要求对象的字段值按声明顺序逐一相等。
    pub fn membership(op: MembershipOperator, subject: &Value, collection: &Value) -> Result<bool> {
        let result = match op {
            MembershipOperator::In => Self::in_collection(subject, collection),
            MembershipOperator::NotIn => !Self::in_collection(subject, collection),
            MembershipOperator::Contains => Self::contains(subject, collection)?,
            MembershipOperator::StartsWith => {
                Self::text_match(subject, collection, op, |s, c| s.starts_with(c))?
            }
            MembershipOperator::EndsWith => {
                Self::text_match(subject, collection, op, |s, c| s.ends_with(c))?
            }
        };
        debug!("成员检查: {} {} {} => {}", subject, op, collection, result);
        Ok(result)
    }

    fn in_collection(subject: &Value, collection: &Value) -> bool {
        match collection.items() {
            Some(items) => items.iter().any(|item| Self::candidate_matches(subject, item)),
            None => Self::candidate_matches(subject, collection),
        }
    }

    fn candidate_matches(subject: &Value, candidate: &Value) -> bool {
        match (subject, candidate) {
            (Value::Tuple(expected), Value::Mapping(map)) => {
                map.len() == expected.len()
                    && map
                        .values()
                        .zip(expected)
                        .all(|(v, e)| Self::loose_eq(&Value::from_json(v), e))
            }
            (_, Value::Mapping(map)) => map
                .values()
                .any(|v| Self::loose_eq(subject, &Value::from_json(v))),
            _ => Self::loose_eq(subject, candidate),
        }
    }

    fn contains(subject: &Value, collection: &Value) -> Result<bool> {
        match subject {
            Value::Sequence(items) | Value::Tuple(items) => {
                let wanted: Vec<&Value> = match collection {
                    Value::Sequence(c) => c.iter().collect(),
                    other => vec![other],
                };
                Ok(wanted
                    .iter()
                    .any(|w| items.iter().any(|item| Self::candidate_matches(w, item))))
            }
            _ => Self::text_match(subject, collection, MembershipOperator::Contains, |s, c| {
                s.contains(c)
            }),
        }
    }

    fn text_match<F>(
        subject: &Value,
        collection: &Value,
        op: MembershipOperator,
        matches: F,
    ) -> Result<bool>
    where
        F: Fn(&str, &str) -> bool,
    {
        let text = match subject {
            Value::Text(s) => s.clone(),
            Value::Number(n) => format_number(*n),
            Value::Null => return Ok(false),
            other => {
                return Err(RuleError::TypeComparison(format!(
                    "{} requires a string subject, got {}",
                    op,
                    other.type_name()
                )));
            }
        };

        Ok(Self::candidate_strings(collection)
            .iter()
            .any(|candidate| matches(&text, candidate)))
    }

    /// 候选字符串：对象元素展开为字段值，null 跳过
    fn candidate_strings(collection: &Value) -> Vec<String> {
        fn push_json(out: &mut Vec<String>, json: &JsonValue) {
            if !json.is_null() {
                out.push(Value::from_json(json).canonical_string());
            }
        }

        let mut out = Vec::new();
        let items: &[Value] = match collection.items() {
            Some(items) => items,
            None => std::slice::from_ref(collection),
        };
        for item in items {
            match item {
                Value::Null => {}
                Value::Mapping(map) => map.values().for_each(|v| push_json(&mut out, v)),
                other => out.push(other.canonical_string()),
            }
        }
        out
    }
}
