//! 表达式语法树
//!
//! 前端（文本语法解析器）产出的语法树以 JSON 形式交给引擎，每种节点对应 [`Expr`] 的一个变体。
//! 节点集合是封闭的，求值器对其做穷尽匹配。

use crate::operators::{
    AggregateMode, ArithmeticOperator, Comparator, MembershipOperator, SimilarityFunction,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// 属性路径限定符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Qualifier {
    /// 始终从原始请求数据解析
    Root,
    /// 当前列表元素（仅在逐元素谓词中有效）
    Elem,
}

/// 属性路径，如 `user.profile.age`、`elem.field1`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyPath {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<Qualifier>,
    #[serde(default)]
    pub segments: Vec<String>,
}

impl PropertyPath {
    pub fn new(qualifier: Option<Qualifier>, path: &str) -> Self {
        let segments = path
            .split('.')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            qualifier,
            segments,
        }
    }

    pub fn first_segment(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }

    /// 不含限定符的点号路径
    pub fn dotted(&self) -> String {
        self.segments.join(".")
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.qualifier {
            Some(Qualifier::Root) => write!(f, ".{}", self.dotted()),
            Some(Qualifier::Elem) if self.segments.is_empty() => write!(f, "elem"),
            Some(Qualifier::Elem) => write!(f, "elem.{}", self.dotted()),
            None => write!(f, "{}", self.dotted()),
        }
    }
}

/// 表达式节点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Expr {
    Literal {
        value: JsonValue,
    },
    Property(PropertyPath),
    Compare {
        op: Comparator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    And {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Or {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Not {
        operand: Box<Expr>,
    },
    Arithmetic {
        op: ArithmeticOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Parenthesis {
        inner: Box<Expr>,
    },
    List {
        items: Vec<Expr>,
    },
    Tuple {
        items: Vec<Expr>,
    },
    /// `list('name')`：评估时提供的命名列表
    StoredList {
        name: String,
    },
    Membership {
        op: MembershipOperator,
        value: Box<Expr>,
        collection: Box<Expr>,
    },
    /// `path.any { ... }` / `.all` / `.none`
    Aggregate {
        mode: AggregateMode,
        target: Box<Expr>,
        predicate: Box<Expr>,
    },
    /// `evalInList('name', predicate)`
    EvalInList {
        list: String,
        predicate: Box<Expr>,
    },
    Now,
    Date {
        value: Box<Expr>,
    },
    DateAdd {
        date: Box<Expr>,
        unit: String,
        amount: Box<Expr>,
    },
    DateSubtract {
        date: Box<Expr>,
        unit: String,
        amount: Box<Expr>,
    },
    DateDiff {
        unit: String,
        from: Box<Expr>,
        to: Box<Expr>,
    },
    DayOfWeek {
        date: Box<Expr>,
    },
    GeohashEncode {
        lat: Box<Expr>,
        lon: Box<Expr>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        precision: Option<Box<Expr>>,
    },
    GeohashDecode {
        hash: Box<Expr>,
    },
    Distance {
        lat1: Box<Expr>,
        lon1: Box<Expr>,
        lat2: Box<Expr>,
        lon2: Box<Expr>,
    },
    GeohashDistance {
        hash1: Box<Expr>,
        hash2: Box<Expr>,
    },
    WithinRadius {
        lat1: Box<Expr>,
        lon1: Box<Expr>,
        lat2: Box<Expr>,
        lon2: Box<Expr>,
        radius: Box<Expr>,
    },
    Similarity {
        function: SimilarityFunction,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Regex {
        value: Box<Expr>,
        pattern: Box<Expr>,
    },
}

impl Expr {
    pub fn literal(value: impl Into<JsonValue>) -> Self {
        Self::Literal {
            value: value.into(),
        }
    }

    pub fn text(s: &str) -> Self {
        Self::literal(s)
    }

    pub fn number(n: f64) -> Self {
        Self::literal(n)
    }

    pub fn boolean(b: bool) -> Self {
        Self::literal(b)
    }

    pub fn null() -> Self {
        Self::literal(JsonValue::Null)
    }

    /// 普通属性路径（当前作用域优先，回退到外层作用域）
    pub fn path(path: &str) -> Self {
        Self::Property(PropertyPath::new(None, path))
    }

    /// 根限定路径
    pub fn root_path(path: &str) -> Self {
        Self::Property(PropertyPath::new(Some(Qualifier::Root), path))
    }

    /// `elem` 限定路径；空串表示元素本身
    pub fn elem(path: &str) -> Self {
        Self::Property(PropertyPath::new(Some(Qualifier::Elem), path))
    }

    pub fn compare(op: Comparator, left: Expr, right: Expr) -> Self {
        Self::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn and(left: Expr, right: Expr) -> Self {
        Self::And {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn or(left: Expr, right: Expr) -> Self {
        Self::Or {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn not(operand: Expr) -> Self {
        Self::Not {
            operand: Box::new(operand),
        }
    }

    pub fn arithmetic(op: ArithmeticOperator, left: Expr, right: Expr) -> Self {
        Self::Arithmetic {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn list(items: Vec<Expr>) -> Self {
        Self::List { items }
    }

    pub fn tuple(items: Vec<Expr>) -> Self {
        Self::Tuple { items }
    }

    pub fn stored_list(name: &str) -> Self {
        Self::StoredList {
            name: name.to_string(),
        }
    }

    pub fn membership(op: MembershipOperator, value: Expr, collection: Expr) -> Self {
        Self::Membership {
            op,
            value: Box::new(value),
            collection: Box::new(collection),
        }
    }

    pub fn aggregate(mode: AggregateMode, target: Expr, predicate: Expr) -> Self {
        Self::Aggregate {
            mode,
            target: Box::new(target),
            predicate: Box::new(predicate),
        }
    }

    pub fn eval_in_list(list: &str, predicate: Expr) -> Self {
        Self::EvalInList {
            list: list.to_string(),
            predicate: Box::new(predicate),
        }
    }

    pub fn date(value: Expr) -> Self {
        Self::Date {
            value: Box::new(value),
        }
    }

    /// 节点类型名称（用于日志与故障信息）
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Literal { .. } => "literal",
            Self::Property(_) => "property",
            Self::Compare { .. } => "compare",
            Self::And { .. } => "and",
            Self::Or { .. } => "or",
            Self::Not { .. } => "not",
            Self::Arithmetic { .. } => "arithmetic",
            Self::Parenthesis { .. } => "parenthesis",
            Self::List { .. } => "list",
            Self::Tuple { .. } => "tuple",
            Self::StoredList { .. } => "stored_list",
            Self::Membership { .. } => "membership",
            Self::Aggregate { .. } => "aggregate",
            Self::EvalInList { .. } => "eval_in_list",
            Self::Now => "now",
            Self::Date { .. } => "date",
            Self::DateAdd { .. } => "date_add",
            Self::DateSubtract { .. } => "date_subtract",
            Self::DateDiff { .. } => "date_diff",
            Self::DayOfWeek { .. } => "day_of_week",
            Self::GeohashEncode { .. } => "geohash_encode",
            Self::GeohashDecode { .. } => "geohash_decode",
            Self::Distance { .. } => "distance",
            Self::GeohashDistance { .. } => "geohash_distance",
            Self::WithinRadius { .. } => "within_radius",
            Self::Similarity { .. } => "similarity",
            Self::Regex { .. } => "regex",
        }
    }

    /// 直接子节点
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Self::Literal { .. } | Self::Property(_) | Self::StoredList { .. } | Self::Now => {
                Vec::new()
            }
            Self::Compare { left, right, .. }
            | Self::And { left, right }
            | Self::Or { left, right }
            | Self::Arithmetic { left, right, .. }
            | Self::Similarity { left, right, .. } => vec![left, right],
            Self::Not { operand } => vec![operand],
            Self::Parenthesis { inner } => vec![inner],
            Self::List { items } | Self::Tuple { items } => items.iter().collect(),
            Self::Membership {
                value, collection, ..
            } => vec![value, collection],
            Self::Aggregate {
                target, predicate, ..
            } => vec![target, predicate],
            Self::EvalInList { predicate, .. } => vec![predicate],
            Self::Date { value } => vec![value],
            Self::DateAdd { date, amount, .. } | Self::DateSubtract { date, amount, .. } => {
                vec![date, amount]
            }
            Self::DateDiff { from, to, .. } => vec![from, to],
            Self::DayOfWeek { date } => vec![date],
            Self::GeohashEncode {
                lat,
                lon,
                precision,
            } => {
                let mut children: Vec<&Expr> = vec![lat, lon];
                if let Some(p) = precision {
                    children.push(p);
                }
                children
            }
            Self::GeohashDecode { hash } => vec![hash],
            Self::Distance {
                lat1,
                lon1,
                lat2,
                lon2,
            } => vec![lat1, lon1, lat2, lon2],
            Self::GeohashDistance { hash1, hash2 } => vec![hash1, hash2],
            Self::WithinRadius {
                lat1,
                lon1,
                lat2,
                lon2,
                radius,
            } => vec![lat1, lon1, lat2, lon2, radius],
            Self::Regex { value, pattern } => vec![value, pattern],
        }
    }
}
