//! Ruleflow 规则语言评估引擎
//!
//! 提供工作流文档的评估能力，支持：
//! - JSON 形式的工作流文档（规则集、规则、默认子句）
//! - 动态类型值模型与类型转换比较
//! - 作用域链属性解析（含 `elem` 元素作用域）
//! - 日期、地理、字符串相似度与正则内置函数
//! - 单匹配/多匹配策略与规则级故障隔离
//! - 工作流加载校验与字段提取

pub mod actions;
pub mod ast;
pub mod clock;
pub mod comparator;
pub mod config;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod functions;
pub mod loader;
pub mod metrics;
pub mod models;
pub mod operators;
pub mod value;

pub use ast::{Expr, PropertyPath, Qualifier};
pub use clock::{Clock, FixedClock, SystemClock};
pub use comparator::ValueComparator;
pub use config::EngineConfig;
pub use context::EvaluationContext;
pub use error::{Result, RuleError, Severity};
pub use evaluator::ExpressionEvaluator;
pub use executor::{WorkflowExecutor, evaluate};
pub use loader::{LoadedWorkflow, WorkflowLoader};
pub use models::{
    ActionCall, ActionCallNode, ActionParam, ActionParams, Decision, DefaultClause, EvaluationMode, MatchedRule,
    NamedLists, Outcome, Rule, RuleSet, WorkflowDocument,
};
pub use operators::{
    AggregateMode, ArithmeticOperator, Comparator, MembershipOperator, SimilarityFunction,
};
pub use value::Value;
