//! 表达式求值器
//!
//! 对语法树做递归求值，每个节点产生一个 [`Value`] 或一个故障。

use crate::ast::Expr;
use crate::comparator::ValueComparator;
use crate::context::EvaluationContext;
use crate::error::{Result, RuleError};
use crate::functions::date::{self, DateUnit};
use crate::functions::{geo, number_arg, pattern, similarity, text_arg};
use crate::operators::{AggregateMode, ArithmeticOperator, SimilarityFunction};
use crate::value::{Value, parse_number};
use chrono::{DateTime, FixedOffset};
use tracing::{debug, warn};

/// 表达式求值器
pub struct ExpressionEvaluator;

impl ExpressionEvaluator {
    /// 求值表达式
    pub fn evaluate(expr: &Expr, ctx: &EvaluationContext<'_>) -> Result<Value> {
        match expr {
            Expr::Literal { value } => Ok(Value::from_json(value)),
            Expr::Property(path) => ctx.resolve(path),
            Expr::Compare { op, left, right } => {
                let l = Self::evaluate(left, ctx)?;
                let r = Self::evaluate(right, ctx)?;
                ValueComparator::compare(&l, *op, &r).map(Value::Bool)
            }
            Expr::And { left, right } => {
                // 短路：左侧为 false 时不再求值右侧
                if !Self::boolean(left, ctx, "and")? {
                    return Ok(Value::Bool(false));
                }
                Self::boolean(right, ctx, "and").map(Value::Bool)
            }
            Expr::Or { left, right } => {
                if Self::boolean(left, ctx, "or")? {
                    return Ok(Value::Bool(true));
                }
                Self::boolean(right, ctx, "or").map(Value::Bool)
            }
            Expr::Not { operand } => Self::boolean(operand, ctx, "not").map(|b| Value::Bool(!b)),
            Expr::Arithmetic { op, left, right } => Self::arithmetic(*op, left, right, ctx),
            Expr::Parenthesis { inner } => Self::evaluate(inner, ctx),
            Expr::List { items } => Self::evaluate_all(items, ctx).map(Value::Sequence),
            Expr::Tuple { items } => Self::evaluate_all(items, ctx).map(Value::Tuple),
            Expr::StoredList { name } => Ok(Self::stored_list(name, ctx)),
            Expr::Membership {
                op,
                value,
                collection,
            } => {
                let subject = Self::evaluate(value, ctx)?;
                let candidates = Self::evaluate(collection, ctx)?;
                ValueComparator::membership(*op, &subject, &candidates).map(Value::Bool)
            }
            Expr::Aggregate {
                mode,
                target,
                predicate,
            } => Self::aggregate(*mode, target, predicate, ctx).map(Value::Bool),
            Expr::EvalInList { list, predicate } => {
                Ok(Value::Bool(Self::eval_in_list(list, predicate, ctx)))
            }
            Expr::Now => Ok(Value::Instant(ctx.clock().now())),
            Expr::Date { value } => {
                let raw = Self::evaluate(value, ctx)?;
                let instant = date::to_instant(&raw, Self::default_offset(ctx)?)?;
                debug!("日期解析: {} => {}", raw, instant);
                Ok(Value::Instant(instant))
            }
            Expr::DateAdd {
                date: base,
                unit,
                amount,
            } => Self::date_shift(base, unit, amount, 1, ctx).map(Value::Instant),
            Expr::DateSubtract {
                date: base,
                unit,
                amount,
            } => Self::date_shift(base, unit, amount, -1, ctx).map(Value::Instant),
            Expr::DateDiff { unit, from, to } => {
                let unit: DateUnit = unit.parse()?;
                let from = Self::instant(from, ctx)?;
                let to = Self::instant(to, ctx)?;
                let result = date::diff(unit, from, to);
                debug!("dateDiff({:?}, {}, {}) => {}", unit, from, to, result);
                Ok(Value::Number(result as f64))
            }
            Expr::DayOfWeek { date: value } => {
                let instant = Self::instant(value, ctx)?;
                Ok(Value::Number(f64::from(date::day_of_week(instant))))
            }
            Expr::GeohashEncode {
                lat,
                lon,
                precision,
            } => {
                let lat = Self::number(lat, ctx, "geohash_encode")?;
                let lon = Self::number(lon, ctx, "geohash_encode")?;
                let precision = match precision {
                    Some(p) => Self::precision(p, ctx)?,
                    None => ctx.config().geohash_precision,
                };
                let hash = geo::geohash_encode(lat, lon, precision)?;
                debug!("geohash_encode({}, {}, {}) => {}", lat, lon, precision, hash);
                Ok(Value::Text(hash))
            }
            Expr::GeohashDecode { hash } => {
                let hash = text_arg(&Self::evaluate(hash, ctx)?, "geohash_decode")?;
                let (lat, lon) = geo::geohash_decode(&hash)?;
                debug!("geohash_decode({}) => ({}, {})", hash, lat, lon);
                Ok(Value::Tuple(vec![Value::Number(lat), Value::Number(lon)]))
            }
            Expr::Distance {
                lat1,
                lon1,
                lat2,
                lon2,
            } => {
                let result = geo::distance(
                    Self::number(lat1, ctx, "distance")?,
                    Self::number(lon1, ctx, "distance")?,
                    Self::number(lat2, ctx, "distance")?,
                    Self::number(lon2, ctx, "distance")?,
                );
                debug!("distance => {} km", result);
                Ok(Value::Number(result))
            }
            Expr::GeohashDistance { hash1, hash2 } => {
                let h1 = text_arg(&Self::evaluate(hash1, ctx)?, "distance")?;
                let h2 = text_arg(&Self::evaluate(hash2, ctx)?, "distance")?;
                let result = geo::geohash_distance(&h1, &h2)?;
                debug!("distance({}, {}) => {} km", h1, h2, result);
                Ok(Value::Number(result))
            }
            Expr::WithinRadius {
                lat1,
                lon1,
                lat2,
                lon2,
                radius,
            } => {
                let result = geo::within_radius(
                    Self::number(lat1, ctx, "within_radius")?,
                    Self::number(lon1, ctx, "within_radius")?,
                    Self::number(lat2, ctx, "within_radius")?,
                    Self::number(lon2, ctx, "within_radius")?,
                    Self::number(radius, ctx, "within_radius")?,
                );
                debug!("within_radius => {}", result);
                Ok(Value::Bool(result))
            }
            Expr::Similarity {
                function,
                left,
                right,
            } => Self::similarity(*function, left, right, ctx),
            Expr::Regex {
                value,
                pattern: pattern_expr,
            } => {
                let subject = Self::evaluate(value, ctx)?;
                if subject.is_null() {
                    return Ok(Value::Bool(false));
                }
                let text = text_arg(&subject, "regex")?;
                let regex = text_arg(&Self::evaluate(pattern_expr, ctx)?, "regex")?;
                pattern::matches(&text, &regex, ctx.config().regex_size_limit).map(Value::Bool)
            }
        }
    }

    /// 条件是否成立（只有 `true` 视为成立）
    pub fn evaluate_condition(expr: &Expr, ctx: &EvaluationContext<'_>) -> Result<bool> {
        Ok(Self::evaluate(expr, ctx)?.is_true())
    }

    fn evaluate_all(items: &[Expr], ctx: &EvaluationContext<'_>) -> Result<Vec<Value>> {
        items.iter().map(|item| Self::evaluate(item, ctx)).collect()
    }

    fn boolean(expr: &Expr, ctx: &EvaluationContext<'_>, operator: &str) -> Result<bool> {
        let value = Self::evaluate(expr, ctx)?;
        value.as_bool().ok_or_else(|| {
            RuleError::InvalidArgument(format!(
                "{} expects boolean operands, got {}",
                operator,
                value.type_name()
            ))
        })
    }

    fn number(expr: &Expr, ctx: &EvaluationContext<'_>, function: &str) -> Result<f64> {
        number_arg(&Self::evaluate(expr, ctx)?, function)
    }

    fn instant(expr: &Expr, ctx: &EvaluationContext<'_>) -> Result<DateTime<FixedOffset>> {
        date::to_instant(&Self::evaluate(expr, ctx)?, Self::default_offset(ctx)?)
    }

    fn default_offset(ctx: &EvaluationContext<'_>) -> Result<FixedOffset> {
        let seconds = ctx.config().default_utc_offset_seconds;
        FixedOffset::east_opt(seconds).ok_or_else(|| {
            RuleError::InvalidArgument(format!("invalid default utc offset: {}", seconds))
        })
    }

    fn precision(expr: &Expr, ctx: &EvaluationContext<'_>) -> Result<usize> {
        let raw = Self::number(expr, ctx, "geohash_encode")?;
        if !raw.is_finite() || raw < 1.0 {
            return Err(RuleError::InvalidArgument(format!(
                "invalid geohash precision: {}",
                raw
            )));
        }
        Ok(raw as usize)
    }

    fn arithmetic(
        op: ArithmeticOperator,
        left: &Expr,
        right: &Expr,
        ctx: &EvaluationContext<'_>,
    ) -> Result<Value> {
        let l = Self::evaluate(left, ctx)?;
        let r = Self::evaluate(right, ctx)?;
        let (a, b) = match (Self::numeric(&l), Self::numeric(&r)) {
            (Some(a), Some(b)) => (a, b),
            _ => {
                return Err(RuleError::TypeComparison(format!(
                    "cannot apply {} to {} and {}",
                    op,
                    l.type_name(),
                    r.type_name()
                )));
            }
        };

        let result = match op {
            ArithmeticOperator::Add => a + b,
            ArithmeticOperator::Sub => a - b,
            ArithmeticOperator::Mul => a * b,
            ArithmeticOperator::Div => {
                if b == 0.0 {
                    return Err(RuleError::InvalidArgument("division by zero".to_string()));
                }
                a / b
            }
        };
        Ok(Value::Number(result))
    }

    fn numeric(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => Some(*n),
            Value::Text(s) => parse_number(s),
            _ => None,
        }
    }

    fn stored_list(name: &str, ctx: &EvaluationContext<'_>) -> Value {
        match ctx.named_list(name) {
            Some(items) => Value::Sequence(items.iter().map(Value::from_json).collect()),
            None => {
                debug!("命名列表不存在，按空列表处理: {}", name);
                Value::Sequence(Vec::new())
            }
        }
    }

    fn aggregate(
        mode: AggregateMode,
        target: &Expr,
        predicate: &Expr,
        ctx: &EvaluationContext<'_>,
    ) -> Result<bool> {
        let collection = Self::evaluate(target, ctx)?;
        let Some(items) = collection.items() else {
            let name = match target {
                Expr::Property(path) => path.to_string(),
                other => other.kind().to_string(),
            };
            return Err(RuleError::PropertyNotFound(format!(
                "{} field is not a list",
                name
            )));
        };

        let result = match mode {
            AggregateMode::Any => Self::any_matches(items, predicate, ctx)?,
            AggregateMode::None => !Self::any_matches(items, predicate, ctx)?,
            AggregateMode::All => {
                let mut all = true;
                for item in items {
                    if !Self::item_matches(item, predicate, ctx)? {
                        all = false;
                        break;
                    }
                }
                all
            }
        };
        debug!("列表聚合 {}: {} 个元素 => {}", mode, items.len(), result);
        Ok(result)
    }

    fn any_matches(items: &[Value], predicate: &Expr, ctx: &EvaluationContext<'_>) -> Result<bool> {
        for item in items {
            if Self::item_matches(item, predicate, ctx)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// 单个元素是否满足谓词
    ///
    /// 基本类型元素遇到字面量谓词时直接与字面量比较；其余情况在元素作用域中求值谓词。
    fn item_matches(item: &Value, predicate: &Expr, ctx: &EvaluationContext<'_>) -> Result<bool> {
        if !matches!(item, Value::Mapping(_))
            && let Expr::Literal { value } = predicate
        {
            return Ok(ValueComparator::loose_eq(item, &Value::from_json(value)));
        }
        let scoped = ctx.with_item(item);
        Self::evaluate_condition(predicate, &scoped)
    }

    /// 对命名列表逐元素求值谓词，任一元素满足即为 true
    ///
    /// 列表不存在返回 false；单个元素求值失败视为不匹配，继续扫描。
    fn eval_in_list(list: &str, predicate: &Expr, ctx: &EvaluationContext<'_>) -> bool {
        let Some(items) = ctx.named_list(list) else {
            warn!("evalInList 引用的命名列表不存在: {}", list);
            return false;
        };

        for (index, json) in items.iter().enumerate() {
            let item = Value::from_json(json);
            let scoped = ctx.with_item(&item);
            match Self::evaluate_condition(predicate, &scoped) {
                Ok(true) => {
                    debug!("evalInList '{}' 第 {} 个元素命中", list, index);
                    return true;
                }
                Ok(false) => {}
                Err(e) => {
                    warn!("evalInList '{}' 第 {} 个元素求值失败: {}", list, index, e);
                }
            }
        }
        false
    }

    fn date_shift(
        date_expr: &Expr,
        unit: &str,
        amount: &Expr,
        sign: i64,
        ctx: &EvaluationContext<'_>,
    ) -> Result<DateTime<FixedOffset>> {
        let unit: DateUnit = unit.parse()?;
        let base = Self::instant(date_expr, ctx)?;
        let amount = Self::number(amount, ctx, "dateAdd")?;
        if !amount.is_finite() {
            return Err(RuleError::InvalidArgument(format!(
                "invalid date amount: {}",
                amount
            )));
        }
        let delta = sign * amount.trunc() as i64;
        let shifted = date::add(base, unit, delta)?;
        debug!("日期运算: {} {:+} {:?} => {}", base, delta, unit, shifted);
        Ok(shifted)
    }

    fn similarity(
        function: SimilarityFunction,
        left: &Expr,
        right: &Expr,
        ctx: &EvaluationContext<'_>,
    ) -> Result<Value> {
        let name = function.to_string();
        let a = text_arg(&Self::evaluate(left, ctx)?, &name)?;
        let b = text_arg(&Self::evaluate(right, ctx)?, &name)?;

        let result = match function {
            SimilarityFunction::StringDistance => similarity::levenshtein(&a, &b) as f64,
            SimilarityFunction::PartialRatio => f64::from(similarity::partial_ratio(&a, &b)),
            SimilarityFunction::TokenSortRatio => f64::from(similarity::token_sort_ratio(&a, &b)),
            SimilarityFunction::TokenSetRatio => f64::from(similarity::token_set_ratio(&a, &b)),
            SimilarityFunction::SimilarityScore => similarity::similarity_score(&a, &b),
        };
        debug!("{}('{}', '{}') => {}", name, a, b, result);
        Ok(Value::Number(result))
    }
}
