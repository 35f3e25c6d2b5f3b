//! 内置函数库

pub mod date;
pub mod geo;
pub mod pattern;
pub mod similarity;

use crate::error::{Result, RuleError};
use crate::value::{Value, format_number};

/// 数值参数
pub(crate) fn number_arg(value: &Value, function: &str) -> Result<f64> {
    value.as_number().ok_or_else(|| {
        RuleError::TypeComparison(format!(
            "{} expects a number, got {}",
            function,
            value.type_name()
        ))
    })
}

/// 文本参数（数字按字符串形式参与）
pub(crate) fn text_arg(value: &Value, function: &str) -> Result<String> {
    match value {
        Value::Text(s) => Ok(s.clone()),
        Value::Number(n) => Ok(format_number(*n)),
        other => Err(RuleError::TypeComparison(format!(
            "{} expects a string, got {}",
            function,
            other.type_name()
        ))),
    }
}
