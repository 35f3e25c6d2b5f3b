//! 正则匹配（整串匹配）

use crate::error::{Result, RuleError};
use regex::{Regex, RegexBuilder};

/// 编译模式，自动锚定首尾
pub fn compile(pattern: &str, size_limit: usize) -> Result<Regex> {
    RegexBuilder::new(&format!("^(?:{})$", pattern))
        .size_limit(size_limit)
        .build()
        .map_err(|e| RuleError::InvalidArgument(format!("invalid regex '{}': {}", pattern, e)))
}

/// 文本是否整体匹配模式
pub fn matches(text: &str, pattern: &str, size_limit: usize) -> Result<bool> {
    Ok(compile(pattern, size_limit)?.is_match(text))
}
