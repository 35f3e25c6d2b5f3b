//! 规则引擎错误类型
//!
//! 评估过程中的故障分为三类：可恢复（记录警告并跳过当前规则/规则集）、
//! 降级（记录警告并标记 `error=true`）以及致命（中止整个评估调用）。

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("{0}")]
    PropertyNotFound(String),

    #[error("{0}")]
    UnexpectedSymbol(String),

    #[error("{0}")]
    ActionParameterResolution(String),

    #[error("{0}")]
    TypeComparison(String),

    /// 未分类的运行时故障（参数类型错误、未知单位、除零等）
    #[error("{0}")]
    InvalidArgument(String),

    #[error("invalid workflow document: {0}")]
    InvalidDocument(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
}

/// 故障严重程度，决定解析引擎在规则/规则集边界上的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// 记录警告，跳过当前规则或规则集
    Recoverable,
    /// 记录警告并设置 `error=true`，跳过当前规则或规则集
    Degrading,
    /// 中止整个评估
    Fatal,
}

impl RuleError {
    pub fn property_not_found(segment: impl AsRef<str>) -> Self {
        Self::PropertyNotFound(format!("{} field cannot be found", segment.as_ref()))
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::PropertyNotFound(_)
            | Self::UnexpectedSymbol(_)
            | Self::ActionParameterResolution(_) => Severity::Recoverable,
            Self::TypeComparison(_) | Self::InvalidArgument(_) => Severity::Degrading,
            Self::InvalidDocument(_) | Self::Json(_) | Self::Config(_) => Severity::Fatal,
        }
    }

    pub fn is_type_comparison(&self) -> bool {
        matches!(self, Self::TypeComparison(_))
    }
}

pub type Result<T> = std::result::Result<T, RuleError>;
