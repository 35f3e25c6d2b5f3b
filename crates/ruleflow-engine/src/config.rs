//! 引擎配置
//!
//! 支持配置文件加载与环境变量覆盖，未提供的配置项使用默认值。

use crate::error::Result;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// geohash 精度上限
pub const MAX_GEOHASH_PRECISION: usize = 12;

/// 评估引擎配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 不带时区信息的日期字符串所使用的 UTC 偏移（秒）
    pub default_utc_offset_seconds: i32,
    /// `geohash_encode` 未指定精度时的默认精度
    pub geohash_precision: usize,
    /// 正则表达式编译后的大小上限（字节）
    pub regex_size_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_utc_offset_seconds: 0,
            geohash_precision: MAX_GEOHASH_PRECISION,
            regex_size_limit: 1024 * 1024,
        }
    }
}

impl EngineConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. 内置默认值
    /// 2. {RULEFLOW_CONFIG_DIR 或 config}/ruleflow.toml（可选）
    /// 3. 环境变量（RULEFLOW_ 前缀，如 RULEFLOW_GEOHASH_PRECISION -> geohash_precision）
    pub fn load() -> Result<Self> {
        let config_dir =
            std::env::var("RULEFLOW_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
        Self::load_from_dir(&config_dir)
    }

    /// 从指定目录加载配置
    pub fn load_from_dir(config_dir: impl AsRef<Path>) -> Result<Self> {
        let defaults = Self::default();

        let builder = Config::builder()
            .set_default(
                "default_utc_offset_seconds",
                i64::from(defaults.default_utc_offset_seconds),
            )?
            .set_default("geohash_precision", defaults.geohash_precision as u64)?
            .set_default("regex_size_limit", defaults.regex_size_limit as u64)?
            .add_source(File::from(config_dir.as_ref().join("ruleflow.toml")).required(false))
            .add_source(Environment::with_prefix("RULEFLOW").try_parsing(true));

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> std::result::Result<(), ConfigError> {
        if !(1..=MAX_GEOHASH_PRECISION).contains(&self.geohash_precision) {
            return Err(ConfigError::Message(format!(
                "geohash_precision must be between 1 and {}, got {}",
                MAX_GEOHASH_PRECISION, self.geohash_precision
            )));
        }
        // chrono 的 FixedOffset 只接受 ±24 小时以内
        if self.default_utc_offset_seconds.abs() >= 86_400 {
            return Err(ConfigError::Message(format!(
                "default_utc_offset_seconds out of range: {}",
                self.default_utc_offset_seconds
            )));
        }
        Ok(())
    }
}
