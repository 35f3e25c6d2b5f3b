//! 日期函数：解析、加减、差值与星期

use crate::error::{Result, RuleError};
use crate::value::Value;
use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, TimeDelta, TimeZone,
};
use std::str::FromStr;

/// 日期运算支持的时间单位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateUnit {
    Day,
    Hour,
    Minute,
}

impl DateUnit {
    fn delta(self, amount: i64) -> Option<TimeDelta> {
        match self {
            Self::Day => TimeDelta::try_days(amount),
            Self::Hour => TimeDelta::try_hours(amount),
            Self::Minute => TimeDelta::try_minutes(amount),
        }
    }

    fn seconds(self) -> i64 {
        match self {
            Self::Day => 86_400,
            Self::Hour => 3_600,
            Self::Minute => 60,
        }
    }
}

impl FromStr for DateUnit {
    type Err = RuleError;

    /// 单位名不区分大小写，允许复数形式
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().trim_end_matches('s') {
            "day" => Ok(Self::Day),
            "hour" => Ok(Self::Hour),
            "minute" => Ok(Self::Minute),
            _ => Err(RuleError::InvalidArgument(format!(
                "unsupported date unit '{}', expected day, hour or minute",
                s
            ))),
        }
    }
}

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// 解析日期文本
///
/// 依次尝试 RFC 3339、带偏移的 ISO 形式（允许省略秒）、不带偏移的形式以及纯日期；
/// 不带偏移的文本使用 `default_offset`。
pub fn parse_datetime(text: &str, default_offset: FixedOffset) -> Result<DateTime<FixedOffset>> {
    let trimmed = text.trim();
    let normalized = match trimmed.strip_suffix('Z').or_else(|| trimmed.strip_suffix('z')) {
        Some(prefix) => format!("{}+00:00", prefix),
        None => trimmed.to_string(),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Ok(dt);
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, format) {
            return Ok(dt);
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, format)
            && let Some(dt) = default_offset.from_local_datetime(&naive).single()
        {
            return Ok(dt);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        && let Some(dt) = date
            .and_hms_opt(0, 0, 0)
            .and_then(|naive| default_offset.from_local_datetime(&naive).single())
    {
        return Ok(dt);
    }

    Err(RuleError::InvalidArgument(format!(
        "cannot parse date '{}'",
        text
    )))
}

/// 把运行时值转换为时间
pub fn to_instant(value: &Value, default_offset: FixedOffset) -> Result<DateTime<FixedOffset>> {
    match value {
        Value::Instant(dt) => Ok(*dt),
        Value::Text(s) => parse_datetime(s, default_offset),
        other => Err(RuleError::TypeComparison(format!(
            "expected a date, got {}",
            other.type_name()
        ))),
    }
}

/// 日期加上若干单位（负数即减去）
pub fn add(date: DateTime<FixedOffset>, unit: DateUnit, amount: i64) -> Result<DateTime<FixedOffset>> {
    unit.delta(amount)
        .and_then(|delta| date.checked_add_signed(delta))
        .ok_or_else(|| {
            RuleError::InvalidArgument(format!("date arithmetic overflow: {} {:?}", amount, unit))
        })
}

/// `to - from` 的整单位数（向零截断）
pub fn diff(unit: DateUnit, from: DateTime<FixedOffset>, to: DateTime<FixedOffset>) -> i64 {
    (to - from).num_seconds() / unit.seconds()
}

/// ISO 星期编号，周一为 1
pub fn day_of_week(date: DateTime<FixedOffset>) -> u32 {
    date.weekday().number_from_monday()
}
