//! 聚合请求与结果模型
//!
//! 包含分组粒度、时间范围、入站查询和出站结果的数据结构。

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AppError, Result};
use crate::models::record::BucketTotal;

/// 分桶标签格式（定宽，字典序即时间序）
pub const LABEL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// 无时区时间戳可接受的格式，按顺序尝试
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// 分组粒度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    Hour,
    Day,
    Month,
}

impl Granularity {
    pub const ALL: [Granularity; 3] = [Granularity::Hour, Granularity::Day, Granularity::Month];

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Hour => "hour",
            Granularity::Day => "day",
            Granularity::Month => "month",
        }
    }

    /// 存储端分组键格式，产出与 [`LABEL_FORMAT`] 相同形状的字符串
    pub fn format_pattern(&self) -> &'static str {
        match self {
            Granularity::Hour => "%Y-%m-%dT%H:00:00",
            Granularity::Day => "%Y-%m-%dT00:00:00",
            Granularity::Month => "%Y-%m-01T00:00:00",
        }
    }

    /// 截断到所在分桶的起始时间
    ///
    /// 只按日历字段截断，不经过纳秒时间戳，全部年份范围有效。
    pub fn truncate(&self, dt: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Granularity::Hour => dt
                .date_naive()
                .and_hms_opt(dt.hour(), 0, 0)
                .map(|start| start.and_utc())
                .unwrap_or(dt),
            Granularity::Day => dt.date_naive().and_time(NaiveTime::MIN).and_utc(),
            Granularity::Month => NaiveDate::from_ymd_opt(dt.year(), dt.month(), 1)
                .map(|first| first.and_time(NaiveTime::MIN).and_utc())
                .unwrap_or(dt),
        }
    }

    /// 计算分桶标签
    pub fn bucket_label(&self, dt: DateTime<Utc>) -> String {
        format_label(self.truncate(dt))
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Granularity::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| {
                AppError::InvalidArgument(
                    "Invalid group_type. Must be 'hour', 'day', or 'month'.".to_string(),
                )
            })
    }
}

/// 格式化为分桶标签
pub fn format_label(dt: DateTime<Utc>) -> String {
    dt.format(LABEL_FORMAT).to_string()
}

/// 解析分桶标签
pub fn parse_label(label: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(label, LABEL_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| AppError::Internal(format!("unexpected bucket label '{}': {}", label, e)))
}

/// 解析 ISO-8601 时间戳
///
/// 带偏移量的值换算为 UTC；不带偏移量的值按 UTC 解释；纯日期取零点。
/// 首尾空白不做裁剪，视为格式错误。
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }

    Err(AppError::Parse(format!(
        "Invalid isoformat string: '{}'",
        value
    )))
}

/// 闭区间时间范围 `[from, to]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    /// 两端均包含；`from > to` 时恒为 false
    pub fn contains(&self, dt: DateTime<Utc>) -> bool {
        self.from <= dt && dt <= self.to
    }
}

/// 入站查询（聊天消息或 HTTP 请求体）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationQuery {
    pub dt_from: String,
    pub dt_upto: String,
    pub group_type: String,
}

impl AggregationQuery {
    pub fn new(
        dt_from: impl Into<String>,
        dt_upto: impl Into<String>,
        group_type: impl Into<String>,
    ) -> Self {
        Self {
            dt_from: dt_from.into(),
            dt_upto: dt_upto.into(),
            group_type: group_type.into(),
        }
    }

    /// 校验字段并转换为聚合请求
    ///
    /// 先解析时间戳，再解析粒度。
    pub fn into_request(self) -> Result<AggregationRequest> {
        let from = parse_timestamp(&self.dt_from)?;
        let to = parse_timestamp(&self.dt_upto)?;
        let granularity = self.group_type.parse()?;
        Ok(AggregationRequest::new(from, to, granularity))
    }
}

/// 已校验的聚合请求
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationRequest {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub granularity: Granularity,
}

impl AggregationRequest {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>, granularity: Granularity) -> Self {
        Self {
            from,
            to,
            granularity,
        }
    }

    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.from, self.to)
    }
}

/// 聚合结果
///
/// `dataset` 与 `labels` 各自包裹在一层外部序列中，与图表库的数据集约定一致。
/// `labels[0][i]` 对应 `dataset[0][i]`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationResult {
    pub dataset: Vec<Vec<i64>>,
    pub labels: Vec<Vec<String>>,
}

impl AggregationResult {
    /// 由已按标签升序排列的分桶构造
    pub fn from_buckets(buckets: Vec<BucketTotal>) -> Self {
        let (labels, dataset): (Vec<String>, Vec<i64>) =
            buckets.into_iter().map(|b| (b.label, b.total)).unzip();

        Self {
            dataset: vec![dataset],
            labels: vec![labels],
        }
    }

    pub fn labels(&self) -> &[String] {
        self.labels.first().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn dataset(&self) -> &[i64] {
        self.dataset.first().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.labels().is_empty()
    }
}
