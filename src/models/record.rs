use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 薪资记录
///
/// 存储在记录表中的时间戳数值条目。记录由外部写入，本服务只读。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryRecord {
    /// 记录时间
    pub dt: DateTime<Utc>,

    /// 金额
    pub value: i64,
}

impl SalaryRecord {
    /// 创建新记录
    pub fn new(dt: DateTime<Utc>, value: i64) -> Self {
        Self { dt, value }
    }
}

/// 单个分桶的汇总结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketTotal {
    /// 分桶起始时间，格式为 `YYYY-MM-DDTHH:MM:SS`
    pub label: String,

    /// 桶内金额合计
    pub total: i64,
}

impl BucketTotal {
    pub fn new(label: impl Into<String>, total: i64) -> Self {
        Self {
            label: label.into(),
            total,
        }
    }
}
