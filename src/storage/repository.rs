use async_trait::async_trait;
use chrono::SecondsFormat;
use serde::Deserialize;
use tracing::debug;

use crate::error::Result;
use crate::models::aggregation::{Granularity, TimeRange};
use crate::models::record::{BucketTotal, SalaryRecord};

/// 薪资记录存储 trait
///
/// 聚合核心只依赖这一接口；实现负责把范围过滤、分桶、求和与排序下推到存储端。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// 按粒度对 `[range.from, range.to]` 内的记录分桶求和，按标签升序返回
    async fn bucket_totals(
        &self,
        range: &TimeRange,
        granularity: Granularity,
    ) -> Result<Vec<BucketTotal>>;

    /// 写入一条记录（用于导入种子数据）
    async fn insert(&self, record: &SalaryRecord) -> Result<()>;

    /// 检查存储是否可用
    async fn ping(&self) -> Result<()>;

    /// 后端名称
    fn backend(&self) -> &'static str;
}

#[cfg(feature = "surrealdb")]
pub use self::surreal::SurrealRecordStore;

#[cfg(feature = "surrealdb")]
mod surreal {
    use super::*;
    use crate::storage::surrealdb::SurrealPool;

    // 外部导入的记录可能把 dt 存成 ISO 字符串，比较与格式化前统一转换为 datetime
    const BUCKET_TOTALS_QUERY: &str = "
        SELECT time::format(<datetime> dt, $format) AS bucket, math::sum(value) AS total
        FROM type::table($table)
        WHERE <datetime> dt >= type::datetime($from) AND <datetime> dt <= type::datetime($to)
        GROUP BY bucket
        ORDER BY bucket ASC
    ";

    const INSERT_QUERY: &str = "
        CREATE type::table($table) SET dt = type::datetime($dt), value = $value
    ";

    /// 分组查询返回的行
    #[derive(Debug, Deserialize)]
    struct BucketRow {
        bucket: String,
        total: i64,
    }

    /// SurrealDB 记录存储
    #[derive(Clone)]
    pub struct SurrealRecordStore {
        pool: SurrealPool,
        table: String,
    }

    impl SurrealRecordStore {
        pub fn new(pool: SurrealPool, table: impl Into<String>) -> Self {
            Self {
                pool,
                table: table.into(),
            }
        }
    }

    #[async_trait]
    impl RecordStore for SurrealRecordStore {
        async fn bucket_totals(
            &self,
            range: &TimeRange,
            granularity: Granularity,
        ) -> Result<Vec<BucketTotal>> {
            debug!(
                "Querying {} buckets in {} from {} to {}",
                granularity, self.table, range.from, range.to
            );

            let db = self.pool.inner().await?;
            let rows: Vec<BucketRow> = db
                .query(BUCKET_TOTALS_QUERY)
                .bind(("format", granularity.format_pattern()))
                .bind(("table", self.table.clone()))
                .bind(("from", range.from.to_rfc3339_opts(SecondsFormat::AutoSi, true)))
                .bind(("to", range.to.to_rfc3339_opts(SecondsFormat::AutoSi, true)))
                .await?
                .take(0)?;

            Ok(rows
                .into_iter()
                .map(|row| BucketTotal::new(row.bucket, row.total))
                .collect())
        }

        async fn insert(&self, record: &SalaryRecord) -> Result<()> {
            let db = self.pool.inner().await?;
            db.query(INSERT_QUERY)
                .bind(("table", self.table.clone()))
                .bind(("dt", record.dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)))
                .bind(("value", record.value))
                .await?
                .check()?;
            Ok(())
        }

        async fn ping(&self) -> Result<()> {
            let db = self.pool.inner().await?;
            db.health().await?;
            Ok(())
        }

        fn backend(&self) -> &'static str {
            "surrealdb"
        }
    }
}
