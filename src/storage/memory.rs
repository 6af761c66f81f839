//! 进程内记录存储
//!
//! 分桶逻辑与 SurrealDB 查询一致：闭区间过滤、按截断时间分组求和、升序输出。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{AppError, Result};
use crate::models::aggregation::{Granularity, TimeRange, format_label};
use crate::models::record::{BucketTotal, SalaryRecord};
use crate::storage::repository::RecordStore;

#[derive(Clone, Default)]
pub struct MemoryRecordStore {
    records: Arc<RwLock<Vec<SalaryRecord>>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<SalaryRecord>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn bucket_totals(
        &self,
        range: &TimeRange,
        granularity: Granularity,
    ) -> Result<Vec<BucketTotal>> {
        let records = self.records.read().await;

        let mut buckets: BTreeMap<DateTime<Utc>, i64> = BTreeMap::new();
        for record in records.iter().filter(|r| range.contains(r.dt)) {
            let start = granularity.truncate(record.dt);
            let total = buckets.entry(start).or_insert(0);
            *total = total.checked_add(record.value).ok_or_else(|| {
                AppError::Internal(format!(
                    "salary total overflows i64 in bucket {}",
                    format_label(start)
                ))
            })?;
        }

        Ok(buckets
            .into_iter()
            .map(|(start, total)| BucketTotal::new(format_label(start), total))
            .collect())
    }

    async fn insert(&self, record: &SalaryRecord) -> Result<()> {
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, h, mi, 0).unwrap()
    }

    #[tokio::test]
    async fn test_groups_and_sorts_buckets() {
        let store = MemoryRecordStore::with_records(vec![
            SalaryRecord::new(at(1, 11, 5), 50),
            SalaryRecord::new(at(1, 10, 15), 100),
            SalaryRecord::new(at(1, 10, 45), 25),
        ]);

        let buckets = store
            .bucket_totals(&TimeRange::new(at(1, 0, 0), at(1, 23, 59)), Granularity::Hour)
            .await
            .unwrap();

        assert_eq!(
            buckets,
            vec![
                BucketTotal::new("2024-01-01T10:00:00", 125),
                BucketTotal::new("2024-01-01T11:00:00", 50),
            ]
        );
    }

    #[tokio::test]
    async fn test_range_bounds_are_inclusive() {
        let store = MemoryRecordStore::with_records(vec![
            SalaryRecord::new(at(1, 0, 0), 1),
            SalaryRecord::new(at(2, 0, 0), 2),
            SalaryRecord::new(at(2, 0, 1), 4),
        ]);

        let buckets = store
            .bucket_totals(&TimeRange::new(at(1, 0, 0), at(2, 0, 0)), Granularity::Day)
            .await
            .unwrap();

        let total: i64 = buckets.iter().map(|b| b.total).sum();
        assert_eq!(total, 3);
    }

    #[tokio::test]
    async fn test_insert() {
        let store = MemoryRecordStore::new();
        assert!(store.is_empty().await);

        store.insert(&SalaryRecord::new(at(3, 9, 0), 7)).await.unwrap();
        assert_eq!(store.len().await, 1);
        assert_eq!(store.backend(), "memory");
    }

    #[tokio::test]
    async fn test_overflowing_total_is_an_error() {
        let store = MemoryRecordStore::with_records(vec![
            SalaryRecord::new(at(1, 10, 0), i64::MAX),
            SalaryRecord::new(at(1, 10, 30), 1),
        ]);

        let err = store
            .bucket_totals(&TimeRange::new(at(1, 0, 0), at(1, 23, 59)), Granularity::Hour)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Internal(_)));
    }

    #[tokio::test]
    async fn test_hour_buckets_far_from_epoch() {
        let far = |mi| Utc.with_ymd_and_hms(2300, 3, 15, 14, mi, 0).unwrap();
        let store = MemoryRecordStore::with_records(vec![
            SalaryRecord::new(far(5), 3),
            SalaryRecord::new(far(37), 4),
        ]);

        let buckets = store
            .bucket_totals(&TimeRange::new(far(0), far(59)), Granularity::Hour)
            .await
            .unwrap();

        assert_eq!(buckets, vec![BucketTotal::new("2300-03-15T14:00:00", 7)]);
    }
}
