//! 薪资聚合服务
//!
//! 解析时间范围与分组粒度，调用记录存储做分桶求和，并整理为图表数据集结构。
//!
//! 末尾合成分桶：旧版机器人存在两个聚合入口，其中一个会在结果末尾追加
//! `最后标签 + 1 小时` 的零值分桶，另一个不会。这里只保留一个实现，
//! 由 [`AggregationOptions::trailing_bucket`] 显式控制，默认关闭。

use async_trait::async_trait;
use chrono::Duration;
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::models::aggregation::{
    AggregationQuery, AggregationRequest, AggregationResult, format_label, parse_label,
};
use crate::models::record::BucketTotal;
use crate::storage::repository::RecordStore;

/// 聚合选项
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregationOptions {
    /// 追加零值合成分桶，标签为最后一个真实分桶加一小时（与粒度无关）
    pub trailing_bucket: bool,
}

/// 聚合服务 trait
#[async_trait]
pub trait AggregationService: Send + Sync {
    /// 按原始字符串参数聚合
    ///
    /// 时间戳非法返回 `Parse`，粒度非法返回 `InvalidArgument`，
    /// 存储失败原样返回 `Storage`。
    async fn aggregate(
        &self,
        dt_from: &str,
        dt_upto: &str,
        group_type: &str,
    ) -> Result<AggregationResult>;

    /// 按已校验的请求聚合
    async fn aggregate_request(&self, request: &AggregationRequest) -> Result<AggregationResult>;
}

/// 聚合服务实现
pub struct SalaryAggregator {
    store: Arc<dyn RecordStore>,
    options: AggregationOptions,
}

impl SalaryAggregator {
    /// 创建新的服务实例
    pub fn new(store: Arc<dyn RecordStore>, options: AggregationOptions) -> Self {
        Self { store, options }
    }
}

#[async_trait]
impl AggregationService for SalaryAggregator {
    async fn aggregate(
        &self,
        dt_from: &str,
        dt_upto: &str,
        group_type: &str,
    ) -> Result<AggregationResult> {
        let request = AggregationQuery::new(dt_from, dt_upto, group_type).into_request()?;
        self.aggregate_request(&request).await
    }

    async fn aggregate_request(&self, request: &AggregationRequest) -> Result<AggregationResult> {
        debug!(
            "Aggregating salaries from {} to {} by {} ({} store)",
            request.from,
            request.to,
            request.granularity,
            self.store.backend()
        );

        let mut buckets = self
            .store
            .bucket_totals(&request.range(), request.granularity)
            .await?;

        if self.options.trailing_bucket {
            if let Some(last) = buckets.last() {
                let next = parse_label(&last.label)? + Duration::hours(1);
                buckets.push(BucketTotal::new(format_label(next), 0));
            }
        }

        debug!("Aggregation produced {} buckets", buckets.len());

        Ok(AggregationResult::from_buckets(buckets))
    }
}

/// 创建聚合服务
pub fn create_aggregation_service(
    store: Arc<dyn RecordStore>,
    options: AggregationOptions,
) -> Arc<dyn AggregationService> {
    Arc::new(SalaryAggregator::new(store, options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::aggregation::Granularity;
    use crate::models::record::SalaryRecord;
    use crate::storage::memory::MemoryRecordStore;
    use crate::storage::repository::MockRecordStore;
    use chrono::{TimeZone, Utc};

    fn sample_store() -> Arc<dyn RecordStore> {
        Arc::new(MemoryRecordStore::with_records(vec![
            SalaryRecord::new(Utc.with_ymd_and_hms(2024, 1, 1, 10, 15, 0).unwrap(), 100),
            SalaryRecord::new(Utc.with_ymd_and_hms(2024, 1, 1, 11, 5, 0).unwrap(), 50),
        ]))
    }

    #[tokio::test]
    async fn test_hourly_scenario() {
        let service = SalaryAggregator::new(sample_store(), AggregationOptions::default());

        let result = service
            .aggregate("2024-01-01T00:00", "2024-01-01T23:59", "hour")
            .await
            .unwrap();

        assert_eq!(
            result.labels,
            vec![vec!["2024-01-01T10:00:00".to_string(), "2024-01-01T11:00:00".to_string()]]
        );
        assert_eq!(result.dataset, vec![vec![100, 50]]);
    }

    #[tokio::test]
    async fn test_trailing_bucket_adds_one_hour_for_every_granularity() {
        let service = SalaryAggregator::new(
            sample_store(),
            AggregationOptions {
                trailing_bucket: true,
            },
        );

        let hourly = service
            .aggregate("2024-01-01T00:00:00", "2024-01-01T23:59:00", "hour")
            .await
            .unwrap();
        assert_eq!(hourly.labels().last().unwrap(), "2024-01-01T12:00:00");
        assert_eq!(hourly.dataset(), [100, 50, 0]);

        let monthly = service
            .aggregate("2024-01-01T00:00:00", "2024-01-31T23:59:00", "month")
            .await
            .unwrap();
        assert_eq!(
            monthly.labels(),
            ["2024-01-01T00:00:00", "2024-01-01T01:00:00"]
        );
        assert_eq!(monthly.dataset(), [150, 0]);
    }

    #[tokio::test]
    async fn test_trailing_bucket_skipped_for_empty_result() {
        let service = SalaryAggregator::new(
            sample_store(),
            AggregationOptions {
                trailing_bucket: true,
            },
        );

        let result = service
            .aggregate("2025-01-01T00:00:00", "2025-01-02T00:00:00", "day")
            .await
            .unwrap();
        assert_eq!(result, AggregationResult::from_buckets(vec![]));
    }

    #[tokio::test]
    async fn test_store_receives_parsed_range_and_granularity() {
        let mut store = MockRecordStore::new();
        store
            .expect_bucket_totals()
            .withf(|range, granularity| {
                range.from == Utc.with_ymd_and_hms(2022, 9, 1, 0, 0, 0).unwrap()
                    && range.to == Utc.with_ymd_and_hms(2022, 12, 31, 23, 59, 0).unwrap()
                    && *granularity == Granularity::Month
            })
            .times(1)
            .returning(|_, _| Ok(vec![BucketTotal::new("2022-09-01T00:00:00", 5)]));
        store.expect_backend().return_const("mock");

        let service = SalaryAggregator::new(Arc::new(store), AggregationOptions::default());
        let result = service
            .aggregate("2022-09-01T00:00:00", "2022-12-31T23:59:00", "month")
            .await
            .unwrap();

        assert_eq!(result.dataset(), [5]);
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_store() {
        let mut store = MockRecordStore::new();
        store.expect_bucket_totals().times(0);

        let service = SalaryAggregator::new(Arc::new(store), AggregationOptions::default());

        let err = service
            .aggregate("2024-01-01T00:00:00", "2024-01-02T00:00:00", "week")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));

        let err = service
            .aggregate("not a date", "2024-01-02T00:00:00", "day")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
    }

    #[tokio::test]
    async fn test_storage_error_propagates_verbatim() {
        let mut store = MockRecordStore::new();
        store
            .expect_bucket_totals()
            .returning(|_, _| Err(AppError::Storage("connection refused".to_string())));
        store.expect_backend().return_const("mock");

        let service = SalaryAggregator::new(Arc::new(store), AggregationOptions::default());
        let err = service
            .aggregate("2024-01-01T00:00:00", "2024-01-02T00:00:00", "day")
            .await
            .unwrap_err();

        match err {
            AppError::Storage(msg) => assert_eq!(msg, "connection refused"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reversed_range_is_empty_not_error() {
        let service = SalaryAggregator::new(sample_store(), AggregationOptions::default());

        let result = service
            .aggregate("2024-01-01T23:59:00", "2024-01-01T00:00:00", "hour")
            .await
            .unwrap();

        assert!(result.is_empty());
        assert_eq!(result.dataset, vec![Vec::<i64>::new()]);
    }
}
