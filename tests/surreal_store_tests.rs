// Integration tests for the SurrealDB record store
//
// Runs against the embedded in-memory engine.

#![cfg(feature = "surrealdb")]

use chrono::{TimeZone, Utc};
use salary_bot::config::config::{DatabaseConfig, DatabaseType};
use salary_bot::models::aggregation::{Granularity, TimeRange};
use salary_bot::models::record::SalaryRecord;
use salary_bot::services::{AggregationOptions, AggregationService, SalaryAggregator};
use salary_bot::storage::repository::{RecordStore, SurrealRecordStore};
use salary_bot::storage::surrealdb::SurrealPool;
use std::sync::Arc;

async fn pool() -> (SurrealPool, String) {
    let config = DatabaseConfig {
        db_type: DatabaseType::SurrealDB,
        url: "mem://".to_string(),
        ..Default::default()
    };
    let table = config.table.clone();
    (SurrealPool::new(config).await.unwrap(), table)
}

async fn store() -> SurrealRecordStore {
    let (pool, table) = pool().await;
    SurrealRecordStore::new(pool, table)
}

async fn seeded_store() -> SurrealRecordStore {
    let store = store().await;
    let records = [
        (Utc.with_ymd_and_hms(2022, 9, 1, 0, 0, 0).unwrap(), 7000),
        (Utc.with_ymd_and_hms(2022, 9, 1, 0, 45, 0).unwrap(), 500),
        (Utc.with_ymd_and_hms(2022, 9, 2, 13, 0, 0).unwrap(), 200),
        (Utc.with_ymd_and_hms(2022, 10, 5, 8, 0, 0).unwrap(), 4000),
        (Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(), 99999),
    ];
    for (dt, value) in records {
        store.insert(&SalaryRecord::new(dt, value)).await.unwrap();
    }
    store
}

fn autumn() -> TimeRange {
    TimeRange::new(
        Utc.with_ymd_and_hms(2022, 9, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2022, 12, 31, 23, 59, 0).unwrap(),
    )
}

#[tokio::test]
async fn test_monthly_bucket_totals() {
    let store = seeded_store().await;

    let buckets = store
        .bucket_totals(&autumn(), Granularity::Month)
        .await
        .unwrap();

    let pairs: Vec<(String, i64)> = buckets.into_iter().map(|b| (b.label, b.total)).collect();
    assert_eq!(
        pairs,
        vec![
            ("2022-09-01T00:00:00".to_string(), 7700),
            ("2022-10-01T00:00:00".to_string(), 4000),
        ]
    );
}

#[tokio::test]
async fn test_hourly_bucket_totals() {
    let store = seeded_store().await;

    let buckets = store
        .bucket_totals(&autumn(), Granularity::Hour)
        .await
        .unwrap();

    let labels: Vec<&str> = buckets.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(
        labels,
        vec![
            "2022-09-01T00:00:00",
            "2022-09-02T13:00:00",
            "2022-10-05T08:00:00",
        ]
    );
    assert_eq!(buckets[0].total, 7500);
}

#[tokio::test]
async fn test_empty_table_yields_no_buckets() {
    let store = store().await;

    let buckets = store
        .bucket_totals(&autumn(), Granularity::Day)
        .await
        .unwrap();

    assert!(buckets.is_empty());
}

#[tokio::test]
async fn test_aggregator_over_surreal_store() {
    let store = seeded_store().await;
    store.ping().await.unwrap();
    assert_eq!(store.backend(), "surrealdb");

    let service = SalaryAggregator::new(Arc::new(store), AggregationOptions::default());
    let result = service
        .aggregate("2022-09-01T00:00:00", "2022-09-30T23:59:59", "day")
        .await
        .unwrap();

    assert_eq!(result.dataset(), &[7500, 200][..]);
    assert_eq!(
        result.labels(),
        &["2022-09-01T00:00:00".to_string(), "2022-09-02T00:00:00".to_string()][..]
    );
}

#[tokio::test]
async fn test_string_typed_dt_is_counted() {
    let (pool, table) = pool().await;
    let db = pool.inner().await.unwrap();
    db.query(
        "CREATE type::table($table) SET dt = <string> '2022-09-01T10:00:00Z', value = 5;
         CREATE type::table($table) SET dt = d'2022-09-30T23:59:00Z', value = 7;",
    )
    .bind(("table", table.clone()))
    .await
    .unwrap()
    .check()
    .unwrap();

    let store = SurrealRecordStore::new(pool, table);
    let range = TimeRange::new(
        Utc.with_ymd_and_hms(2022, 9, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2022, 9, 30, 23, 59, 0).unwrap(),
    );
    let buckets = store
        .bucket_totals(&range, Granularity::Month)
        .await
        .unwrap();

    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].label, "2022-09-01T00:00:00");
    assert_eq!(buckets[0].total, 12);
}

#[tokio::test]
async fn test_large_totals_stay_exact() {
    let store = store().await;
    let dt = Utc.with_ymd_and_hms(2022, 9, 1, 12, 0, 0).unwrap();
    store
        .insert(&SalaryRecord::new(dt, 9_007_199_254_740_993))
        .await
        .unwrap();
    store.insert(&SalaryRecord::new(dt, 2)).await.unwrap();

    let buckets = store
        .bucket_totals(&autumn(), Granularity::Day)
        .await
        .unwrap();

    assert_eq!(buckets[0].total, 9_007_199_254_740_995);
}
