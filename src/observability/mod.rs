//! 可观测性模块
//!
//! 提供结构化日志初始化、聚合指标和健康检查端点。

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::config::LoggingConfig;
use crate::error::{AppError, Result};
use crate::storage::repository::RecordStore;

// ===== Metrics =====

/// 应用指标
#[derive(Default)]
pub struct AppMetrics {
    pub aggregations_total: AtomicU64,
    pub aggregation_errors_total: AtomicU64,
    pub aggregation_latency_ms_sum: AtomicU64,
    pub bot_updates_total: AtomicU64,
    pub bot_send_failures_total: AtomicU64,
}

impl AppMetrics {
    /// 记录一次聚合
    pub fn record_aggregation(&self, duration_ms: u64, success: bool) {
        self.aggregations_total.fetch_add(1, Ordering::Relaxed);
        self.aggregation_latency_ms_sum
            .fetch_add(duration_ms, Ordering::Relaxed);
        if !success {
            self.aggregation_errors_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_update(&self) {
        self.bot_updates_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_send_failure(&self) {
        self.bot_send_failures_total.fetch_add(1, Ordering::Relaxed);
    }

    /// 生成 Prometheus 文本格式指标
    pub fn gather(&self) -> String {
        let aggregations = self.aggregations_total.load(Ordering::Relaxed);
        format!(
            r#"# HELP salary_aggregations_total Total aggregation requests
# TYPE salary_aggregations_total counter
salary_aggregations_total {}
# HELP salary_aggregation_errors_total Failed aggregation requests
# TYPE salary_aggregation_errors_total counter
salary_aggregation_errors_total {}
# HELP salary_aggregation_duration_seconds Aggregation latency in seconds
# TYPE salary_aggregation_duration_seconds summary
salary_aggregation_duration_seconds_sum {}
salary_aggregation_duration_seconds_count {}
# HELP bot_updates_total Telegram updates received
# TYPE bot_updates_total counter
bot_updates_total {}
# HELP bot_send_failures_total Telegram replies that could not be delivered
# TYPE bot_send_failures_total counter
bot_send_failures_total {}
"#,
            aggregations,
            self.aggregation_errors_total.load(Ordering::Relaxed),
            self.aggregation_latency_ms_sum.load(Ordering::Relaxed) as f64 / 1000.0,
            aggregations,
            self.bot_updates_total.load(Ordering::Relaxed),
            self.bot_send_failures_total.load(Ordering::Relaxed),
        )
    }
}

// ===== Health Check =====

/// 健康检查状态
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub uptime_seconds: f64,
    pub checks: Vec<HealthCheck>,
}

/// 单个健康检查项
#[derive(Debug, Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: String,
    pub message: Option<String>,
    pub latency_ms: Option<u64>,
}

/// 可观测性状态
#[derive(Clone)]
pub struct ObservabilityState {
    pub metrics: Arc<AppMetrics>,
    pub store: Arc<dyn RecordStore>,
    pub start_time: DateTime<Utc>,
    pub version: String,
}

impl ObservabilityState {
    pub fn new(version: String, store: Arc<dyn RecordStore>, metrics: Arc<AppMetrics>) -> Self {
        Self {
            metrics,
            store,
            start_time: Utc::now(),
            version,
        }
    }

    /// 获取应用正常运行时间
    pub fn uptime_seconds(&self) -> f64 {
        (Utc::now() - self.start_time).num_seconds() as f64
    }

    /// 检查记录存储
    pub async fn check_store(&self) -> HealthCheck {
        let start = std::time::Instant::now();
        let result = self.store.ping().await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(()) => HealthCheck {
                name: format!("store:{}", self.store.backend()),
                status: "healthy".to_string(),
                message: None,
                latency_ms: Some(latency_ms),
            },
            Err(e) => {
                tracing::warn!("Store health check failed: {}", e);
                HealthCheck {
                    name: format!("store:{}", self.store.backend()),
                    status: "unhealthy".to_string(),
                    message: Some(e.user_message()),
                    latency_ms: Some(latency_ms),
                }
            }
        }
    }
}

// ===== Health Check Handlers =====

/// 获取完整健康状态
pub async fn health_check(State(state): State<ObservabilityState>) -> impl IntoResponse {
    let checks = vec![state.check_store().await];
    let all_healthy = checks.iter().all(|c| c.status == "healthy");

    let health_status = HealthStatus {
        status: if all_healthy { "healthy" } else { "unhealthy" }.to_string(),
        timestamp: Utc::now().to_rfc3339(),
        version: state.version.clone(),
        uptime_seconds: state.uptime_seconds(),
        checks,
    };

    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(health_status))
}

/// 简单存活检查
pub async fn liveness() -> impl IntoResponse {
    "OK"
}

/// 就绪检查
pub async fn readiness(State(state): State<ObservabilityState>) -> impl IntoResponse {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, "Ready"),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "Not Ready"),
    }
}

/// Prometheus 指标端点
pub async fn metrics(State(state): State<ObservabilityState>) -> impl IntoResponse {
    (StatusCode::OK, state.metrics.gather())
}

/// 版本信息端点
pub async fn version(State(state): State<ObservabilityState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "version": state.version,
        "uptime_seconds": state.uptime_seconds(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// 创建可观测性路由
pub fn create_observability_router(state: ObservabilityState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness))
        .route("/health/ready", get(readiness))
        .route("/metrics", get(metrics))
        .route("/version", get(version))
        .with_state(state)
}

// ===== Structured Logging =====

/// 初始化日志
///
/// RUST_LOG 优先于配置中的级别。配置了日志目录时额外写入按天滚动的 JSON 文件，
/// 返回的 guard 需要在进程退出前保持存活。
pub fn init_tracing(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let stdout_layer = if config.structured {
        fmt::layer().json().with_target(true).boxed()
    } else {
        fmt::layer().with_target(true).with_line_number(true).boxed()
    };

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "salary-bot.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| AppError::Internal(format!("failed to install tracing subscriber: {}", e)))?;

    Ok(guard)
}
