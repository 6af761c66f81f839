use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::IntoResponse,
};
use std::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{api::app_state::AppState, error::AppError, models::aggregation::AggregationQuery};

/// 关联日志与响应的请求 ID 头
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// POST /api/v1/salaries/aggregate
pub async fn aggregate_salaries(
    State(state): State<AppState>,
    payload: Result<Json<AggregationQuery>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(query) = payload.map_err(|e| AppError::MalformedRequest(e.body_text()))?;

    let request_id = Uuid::new_v4();
    debug!(
        "HTTP aggregation request {}: {} from {} to {}",
        request_id, query.group_type, query.dt_from, query.dt_upto
    );

    let start_time = Instant::now();

    let outcome = tokio::time::timeout(
        state.query_timeout,
        state
            .aggregation_service
            .aggregate(&query.dt_from, &query.dt_upto, &query.group_type),
    )
    .await
    .map_err(AppError::from)
    .and_then(|result| result);

    let took_ms = start_time.elapsed().as_millis() as u64;
    state.metrics.record_aggregation(took_ms, outcome.is_ok());

    match outcome {
        Ok(result) => Ok(([(REQUEST_ID_HEADER, request_id.to_string())], Json(result))),
        Err(e) => {
            if !e.is_client_error() {
                warn!("HTTP aggregation request {} failed: {}", request_id, e);
            }
            Err(e)
        }
    }
}
