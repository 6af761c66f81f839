//! Aggregation Routes
//!
//! 定义薪资聚合相关的 API 路由。

use crate::api::handlers::aggregation_handler::*;
use axum::{Router, routing::post};

use crate::api::app_state::AppState;

/// 创建聚合路由器
pub fn create_aggregation_router() -> Router<AppState> {
    Router::new().route("/salaries/aggregate", post(aggregate_salaries))
}
