use crate::observability::AppMetrics;
use crate::services::aggregation::AggregationService;
use std::sync::Arc;
use std::time::Duration;

/// Application state shared by the HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Salary aggregation service
    pub aggregation_service: Arc<dyn AggregationService>,
    /// Shared metrics, also fed by the Telegram bot
    pub metrics: Arc<AppMetrics>,
    /// Timeout applied around each aggregation call
    pub query_timeout: Duration,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("aggregation_service", &"Arc<dyn AggregationService>")
            .field("metrics", &"Arc<AppMetrics>")
            .field("query_timeout", &self.query_timeout)
            .finish()
    }
}

impl AppState {
    /// Create new application state
    pub fn new(
        aggregation_service: Arc<dyn AggregationService>,
        metrics: Arc<AppMetrics>,
        query_timeout: Duration,
    ) -> Self {
        Self {
            aggregation_service,
            metrics,
            query_timeout,
        }
    }
}
