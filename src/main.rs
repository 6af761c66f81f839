use salary_bot::api::{self, app_state::AppState};
use salary_bot::bot::BotRunner;
use salary_bot::bot::handlers::BotHandler;
use salary_bot::bot::telegram::TelegramClient;
use salary_bot::config::loader::ConfigLoader;
use salary_bot::observability::{
    AppMetrics, ObservabilityState, create_observability_router, init_tracing,
};
use salary_bot::services::{AggregationOptions, create_aggregation_service};
use salary_bot::storage::StorageFactory;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigLoader::load()?;
    let _log_guard = init_tracing(&config.logging)?;
    info!("Configuration loaded successfully");

    ConfigLoader::validate(&config)?;

    info!("Starting Salary Bot v{}...", env!("CARGO_PKG_VERSION"));

    let storage = StorageFactory::create(&config.database).await?;
    let store = storage.record_store();
    info!("Record store initialized (backend: {})", store.backend());

    let aggregation_service = create_aggregation_service(
        store.clone(),
        AggregationOptions {
            trailing_bucket: config.aggregation.trailing_bucket,
        },
    );
    let metrics = Arc::new(AppMetrics::default());
    let query_timeout = Duration::from_secs(config.aggregation.query_timeout_secs);
    info!(
        "Aggregation service initialized (trailing bucket: {})",
        config.aggregation.trailing_bucket
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut tasks = JoinSet::new();

    if config.telegram.enabled {
        let client = TelegramClient::new(
            &config.telegram.api_url,
            &config.telegram.token,
            config.telegram.poll_timeout_secs,
        )?;
        let handler = BotHandler::new(aggregation_service.clone(), metrics.clone(), query_timeout);
        let runner = BotRunner::new(client, handler, metrics.clone(), &config.telegram);
        let shutdown = shutdown_rx.clone();
        tasks.spawn(async move { runner.run(shutdown).await.map_err(|e| e.to_string()) });
        info!("Telegram bot task spawned");
    }

    if config.server.enabled {
        let observability_state = ObservabilityState::new(
            env!("CARGO_PKG_VERSION").to_string(),
            store.clone(),
            metrics.clone(),
        );
        let app_state = AppState::new(aggregation_service.clone(), metrics.clone(), query_timeout);
        let router =
            create_observability_router(observability_state).merge(api::create_router(app_state));

        let addr = format!("{}:{}", config.server.host, config.server.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!("Server listening on {}", addr);

        let mut shutdown = shutdown_rx.clone();
        tasks.spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = shutdown.changed().await;
                })
                .await
                .map_err(|e| e.to_string())
        });
    }

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Shutdown signal received");
        }
        Some(joined) = tasks.join_next() => {
            // 任一前端提前退出时整体停机
            match joined {
                Ok(Ok(())) => info!("A frontend task exited"),
                Ok(Err(e)) => error!("Frontend task failed: {}", e),
                Err(e) => error!("Frontend task panicked: {}", e),
            }
        }
    }

    let _ = shutdown_tx.send(true);
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Err(e)) => error!("Frontend task failed during shutdown: {}", e),
            Err(e) => error!("Frontend task panicked: {}", e),
            Ok(Ok(())) => {}
        }
    }

    storage.close().await;
    info!("Salary Bot stopped");

    Ok(())
}
