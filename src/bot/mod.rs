//! Telegram 机器人模块
//!
//! 长轮询 Bot API，每条更新在独立任务中处理，聚合服务在各任务间共享。

pub mod handlers;
pub mod markdown;
pub mod telegram;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::config::TelegramConfig;
use crate::error::Result;
use crate::observability::AppMetrics;
use handlers::BotHandler;
use telegram::{TelegramClient, Update};

/// 机器人轮询循环
pub struct BotRunner {
    client: Arc<TelegramClient>,
    handler: Arc<BotHandler>,
    metrics: Arc<AppMetrics>,
    poll_timeout_secs: u64,
    retry_delay: Duration,
}

impl BotRunner {
    pub fn new(
        client: TelegramClient,
        handler: BotHandler,
        metrics: Arc<AppMetrics>,
        config: &TelegramConfig,
    ) -> Self {
        Self {
            client: Arc::new(client),
            handler: Arc::new(handler),
            metrics,
            poll_timeout_secs: config.poll_timeout_secs,
            retry_delay: Duration::from_secs(config.retry_delay_secs),
        }
    }

    /// 运行到收到关闭信号为止
    ///
    /// 令牌无效时在启动阶段返回错误；轮询期间的传输错误只记录并退避重试。
    /// 退出前等待已派发的任务完成回复。
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let me = self.client.get_me().await?;
        info!(
            "Telegram bot @{} started polling",
            me.username.as_deref().unwrap_or(&me.first_name)
        );

        let mut offset: Option<i64> = None;
        let mut tasks = JoinSet::new();

        loop {
            while tasks.try_join_next().is_some() {}

            tokio::select! {
                _ = shutdown.changed() => break,
                polled = self.client.get_updates(offset, self.poll_timeout_secs) => match polled {
                    Ok(updates) => {
                        debug!("Received {} updates", updates.len());
                        for update in updates {
                            offset = Some(update.update_id + 1);
                            self.dispatch(update, &mut tasks);
                        }
                    }
                    Err(e) => {
                        warn!("Polling failed, retrying in {:?}: {}", self.retry_delay, e);
                        tokio::select! {
                            _ = shutdown.changed() => break,
                            _ = tokio::time::sleep(self.retry_delay) => {}
                        }
                    }
                },
            }
        }

        info!("Stopping Telegram bot, waiting for {} in-flight replies", tasks.len());
        while tasks.join_next().await.is_some() {}

        Ok(())
    }

    fn dispatch(&self, update: Update, tasks: &mut JoinSet<()>) {
        self.metrics.record_update();

        let Some(message) = update.message else {
            debug!("Skipping update {} without message", update.update_id);
            return;
        };

        let client = self.client.clone();
        let handler = self.handler.clone();
        let metrics = self.metrics.clone();

        tasks.spawn(async move {
            let Some(reply) = handler.handle(&message).await else {
                return;
            };

            if let Err(e) = client.send_message(&reply.into()).await {
                metrics.record_send_failure();
                error!("Failed to reply in chat {}: {}", message.chat.id, e);
            }
        });
    }
}
