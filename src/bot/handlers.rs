//! 机器人消息处理
//!
//! `/start` 回复问候语；其他文本按 JSON 聚合请求处理。处理结果以 [`Reply`]
//! 返回，由轮询循环负责发送。

use serde_json::error::Category;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::bot::markdown::escape_markdown;
use crate::bot::telegram::{Message, ParseMode, ReplyParameters, SendMessage};
use crate::error::{AppError, Result};
use crate::models::aggregation::{AggregationQuery, AggregationResult};
use crate::observability::AppMetrics;
use crate::services::aggregation::AggregationService;

/// 待发送的回复
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub chat_id: i64,
    pub text: String,
    pub parse_mode: Option<ParseMode>,
    /// 引用回复的原消息
    pub reply_to: Option<i64>,
}

impl From<Reply> for SendMessage {
    fn from(reply: Reply) -> Self {
        SendMessage {
            chat_id: reply.chat_id,
            text: reply.text,
            parse_mode: reply.parse_mode,
            reply_parameters: reply
                .reply_to
                .map(|message_id| ReplyParameters { message_id }),
        }
    }
}

/// 消息处理器
pub struct BotHandler {
    service: Arc<dyn AggregationService>,
    metrics: Arc<AppMetrics>,
    query_timeout: Duration,
}

impl BotHandler {
    pub fn new(
        service: Arc<dyn AggregationService>,
        metrics: Arc<AppMetrics>,
        query_timeout: Duration,
    ) -> Self {
        Self {
            service,
            metrics,
            query_timeout,
        }
    }

    /// 处理一条消息；非文本消息不回复
    pub async fn handle(&self, message: &Message) -> Option<Reply> {
        let text = message.text.as_deref()?;

        if is_start_command(text) {
            return Some(self.handle_start(message));
        }

        Some(self.handle_message(message, text).await)
    }

    /// `/start` 问候
    pub fn handle_start(&self, message: &Message) -> Reply {
        let greeting = match &message.from {
            Some(user) => {
                let first_name = escape_markdown(&user.first_name);
                if user.username.is_some() {
                    format!("[{}](tg://user?id={})", first_name, user.id)
                } else {
                    first_name
                }
            }
            None => "there".to_string(),
        };

        Reply {
            chat_id: message.chat.id,
            text: format!("Hi {}\\!", greeting),
            parse_mode: Some(ParseMode::MarkdownV2),
            reply_to: None,
        }
    }

    /// JSON 聚合请求
    ///
    /// 成功时直接发送结果 JSON；失败时引用原消息回复错误文案。
    /// 错误文案为纯文本，内部细节只写日志。
    pub async fn handle_message(&self, message: &Message, text: &str) -> Reply {
        let chat_id = message.chat.id;

        let query = match parse_query(text) {
            Ok(query) => query,
            Err(QueryError::InvalidJson) => {
                info!("Chat {} sent a message that is not JSON", chat_id);
                return error_reply(message, "Error: Invalid JSON format".to_string());
            }
            Err(QueryError::Malformed(err)) => {
                info!("Chat {} sent a malformed request: {}", chat_id, err);
                return error_reply(message, format!("Error: {}", err.user_message()));
            }
        };

        info!(
            "Chat {} requested {} aggregation from {} to {}",
            chat_id, query.group_type, query.dt_from, query.dt_upto
        );

        let start = Instant::now();
        let outcome = self.run_aggregation(&query).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        self.metrics.record_aggregation(elapsed_ms, outcome.is_ok());

        match outcome.and_then(|result| Ok(serde_json::to_string(&result)?)) {
            Ok(body) => Reply {
                chat_id,
                text: body,
                parse_mode: Some(ParseMode::Markdown),
                reply_to: None,
            },
            Err(err) => {
                if err.is_client_error() {
                    info!("Rejected request from chat {}: {}", chat_id, err);
                } else {
                    warn!("Aggregation failed for chat {}: {}", chat_id, err);
                }
                error_reply(message, format!("Error: {}", err.user_message()))
            }
        }
    }

    async fn run_aggregation(&self, query: &AggregationQuery) -> Result<AggregationResult> {
        tokio::time::timeout(
            self.query_timeout,
            self.service
                .aggregate(&query.dt_from, &query.dt_upto, &query.group_type),
        )
        .await?
    }
}

enum QueryError {
    InvalidJson,
    Malformed(AppError),
}

/// 区分非 JSON 文本与字段缺失、类型不符的 JSON
fn parse_query(text: &str) -> std::result::Result<AggregationQuery, QueryError> {
    serde_json::from_str(text).map_err(|e| match e.classify() {
        Category::Syntax | Category::Eof => QueryError::InvalidJson,
        Category::Data | Category::Io => QueryError::Malformed(AppError::MalformedRequest(
            e.to_string(),
        )),
    })
}

fn is_start_command(text: &str) -> bool {
    let command = text.split_whitespace().next().unwrap_or_default();
    command == "/start" || command.starts_with("/start@")
}

fn error_reply(message: &Message, text: String) -> Reply {
    Reply {
        chat_id: message.chat.id,
        text,
        parse_mode: None,
        reply_to: Some(message.message_id),
    }
}
