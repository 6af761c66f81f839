//! 错误处理模块
//!
//! 定义应用程序的错误类型、用户可见消息映射和 HTTP 响应映射。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 应用程序错误类型
#[derive(Error, Debug)]
pub enum AppError {
    /// 参数取值不在允许范围内（如未知的分组类型）
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// 时间戳解析失败
    #[error("parse error: {0}")]
    Parse(String),

    /// 存储层错误（连接失败或查询失败）
    #[error("storage error: {0}")]
    Storage(String),

    /// 请求体不是合法的请求对象
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// 超时错误
    #[error("operation timed out: {0}")]
    Timeout(String),

    /// 配置错误
    #[error("configuration error: {0}")]
    Config(String),

    /// 序列化错误
    #[error("serialization error: {0}")]
    Serialization(String),

    /// 聊天传输层错误
    #[error("transport error: {0}")]
    Transport(String),

    /// 内部错误
    #[error("internal error: {0}")]
    Internal(String),

    /// IO 错误
    #[error("io error: {0}")]
    Io(String),
}

impl AppError {
    /// 面向终端用户的消息
    ///
    /// 参数类错误的文本由本服务生成，可以原样返回；存储、传输等内部错误
    /// 只返回固定文案，细节仅写入日志。
    pub fn user_message(&self) -> String {
        match self {
            AppError::InvalidArgument(msg)
            | AppError::Parse(msg)
            | AppError::MalformedRequest(msg) => msg.clone(),
            AppError::Storage(_) => "Salary storage is temporarily unavailable".to_string(),
            AppError::Timeout(_) => "Request timed out, please try again later".to_string(),
            _ => "Internal error".to_string(),
        }
    }

    /// 是否由请求方输入引起
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::InvalidArgument(_) | AppError::Parse(_) | AppError::MalformedRequest(_)
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Serialization(e.to_string())
    }
}

impl From<figment::Error> for AppError {
    fn from(e: figment::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AppError::Timeout(e.to_string())
        } else {
            AppError::Transport(e.to_string())
        }
    }
}

#[cfg(feature = "surrealdb")]
impl From<surrealdb::Error> for AppError {
    fn from(e: surrealdb::Error) -> Self {
        AppError::Storage(e.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for AppError {
    fn from(e: tokio::time::error::Elapsed) -> Self {
        AppError::Timeout(e.to_string())
    }
}

/// Axum response implementation for AppError
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = (&self).into();
        let body = Json(ErrorResponse::new(&code, &self.user_message()));
        (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body,
        )
            .into_response()
    }
}

/// 错误响应
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub code: String,
    /// 错误消息
    pub message: String,
}

impl ErrorResponse {
    /// 创建新错误响应
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
        }
    }
}

/// HTTP 状态码映射
impl From<&AppError> for (u16, String) {
    fn from(err: &AppError) -> (u16, String) {
        match err {
            AppError::InvalidArgument(_) => (400, "INVALID_ARGUMENT".to_string()),
            AppError::Parse(_) => (400, "PARSE_ERROR".to_string()),
            AppError::MalformedRequest(_) => (400, "MALFORMED_REQUEST".to_string()),
            AppError::Timeout(_) => (408, "TIMEOUT".to_string()),
            AppError::Storage(_) => (503, "STORAGE_UNAVAILABLE".to_string()),
            _ => (500, "INTERNAL_ERROR".to_string()),
        }
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AppError>;
