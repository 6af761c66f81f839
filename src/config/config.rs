use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 记录存储后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// SurrealDB
    #[default]
    SurrealDB,
    /// 进程内存储（开发与测试）
    Memory,
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// 存储后端
    pub db_type: DatabaseType,
    /// SurrealDB 连接地址
    pub url: String,
    /// 命名空间
    pub namespace: String,
    /// 数据库名称
    pub database: String,
    /// 薪资记录表名
    pub table: String,
    /// 用户名
    pub username: String,
    /// 密码
    pub password: String,
    /// 启动时导入的 JSON 记录文件
    pub seed_file: Option<PathBuf>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: DatabaseType::SurrealDB,
            url: "http://localhost:8000".into(),
            namespace: "salary_bot".into(),
            database: "salaries".into(),
            table: "sample_collection".into(),
            username: "root".into(),
            password: "root".into(),
            seed_file: None,
        }
    }
}

/// Telegram 机器人配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// 是否启动机器人
    pub enabled: bool,
    /// Bot API 令牌
    pub token: String,
    /// Bot API 地址
    pub api_url: String,
    /// 长轮询等待时间（秒）
    pub poll_timeout_secs: u64,
    /// 轮询失败后的退避时间（秒）
    pub retry_delay_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            token: String::new(),
            api_url: "https://api.telegram.org".into(),
            poll_timeout_secs: 30,
            retry_delay_secs: 5,
        }
    }
}

/// 聚合配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// 是否在结果末尾追加一个值为 0 的合成分桶（最后标签 + 1 小时）
    pub trailing_bucket: bool,
    /// 调用方对单次聚合施加的超时（秒）
    pub query_timeout_secs: u64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            trailing_bucket: false,
            query_timeout_secs: 30,
        }
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 是否启动 HTTP 接口
    pub enabled: bool,
    /// 服务地址
    pub host: String,
    /// 服务端口
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "0.0.0.0".into(),
            port: 8080,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别（RUST_LOG 优先）
    pub level: String,
    /// 结构化（JSON）日志格式
    pub structured: bool,
    /// 日志文件目录，按天滚动
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            structured: false,
            log_dir: None,
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// 数据库配置
    pub database: DatabaseConfig,
    /// Telegram 配置
    pub telegram: TelegramConfig,
    /// 聚合配置
    pub aggregation: AggregationConfig,
    /// 服务器配置
    pub server: ServerConfig,
    /// 日志配置
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// 创建开发环境配置
    pub fn development() -> Self {
        let mut config = Self::default();
        config.database.db_type = DatabaseType::Memory;
        config.telegram.enabled = false;
        config.server.enabled = true;
        config.logging.level = "debug".into();
        config
    }

    /// 创建生产环境配置
    pub fn production() -> Self {
        let mut config = Self::default();
        config.logging.structured = true;
        config.logging.log_dir = Some(PathBuf::from("./logs"));
        config
    }
}
