use crate::config::config::{AppConfig, DatabaseType};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::PathBuf;

/// 环境变量前缀，层级用双下划线分隔，如 `SALARY_BOT_DATABASE__URL`
pub const ENV_PREFIX: &str = "SALARY_BOT_";

/// 配置加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 从默认路径加载配置
    ///
    /// 合并顺序（后者覆盖前者）：
    /// 1. 内置默认值
    /// 2. ./config.toml
    /// 3. `SALARY_BOT_*` 环境变量
    /// 4. 旧版部署使用的 `API_TOKEN` / `MONGO_URI` / `DB_NAME` / `COLLECTION_NAME`
    pub fn load() -> Result<AppConfig, figment::Error> {
        Self::figment(default_config_path()).extract()
    }

    /// 从指定路径加载配置
    pub fn load_from(path: PathBuf) -> Result<AppConfig, figment::Error> {
        Self::figment(path).extract()
    }

    fn figment(path: PathBuf) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__").global())
            .merge(legacy_env())
    }

    /// 验证配置
    pub fn validate(config: &AppConfig) -> Result<(), ConfigValidationError> {
        if !config.telegram.enabled && !config.server.enabled {
            return Err(ConfigValidationError::NoFrontend);
        }

        if config.telegram.enabled && config.telegram.token.trim().is_empty() {
            return Err(ConfigValidationError::MissingBotToken);
        }

        if config.server.enabled && config.server.port == 0 {
            return Err(ConfigValidationError::InvalidPort);
        }

        if config.database.db_type == DatabaseType::SurrealDB && config.database.url.is_empty() {
            return Err(ConfigValidationError::MissingDatabaseUrl);
        }

        if config.database.table.trim().is_empty() {
            return Err(ConfigValidationError::MissingTable);
        }

        if config.aggregation.query_timeout_secs == 0 {
            return Err(ConfigValidationError::InvalidTimeout);
        }

        Ok(())
    }
}

/// 旧版环境变量到配置键的映射
fn legacy_env() -> Env {
    Env::raw()
        .only(&["API_TOKEN", "MONGO_URI", "DB_NAME", "COLLECTION_NAME"])
        .map(|key| match key.as_str().to_ascii_uppercase().as_str() {
            "API_TOKEN" => "telegram.token".into(),
            "MONGO_URI" => "database.url".into(),
            "DB_NAME" => "database.database".into(),
            "COLLECTION_NAME" => "database.table".into(),
            _ => key.as_str().into(),
        })
}

/// 配置验证错误
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("neither the Telegram bot nor the HTTP server is enabled")]
    NoFrontend,

    #[error("telegram.token is required when the bot is enabled")]
    MissingBotToken,

    #[error("server.port must be greater than 0")]
    InvalidPort,

    #[error("database.url is not configured")]
    MissingDatabaseUrl,

    #[error("database.table is not configured")]
    MissingTable,

    #[error("aggregation.query_timeout_secs must be greater than 0")]
    InvalidTimeout,
}

/// 获取默认配置文件路径
pub fn default_config_path() -> PathBuf {
    PathBuf::from("config.toml")
}
