//! 存储工厂模块
//!
//! 根据配置创建相应的记录存储实例，并导入可选的种子数据。

use crate::config::config::{DatabaseConfig, DatabaseType};
use crate::error::{AppError, Result};
use crate::models::record::SalaryRecord;
use crate::storage::memory::MemoryRecordStore;
use crate::storage::repository::RecordStore;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[cfg(feature = "surrealdb")]
use crate::storage::repository::SurrealRecordStore;
#[cfg(feature = "surrealdb")]
use crate::storage::surrealdb::SurrealPool;

/// 存储实例枚举
pub enum StorageInstance {
    #[cfg(feature = "surrealdb")]
    SurrealDB {
        pool: SurrealPool,
        store: Arc<SurrealRecordStore>,
    },
    Memory(Arc<MemoryRecordStore>),
}

impl StorageInstance {
    /// 供聚合服务注入的存储句柄
    pub fn record_store(&self) -> Arc<dyn RecordStore> {
        match self {
            #[cfg(feature = "surrealdb")]
            StorageInstance::SurrealDB { store, .. } => store.clone(),
            StorageInstance::Memory(store) => store.clone(),
        }
    }

    /// 释放底层连接
    pub async fn close(&self) {
        match self {
            #[cfg(feature = "surrealdb")]
            StorageInstance::SurrealDB { pool, .. } => pool.close().await,
            StorageInstance::Memory(_) => {}
        }
    }
}

/// 存储工厂
pub struct StorageFactory;

impl StorageFactory {
    /// 根据配置创建存储实例
    pub async fn create(config: &DatabaseConfig) -> Result<StorageInstance> {
        let instance = match config.db_type {
            #[cfg(feature = "surrealdb")]
            DatabaseType::SurrealDB => {
                let pool = SurrealPool::new(config.clone()).await?;
                let store = Arc::new(SurrealRecordStore::new(pool.clone(), &config.table));
                StorageInstance::SurrealDB { pool, store }
            }
            #[cfg(not(feature = "surrealdb"))]
            DatabaseType::SurrealDB => {
                return Err(AppError::Config(
                    "SurrealDB feature is not enabled. Enable 'surrealdb' feature or use db_type = \"memory\"."
                        .into(),
                ));
            }
            DatabaseType::Memory => {
                info!("Using in-memory record store");
                StorageInstance::Memory(Arc::new(MemoryRecordStore::new()))
            }
        };

        if let Some(path) = &config.seed_file {
            let imported = Self::seed(instance.record_store().as_ref(), path).await?;
            info!("Imported {} records from {}", imported, path.display());
        }

        Ok(instance)
    }

    /// 从 JSON 数组文件导入记录
    pub async fn seed(store: &dyn RecordStore, path: &Path) -> Result<usize> {
        let content = tokio::fs::read_to_string(path).await?;
        let records: Vec<SalaryRecord> = serde_json::from_str(&content).map_err(|e| {
            AppError::Config(format!("invalid seed file {}: {}", path.display(), e))
        })?;

        for record in &records {
            store.insert(record).await?;
        }

        Ok(records.len())
    }

    /// 检查存储是否可用
    pub async fn health_check(store: &dyn RecordStore) -> Result<bool> {
        store.ping().await?;
        Ok(true)
    }
}
