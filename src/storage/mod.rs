//! 存储层模块
//!
//! 提供薪资记录的只读聚合查询，支持 SurrealDB 与进程内存储。

#[cfg(feature = "surrealdb")]
pub mod surrealdb;

pub mod factory;
pub mod memory;
pub mod repository;

pub use factory::{StorageFactory, StorageInstance};
pub use memory::MemoryRecordStore;
pub use repository::RecordStore;
