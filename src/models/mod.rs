//! 核心数据模型模块
//!
//! 定义薪资记录、分组粒度、聚合请求与聚合结果。

pub mod aggregation;
pub mod record;

pub use aggregation::*;
pub use record::*;
