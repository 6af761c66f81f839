//! Handlers 模块
//!
//! HTTP 请求处理程序。

pub mod aggregation_handler;

pub use aggregation_handler::*;
