//! Salary Bot - 薪资聚合聊天机器人
//!
//! 接收 `{dt_from, dt_upto, group_type}` 形式的 JSON 请求，按小时、天或月
//! 汇总时间范围内的薪资记录，返回可直接绘图的 `dataset` / `labels` 结果。
//! 同一聚合服务同时由 Telegram 机器人和 REST API 对外提供。

pub mod api;
pub mod bot;
pub mod config;
pub mod error;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;
