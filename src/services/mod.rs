//! 服务模块

pub mod aggregation;

pub use aggregation::{
    AggregationOptions, AggregationService, SalaryAggregator, create_aggregation_service,
};
