//! # 数据模型模块
//!
//! 定义测量数据、测量上下文和测量集。
//!
//! ## 依赖关系
//! - 被 `parsers/`、`reduction/` 和 `commands/` 使用
//! - 子模块: measurement, context

pub mod context;
pub mod measurement;

pub use context::{MeasurementContext, MeasurementSet, Normalization};
pub use measurement::{DataPoint, Header, Measurement};
