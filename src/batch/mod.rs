//! # 批量处理模块
//!
//! 提供统一的文件批量转换能力。
//!
//! ## 功能
//! - 收集匹配文件列表
//! - 并行处理（每个文件独立转换，互不共享可变状态）
//! - 进度反馈与统计
//!
//! ## 依赖关系
//! - 被 `commands/convert.rs` 使用
//! - 使用 `rayon` 进行并行处理
//! - 使用 `indicatif` 显示进度

pub mod collector;
pub mod runner;

pub use collector::FileCollector;
pub use runner::{BatchRunner, ProcessResult};
