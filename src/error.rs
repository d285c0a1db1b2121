//! # 统一错误处理模块
//!
//! 定义 xrrconv 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// xrrconv 统一错误类型
#[derive(Error, Debug)]
pub enum XrrError {
    // ─────────────────────────────────────────────────────────────
    // 数据处理错误
    // ─────────────────────────────────────────────────────────────
    #[error("No overlap between ranges: [{lower_a}, {upper_a}] and [{lower_b}, {upper_b}]")]
    NoOverlap {
        lower_a: f64,
        upper_a: f64,
        lower_b: f64,
        upper_b: f64,
    },

    #[error("Overlap regions differ in size ({left} vs {right} points) while {operation}")]
    OverlapMismatch {
        operation: String,
        left: usize,
        right: usize,
    },

    #[error("Cannot convert: no signal range was given")]
    EmptyInput,

    #[error("Cannot {0}: the curve has no data points left")]
    EmptyCurve(String),

    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid range format: {0}")]
    InvalidRange(String),

    #[error("Invalid wavelength '{0}'. Use a number in Å (e.g., 1.5418) or a name: cu-ka, mo-ka, co-ka, fe-ka, cr-ka, ag-ka")]
    InvalidWavelength(String),

    // ─────────────────────────────────────────────────────────────
    // 输出错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Plotting failed: {0}")]
    PlotError(String),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, XrrError>;
