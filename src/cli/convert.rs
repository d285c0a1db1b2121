//! # convert 子命令 CLI 定义
//!
//! 把一个或多个测量文件（或目录）转换为归一化反射率曲线。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/convert.rs`

use crate::models::Normalization;

use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// 支持的输出格式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Parratt data file (tab separated, scientific notation)
    Dat,
    /// CSV data file (x, dx, R, dR)
    Csv,
    /// PNG image of the reflectivity curve
    Png,
    /// SVG vector image of the reflectivity curve
    Svg,
}

impl OutputFormat {
    /// 输出文件扩展名
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Dat => "dat",
            OutputFormat::Csv => "csv",
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// convert 子命令参数
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input measurement files or directories
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output: file path (single/combined mode) or directory (batch mode)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format (auto-detected from extension if not specified)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Also write a plot of the final curve (PNG or SVG, by extension)
    #[arg(long)]
    pub plot: Option<PathBuf>,

    // ─────────────────────────────────────────────────────────────
    // 测量上下文
    // ─────────────────────────────────────────────────────────────
    /// X-ray wavelength: radiation source name (cu-ka, mo-ka, etc.) or value in Å
    #[arg(short, long, default_value = "cu-ka", env = "XRR_WAVELENGTH")]
    pub wavelength: String,

    /// X-ray beam width in mm
    #[arg(long, default_value_t = 0.1, env = "XRR_BEAM_WIDTH")]
    pub beam_width: f64,

    /// Sample length in mm
    #[arg(long, default_value_t = 10.0, env = "XRR_SAMPLE_LENGTH")]
    pub sample_length: f64,

    /// A knife edge was used (disables the illumination correction)
    #[arg(long, default_value_t = false)]
    pub knife_edge: bool,

    /// Average both ranges in overlapping regions instead of keeping the dominant one
    #[arg(long, default_value_t = false)]
    pub average: bool,

    /// Normalization: 'max', 'flank' or a numeric scale factor
    #[arg(short, long, default_value = "flank")]
    pub normalization: Normalization,

    /// Keep the angle axis (theta in degrees) instead of converting to qz
    #[arg(long, default_value_t = false)]
    pub no_qz: bool,

    /// Crop range "min:max" (qz in 1/Å, or degrees with --no-qz)
    #[arg(short, long, default_value = "0:1")]
    pub range: String,

    /// Treat every range as signal (the last range is not a background scan)
    #[arg(long, default_value_t = false)]
    pub no_background: bool,

    /// Combine all inputs into one conversion instead of converting each file
    #[arg(long, default_value_t = false)]
    pub combine: bool,

    // ─────────────────────────────────────────────────────────────
    // 图表参数
    // ─────────────────────────────────────────────────────────────
    /// Figure width in pixels (for PNG) or points (for SVG)
    #[arg(long, default_value_t = 1200)]
    pub width: u32,

    /// Figure height in pixels (for PNG) or points (for SVG)
    #[arg(long, default_value_t = 800)]
    pub height: u32,

    /// Title for the plot (default: input file name)
    #[arg(long)]
    pub title: Option<String>,

    // ─────────────────────────────────────────────────────────────
    // 批量处理参数
    // ─────────────────────────────────────────────────────────────
    /// Glob pattern for input files in directories (e.g., "*.uxd,*.txt")
    #[arg(long, default_value = "*.uxd,*.UXD")]
    pub pattern: String,

    /// Number of parallel jobs (0 = auto, batch mode only)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,

    /// Recurse into subdirectories
    #[arg(long, default_value_t = false)]
    pub recursive: bool,

    /// Overwrite existing output files
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,
}
