//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `convert`: 把测量文件转换为归一化反射率曲线
//! - `calc`: θ / qz / 能量 / 波长换算
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: convert, calc

pub mod calc;
pub mod convert;

use clap::{Parser, Subcommand};

/// xrrconv - X 射线反射率数据转换工具
#[derive(Parser)]
#[command(name = "xrrconv")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "Convert X-ray reflectometry scans into normalized reflectivity curves", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Print debug messages of every processing step (RUST_LOG overrides)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Merge, correct and normalize measurement files (.uxd, .xrdml, two-column ASCII)
    Convert(convert::ConvertArgs),

    /// Convert between theta, qz, photon energy and wavelength
    Calc(calc::CalcArgs),
}

// ─────────────────────────────────────────────────────────────
// 共用参数解析
// ─────────────────────────────────────────────────────────────

/// 预定义辐射源波长 (Å)
pub fn get_predefined_wavelength(name: &str) -> Option<f64> {
    match name.to_lowercase().as_str() {
        "cu-ka" | "cuka" => Some(1.5418),
        "cu-ka1" | "cuka1" => Some(1.5406),
        "cu-ka2" | "cuka2" => Some(1.5444),
        "cu-kb1" | "cukb1" => Some(1.3922),
        "mo-ka" | "moka" => Some(0.7107),
        "mo-ka1" | "moka1" => Some(0.7093),
        "co-ka" | "coka" => Some(1.7903),
        "fe-ka" | "feka" => Some(1.9373),
        "cr-ka" | "crka" => Some(2.2910),
        "ag-ka" | "agka" => Some(0.5609),
        _ => None,
    }
}

/// 解析波长输入（辐射源名称或数值）
pub fn parse_wavelength(input: &str) -> Option<f64> {
    // 先尝试解析为预定义辐射源
    if let Some(wl) = get_predefined_wavelength(input) {
        return Some(wl);
    }
    // 再尝试解析为正数
    input.trim().parse::<f64>().ok().filter(|wl| *wl > 0.0)
}
