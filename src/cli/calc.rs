//! # calc 子命令 CLI 定义
//!
//! θ ↔ qz 以及光子能量 ↔ 波长换算。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/calc.rs`

use clap::{ArgGroup, Args};

/// calc 子命令参数
#[derive(Args, Debug)]
#[command(group(
    ArgGroup::new("value")
        .required(true)
        .multiple(true)
        .args(["theta", "qz", "energy"])
))]
pub struct CalcArgs {
    /// Incidence angle theta in degrees (converted to qz)
    #[arg(long)]
    pub theta: Option<f64>,

    /// Momentum transfer qz in 1/Å (converted to theta)
    #[arg(long)]
    pub qz: Option<f64>,

    /// Photon energy in eV (converted to wavelength)
    #[arg(long)]
    pub energy: Option<f64>,

    /// X-ray wavelength: radiation source name (cu-ka, mo-ka, etc.) or value in Å
    #[arg(short, long, default_value = "cu-ka", env = "XRR_WAVELENGTH")]
    pub wavelength: String,
}
