//! # xrrconv - X 射线反射率数据转换工具
//!
//! 把衍射仪记录的多段角度扫描拼接、校正并归一化为单条反射率曲线，
//! 导出为 Parratt `.dat`、CSV 或图表。
//!
//! ## 子命令
//! - `convert` - 测量文件转换（单文件、合并、批量）
//! - `calc`    - θ / qz / 能量 / 波长换算
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── parsers/   (测量文件解析)
//!   │     ├── reduction/ (拼接、校正、归一化、导出)
//!   │     ├── batch/     (批量并行处理)
//!   │     └── models/    (数据模型)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

mod batch;
mod cli;
mod commands;
mod error;
mod models;
mod parsers;
mod reduction;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    if let Err(e) = commands::run(cli.command) {
        log::debug!("{:?}", e);
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
