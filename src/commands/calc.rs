//! # calc 命令实现
//!
//! θ ↔ qz 与光子能量 ↔ 波长换算。
//!
//! ## 依赖关系
//! - 使用 `cli/calc.rs` 定义的参数
//! - 使用 `reduction/qz.rs` 的换算函数

use crate::cli::calc::CalcArgs;
use crate::cli::parse_wavelength;
use crate::error::{XrrError, Result};
use crate::reduction::qz;
use crate::utils::output;

/// 执行 calc 命令
pub fn execute(args: CalcArgs) -> Result<()> {
    let wavelength = parse_wavelength(&args.wavelength)
        .ok_or_else(|| XrrError::InvalidWavelength(args.wavelength.clone()))?;

    for line in calculate(&args, wavelength)? {
        output::print_success(&line);
    }

    Ok(())
}

/// 计算所有请求的换算（末尾附当前波长对应的光子能量）
fn calculate(args: &CalcArgs, wavelength: f64) -> Result<Vec<String>> {
    let mut lines = Vec::new();

    if let Some(theta) = args.theta {
        lines.push(format!(
            "θ = {:.6}° → qz = {:.8} Å⁻¹ (λ = {:.4} Å)",
            theta,
            qz::theta_to_qz(theta, wavelength),
            wavelength
        ));
    }

    if let Some(q) = args.qz {
        lines.push(format!(
            "qz = {:.6} Å⁻¹ → θ = {:.8}° (λ = {:.4} Å)",
            q,
            qz::qz_to_theta(q, wavelength)?,
            wavelength
        ));
    }

    if let Some(energy) = args.energy {
        if energy <= 0.0 {
            return Err(XrrError::InvalidArgument(format!(
                "Photon energy must be positive, got {}",
                energy
            )));
        }
        lines.push(format!(
            "E = {:.2} eV → λ = {:.8} Å",
            energy,
            qz::energy_to_wavelength(energy)
        ));
    }

    lines.push(format!(
        "λ = {:.4} Å → E = {:.2} eV",
        wavelength,
        qz::wavelength_to_energy(wavelength)
    ));

    Ok(lines)
}
