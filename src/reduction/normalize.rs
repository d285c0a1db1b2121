//! # 反射率归一化
//!
//! 对整条曲线的 y 和 dy 乘以同一个因子（x、dx 不变）。
//!
//! ## 归一化方式
//! - `Max`: 因子 `1 / max(y)`
//! - `Flank`: 先用数值梯度找到最陡下降点（反射率第一个下降沿），
//!   再在它左侧（全反射平台）找 |梯度| 最小的点，因子为 `1 / y[idx]`。
//!   下降沿位于第一个点（左侧无搜索空间）时退化为 `Max`
//! - `Factor(f)`: 直接乘以 `f`
//!
//! ## 依赖关系
//! - 被 `reduction/pipeline.rs` 调用
//! - 使用 `models/` 的 Measurement, Normalization

use crate::error::{XrrError, Result};
use crate::models::{Measurement, Normalization};

/// 按给定方式归一化，`None` 按 `Flank` 处理
pub fn apply(measurement: &Measurement, mode: Option<Normalization>) -> Result<Measurement> {
    let mode = mode.unwrap_or(Normalization::Flank);
    let norm = factor(measurement, mode)?;

    log::debug!("Normalization '{}': factor {:.6e}", mode, norm);

    Ok(measurement.scale_y(norm))
}

/// 计算归一化因子
pub fn factor(measurement: &Measurement, mode: Normalization) -> Result<f64> {
    match mode {
        Normalization::Factor(f) => Ok(f),
        Normalization::Max => max_factor(measurement),
        Normalization::Flank => flank_factor(measurement),
    }
}

fn max_factor(measurement: &Measurement) -> Result<f64> {
    if measurement.is_empty() {
        return Err(XrrError::EmptyCurve("normalize to the maximum".to_string()));
    }

    let max = measurement
        .points()
        .iter()
        .map(|p| p.y)
        .fold(f64::NEG_INFINITY, f64::max);

    Ok(1.0 / max)
}

fn flank_factor(measurement: &Measurement) -> Result<f64> {
    if measurement.is_empty() {
        return Err(XrrError::EmptyCurve("normalize at the flank".to_string()));
    }

    let points = measurement.points();
    let x: Vec<f64> = points.iter().map(|p| p.x).collect();
    let y: Vec<f64> = points.iter().map(|p| p.y).collect();

    let deriv = gradient(&y, &x);

    let flank_idx = match argmin(deriv.iter().copied()) {
        Some(idx) if idx > 0 => idx,
        _ => {
            log::warn!("No plateau found left of the first flank; normalizing to the maximum");
            return max_factor(measurement);
        }
    };

    // flank_idx > 0 保证左侧至少有一个点
    let idx = argmin(deriv[..flank_idx].iter().map(|d| d.abs())).unwrap_or(0);

    log::debug!(
        "Flank at x = {:.5}, plateau reference at x = {:.5}",
        x[flank_idx],
        x[idx]
    );

    Ok(1.0 / y[idx])
}

/// 数值梯度 dy/dx
///
/// 内部点用非均匀间距的二阶中心差分，两端用一阶单侧差分。
/// 少于两个点时梯度为零。
pub fn gradient(y: &[f64], x: &[f64]) -> Vec<f64> {
    let n = y.len().min(x.len());
    if n < 2 {
        return vec![0.0; n];
    }

    let mut grad = vec![0.0; n];
    grad[0] = (y[1] - y[0]) / (x[1] - x[0]);
    grad[n - 1] = (y[n - 1] - y[n - 2]) / (x[n - 1] - x[n - 2]);

    for i in 1..n - 1 {
        let hd = x[i] - x[i - 1];
        let hs = x[i + 1] - x[i];
        grad[i] = (hd * hd * y[i + 1] - hs * hs * y[i - 1] + (hs * hs - hd * hd) * y[i])
            / (hs * hd * (hd + hs));
    }

    grad
}

/// 第一个最小值的下标，忽略 NaN
fn argmin(values: impl Iterator<Item = f64>) -> Option<usize> {
    values
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .fold(None, |best: Option<(usize, f64)>, (i, v)| match best {
            Some((_, b)) if b <= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}
