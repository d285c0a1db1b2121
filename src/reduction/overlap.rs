//! # 重叠区域与缩放因子
//!
//! 两个扫描在角度轴上的重叠区间、左右规范顺序，以及重叠区内的最小二乘缩放因子。
//!
//! ## 缩放因子
//! 对重叠区内逐点对应的 `f`、`g`，最小化
//! `Σ |f(xᵢ) - α·g(xᵢ)|²` 的解为 `α = Σf / Σg`。
//! 若 `α < 1` 则取倒数，保证返回值总是 `>= 1`，
//! 用来把重叠区总和较小的曲线放大到较大的一条。
//!
//! ## 依赖关系
//! - 被 `reduction/merge.rs`、`reduction/subtract.rs` 调用
//! - 使用 `models/measurement.rs`

use crate::error::{XrrError, Result};
use crate::models::{DataPoint, Measurement};

/// 重叠区间（闭区间 `[lower, upper]`）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlapWindow {
    pub upper: f64,
    pub lower: f64,
}

impl OverlapWindow {
    pub fn contains(&self, x: f64) -> bool {
        self.lower <= x && x <= self.upper
    }
}

/// 计算两个测量在 x 上的交集
///
/// 对称：`overlap_limits(a, b) == overlap_limits(b, a)`。
pub fn overlap_limits(a: &Measurement, b: &Measurement) -> Result<OverlapWindow> {
    // 空测量的范围记为 NaN，同样视为无重叠
    let (min_a, max_a) = a.x_range().unwrap_or((f64::NAN, f64::NAN));
    let (min_b, max_b) = b.x_range().unwrap_or((f64::NAN, f64::NAN));

    let window = OverlapWindow {
        upper: max_a.min(max_b),
        lower: min_a.max(min_b),
    };

    let disjoint = a.is_empty() || b.is_empty() || window.upper < window.lower;
    if disjoint {
        return Err(XrrError::NoOverlap {
            lower_a: min_a,
            upper_a: max_a,
            lower_b: min_b,
            upper_b: max_b,
        });
    }

    Ok(window)
}

/// 返回 `(left, right)`，使 left 的最大 x 不超过 right 的最大 x
pub fn canonical_order<'a>(
    a: &'a Measurement,
    b: &'a Measurement,
) -> (&'a Measurement, &'a Measurement) {
    let max_a = a.x_range().map_or(f64::NEG_INFINITY, |(_, max)| max);
    let max_b = b.x_range().map_or(f64::NEG_INFINITY, |(_, max)| max);

    if max_a <= max_b {
        (a, b)
    } else {
        (b, a)
    }
}

/// 提取两个测量中 x 落在重叠区间内的点（保持原顺序）
///
/// 未给出 `region` 时由 [`overlap_limits`] 计算。
pub fn overlap_points(
    a: &Measurement,
    b: &Measurement,
    region: Option<OverlapWindow>,
) -> Result<(Vec<DataPoint>, Vec<DataPoint>)> {
    let region = match region {
        Some(r) => r,
        None => overlap_limits(a, b)?,
    };

    Ok((points_within(a, &region), points_within(b, &region)))
}

fn points_within(ms: &Measurement, region: &OverlapWindow) -> Vec<DataPoint> {
    ms.points()
        .iter()
        .filter(|p| region.contains(p.x))
        .copied()
        .collect()
}

/// 估计缩放因子 `α >= 1`
///
/// 两个重叠序列必须逐点对应（长度相同），不做重采样。
pub fn estimate_scale(left: &[DataPoint], right: &[DataPoint]) -> Result<f64> {
    if left.len() != right.len() {
        return Err(XrrError::OverlapMismatch {
            operation: "estimating the scale factor".to_string(),
            left: left.len(),
            right: right.len(),
        });
    }

    let sum_left: f64 = left.iter().map(|p| p.y).sum();
    let sum_right: f64 = right.iter().map(|p| p.y).sum();

    let alpha = sum_left / sum_right;
    if alpha < 1.0 {
        Ok(1.0 / alpha)
    } else {
        Ok(alpha)
    }
}
