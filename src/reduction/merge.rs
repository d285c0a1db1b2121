//! # 扫描合并
//!
//! 把两个有角度重叠的扫描拼接成一条连续曲线，以及对多个扫描依次左折叠合并。
//!
//! ## 算法概述
//! 1. 按最大 x 排成 (left, right)
//! 2. 计算重叠区间和重叠区内的点
//! 3. 未指定缩放因子时按最小二乘估计
//! 4. 重叠区总计数较大的一侧为主导，放大另一侧
//! 5. 拼接 left 的头部 + 重叠区 + right 的尾部
//!
//! ## 依赖关系
//! - 被 `reduction/pipeline.rs` 调用
//! - 使用 `reduction/overlap.rs`

use crate::error::{XrrError, Result};
use crate::models::{DataPoint, Measurement};
use crate::reduction::overlap::{canonical_order, estimate_scale, overlap_limits, overlap_points};

/// 重叠区内哪一侧占主导
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dominance {
    /// left 的重叠区总计数不小于 right，缩放 right
    LeftDominant,
    /// right 的重叠区总计数更大，缩放 left
    RightDominant,
}

impl Dominance {
    /// 由重叠区的计数差 `Σy_left - Σy_right` 的符号决定
    pub fn of(left: &[DataPoint], right: &[DataPoint]) -> Self {
        let diff: f64 = left
            .iter()
            .zip(right.iter())
            .map(|(l, r)| l.y - r.y)
            .sum();

        if diff >= 0.0 {
            Dominance::LeftDominant
        } else {
            Dominance::RightDominant
        }
    }
}

/// 合并两个扫描
///
/// `scale` 为 `None` 时由 [`estimate_scale`] 计算；`average` 为真时重叠区取两侧的逐点平均，
/// 否则取主导一侧的数据。输出继承 left 的头信息。
pub fn merge(
    a: &Measurement,
    b: &Measurement,
    scale: Option<f64>,
    average: bool,
) -> Result<Measurement> {
    let (left, right) = canonical_order(a, b);

    let window = overlap_limits(left, right)?;
    let (overlap_left, overlap_right) = overlap_points(left, right, Some(window))?;

    if overlap_left.len() != overlap_right.len() {
        return Err(XrrError::OverlapMismatch {
            operation: "merging ranges".to_string(),
            left: overlap_left.len(),
            right: overlap_right.len(),
        });
    }

    let scale = match scale {
        Some(s) => s,
        None => estimate_scale(&overlap_left, &overlap_right)?,
    };

    let mut head: Vec<DataPoint> = left
        .points()
        .iter()
        .filter(|p| p.x < window.lower)
        .copied()
        .collect();
    let mut tail: Vec<DataPoint> = right
        .points()
        .iter()
        .filter(|p| p.x > window.upper)
        .copied()
        .collect();

    let dominance = Dominance::of(&overlap_left, &overlap_right);
    log::debug!(
        "Merging [{:.4}, {:.4}] overlap ({} points): {:?}, scale {:.4}",
        window.lower,
        window.upper,
        overlap_left.len(),
        dominance,
        scale
    );

    let (overlap_left, overlap_right) = match dominance {
        Dominance::LeftDominant => {
            tail = scale_points(&tail, scale);
            (overlap_left, scale_points(&overlap_right, scale))
        }
        Dominance::RightDominant => {
            head = scale_points(&head, scale);
            (scale_points(&overlap_left, scale), overlap_right)
        }
    };

    let middle: Vec<DataPoint> = if average {
        overlap_left
            .iter()
            .zip(overlap_right.iter())
            .map(|(l, r)| l.average(r))
            .collect()
    } else {
        match dominance {
            Dominance::LeftDominant => overlap_left,
            Dominance::RightDominant => overlap_right,
        }
    };

    // 空的段直接跳过，不插入占位点
    let mut points = Vec::with_capacity(head.len() + middle.len() + tail.len());
    points.append(&mut head);
    points.extend(middle);
    points.append(&mut tail);

    Ok(left.derive(points))
}

fn scale_points(points: &[DataPoint], factor: f64) -> Vec<DataPoint> {
    points.iter().map(|p| p.scale_y(factor)).collect()
}

/// 按顺序左折叠合并多个扫描，单个扫描原样返回
pub fn merge_all(ranges: &[Measurement], average: bool) -> Result<Measurement> {
    let (first, rest) = ranges.split_first().ok_or(XrrError::EmptyInput)?;

    rest.iter()
        .try_fold(first.clone(), |merged, next| merge(&merged, next, None, average))
}
