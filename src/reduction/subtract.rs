//! # 背景扣除
//!
//! 在信号与背景的重叠区间内逐点计算 `signal - background`。
//! 结果只覆盖重叠区间；背景自身的误差不传播（dy 取信号的 dy）。
//!
//! ## 依赖关系
//! - 被 `reduction/pipeline.rs` 调用
//! - 使用 `reduction/overlap.rs`

use crate::error::{XrrError, Result};
use crate::models::{DataPoint, Measurement};
use crate::reduction::overlap::overlap_points;

/// 从信号中扣除背景
///
/// 背景覆盖不全时丢弃覆盖范围外的信号点并记录警告。
pub fn subtract(signal: &Measurement, background: &Measurement) -> Result<Measurement> {
    let (overlap_signal, overlap_background) = overlap_points(signal, background, None)?;

    if overlap_signal.len() < signal.len() {
        log::warn!(
            "Background covers only {} of {} signal points; dropping the rest",
            overlap_signal.len(),
            signal.len()
        );
    }

    if overlap_signal.len() != overlap_background.len() {
        return Err(XrrError::OverlapMismatch {
            operation: "subtracting the background".to_string(),
            left: overlap_signal.len(),
            right: overlap_background.len(),
        });
    }

    let points = overlap_signal
        .iter()
        .zip(overlap_background.iter())
        .map(|(s, b)| DataPoint { y: s.y - b.y, ..*s })
        .collect();

    Ok(signal.derive(points))
}
