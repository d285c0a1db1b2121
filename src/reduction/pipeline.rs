//! # 转换流水线
//!
//! 把一个测量集转换为单条归一化的反射率曲线。
//!
//! ## 步骤
//! 1. 合并所有信号扫描
//! 2. 合并背景扫描并扣除（若有）
//! 3. 照明校正（未使用刀口时）
//! 4. 归一化
//! 5. 转换到 qz（若启用）
//! 6. 按区间裁剪
//!
//! 任一步失败则整次转换失败，不返回部分结果。
//!
//! ## 依赖关系
//! - 被 `commands/convert.rs` 调用
//! - 使用 `reduction/` 的全部算子

use crate::error::{XrrError, Result};
use crate::models::{Measurement, MeasurementSet};
use crate::reduction::{illumination, merge, normalize, qz, subtract};

/// 执行完整转换
pub fn convert(set: &MeasurementSet) -> Result<Measurement> {
    let context = &set.context;

    if set.signals.is_empty() {
        return Err(XrrError::EmptyInput);
    }

    let mut measurement = merge::merge_all(&set.signals, context.average_overlapping)?;
    log::debug!(
        "Merged {} signal range(s) into {} points",
        set.signals.len(),
        measurement.len()
    );

    if !set.backgrounds.is_empty() {
        let background = merge::merge_all(&set.backgrounds, context.average_overlapping)?;
        measurement = subtract::subtract(&measurement, &background)?;
        log::debug!(
            "Subtracted {} background range(s): {} points left",
            set.backgrounds.len(),
            measurement.len()
        );
    }

    if !context.knife_edge {
        measurement = illumination::apply(&measurement, context);
    }

    measurement = normalize::apply(&measurement, context.normalization)?;

    if context.qz_conversion {
        measurement = qz::convert(&measurement, context);
    }

    Ok(qz::crop(&measurement, context.qz_range))
}
