//! # 测量上下文与测量集
//!
//! `MeasurementContext` 保存一次转换的全部标量配置，
//! `MeasurementSet` 是解析器交给转换流水线的完整输入。
//!
//! ## 依赖关系
//! - 被 `parsers/`、`reduction/pipeline.rs`、`commands/convert.rs` 使用
//! - 使用 `models/measurement.rs`

use super::measurement::{Header, Measurement};
use serde::{Deserialize, Serialize};

/// 归一化方式
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Normalization {
    /// 最大计数率归一到 1
    Max,
    /// 全反射平台（第一个下降沿左侧斜率最小的点）归一到 1
    Flank,
    /// 直接乘以给定因子
    Factor(f64),
}

impl std::fmt::Display for Normalization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Normalization::Max => write!(f, "max"),
            Normalization::Flank => write!(f, "flank"),
            Normalization::Factor(v) => write!(f, "factor {}", v),
        }
    }
}

impl std::str::FromStr for Normalization {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "max" => Ok(Normalization::Max),
            "flank" => Ok(Normalization::Flank),
            // 因子必须是有限正数
            other => other
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite() && *f > 0.0)
                .map(Normalization::Factor)
                .ok_or_else(|| {
                    format!(
                        "Invalid normalization '{}'. Use 'max', 'flank' or a numeric factor",
                        s
                    )
                }),
        }
    }
}

/// 测量上下文（一次转换期间不可变）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementContext {
    /// X 射线波长（Å）
    pub wavelength: f64,
    /// 光束宽度（mm）
    pub xray_width: f64,
    /// 样品长度（mm）
    pub sample_length: f64,
    /// 是否使用刀口（使用时不做照明校正）
    pub knife_edge: bool,
    /// 重叠区域是否取平均
    pub average_overlapping: bool,
    /// 归一化方式，`None` 等价于 `Flank`
    pub normalization: Option<Normalization>,
    /// 是否转换到 qz
    pub qz_conversion: bool,
    /// 裁剪区间 `(min, max)`，单位随 `qz_conversion` 而定
    pub qz_range: (f64, f64),
}

impl Default for MeasurementContext {
    fn default() -> Self {
        MeasurementContext {
            wavelength: 1.5418,
            xray_width: 0.1,
            sample_length: 10.0,
            knife_edge: false,
            average_overlapping: false,
            normalization: None,
            qz_conversion: true,
            qz_range: (0.0, 1.0),
        }
    }
}

/// 一个文件（或多个文件合并）的全部扫描及其上下文
#[derive(Debug, Clone, Default)]
pub struct MeasurementSet {
    pub header: Header,
    pub signals: Vec<Measurement>,
    pub backgrounds: Vec<Measurement>,
    pub context: MeasurementContext,
}

impl MeasurementSet {
    pub fn new(
        header: Header,
        signals: Vec<Measurement>,
        backgrounds: Vec<Measurement>,
        context: MeasurementContext,
    ) -> Self {
        MeasurementSet {
            header,
            signals,
            backgrounds,
            context,
        }
    }

    /// 替换上下文
    pub fn with_context(mut self, context: MeasurementContext) -> Self {
        self.context = context;
        self
    }

    /// 追加另一个测量集的信号与背景扫描，头信息以本集为准
    pub fn extend(&mut self, other: MeasurementSet) {
        for (key, value) in other.header {
            self.header.entry(key).or_insert(value);
        }
        self.signals.extend(other.signals);
        self.backgrounds.extend(other.backgrounds);
    }

    /// 把所有背景扫描重新归为信号扫描
    pub fn into_signal_only(mut self) -> Self {
        self.signals.append(&mut self.backgrounds);
        self
    }

    /// 扫描总数
    pub fn range_count(&self) -> usize {
        self.signals.len() + self.backgrounds.len()
    }
}
