//! # 测量数据模型
//!
//! 一次角度扫描（range）的数据点序列。
//!
//! ## 数据点
//! 每个点是 `(x, dx, y, dy)`：
//! - `x`: 入射角 θ（度），qz 转换后为动量传递（Å⁻¹）
//! - `dx`: x 的误差
//! - `y`: 计数率 (cps)，归一化后为反射率
//! - `dy`: y 的误差
//!
//! ## 不变量
//! `y <= 0`（以及 NaN）的点视为仪器伪影，在构造时丢弃，之后不会再出现。
//! 点的顺序保持文件/扫描顺序，不保证按 x 单调。
//!
//! ## 依赖关系
//! - 被 `parsers/`、`reduction/` 使用
//! - 无外部模块依赖

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 头信息（键值对元数据）
pub type Header = BTreeMap<String, String>;

/// 单个数据点 `(x, dx, y, dy)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub x: f64,
    pub dx: f64,
    pub y: f64,
    pub dy: f64,
}

impl DataPoint {
    pub fn new(x: f64, dx: f64, y: f64, dy: f64) -> Self {
        DataPoint { x, dx, y, dy }
    }

    /// 按 `(1, factor, factor)` 缩放 `(x, y, dy)`，x 和 dx 不变
    pub fn scale_y(&self, factor: f64) -> Self {
        DataPoint {
            y: self.y * factor,
            dy: self.dy * factor,
            ..*self
        }
    }

    /// 逐分量平均
    pub fn average(&self, other: &DataPoint) -> Self {
        DataPoint {
            x: 0.5 * (self.x + other.x),
            dx: 0.5 * (self.dx + other.dx),
            y: 0.5 * (self.y + other.y),
            dy: 0.5 * (self.dy + other.dy),
        }
    }
}

/// 一次扫描的测量数据
///
/// 所有变换都返回新的 `Measurement`，不修改输入。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Measurement {
    headers: Header,
    points: Vec<DataPoint>,
    source: Option<String>,
}

impl Measurement {
    /// 创建测量，丢弃 `y <= 0` 的点
    pub fn new(headers: Header, points: Vec<DataPoint>) -> Self {
        let points = points.into_iter().filter(|p| p.y > 0.0).collect();
        Measurement {
            headers,
            points,
            source: None,
        }
    }

    /// 设置来源文件标记
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// 用新的数据点构造一个继承本测量头信息和来源的测量
    pub fn derive(&self, points: Vec<DataPoint>) -> Self {
        Measurement {
            source: self.source.clone(),
            ..Measurement::new(self.headers.clone(), points)
        }
    }

    pub fn headers(&self) -> &Header {
        &self.headers
    }

    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// x 的取值范围 `(min, max)`，空测量返回 `None`
    pub fn x_range(&self) -> Option<(f64, f64)> {
        if self.points.is_empty() {
            return None;
        }
        let min = self.points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let max = self
            .points
            .iter()
            .map(|p| p.x)
            .fold(f64::NEG_INFINITY, f64::max);
        Some((min, max))
    }

    /// 整条曲线按因子缩放 y 和 dy
    pub fn scale_y(&self, factor: f64) -> Self {
        self.derive(self.points.iter().map(|p| p.scale_y(factor)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_positive_counts_dropped() {
        let ms = Measurement::new(
            Header::new(),
            vec![
                DataPoint::new(0.1, 0.0, 10.0, 1.0),
                DataPoint::new(0.2, 0.0, 0.0, 0.0),
                DataPoint::new(0.3, 0.0, -4.0, 0.0),
                DataPoint::new(0.4, 0.0, f64::NAN, 0.0),
                DataPoint::new(0.5, 0.0, 2.0, 0.5),
            ],
        );
        assert_eq!(ms.len(), 2);
        assert_eq!(ms.points()[0].x, 0.1);
        assert_eq!(ms.points()[1].x, 0.5);
    }

    #[test]
    fn test_x_range_ignores_order() {
        let ms = Measurement::new(
            Header::new(),
            vec![
                DataPoint::new(0.7, 0.0, 1.0, 0.0),
                DataPoint::new(0.2, 0.0, 1.0, 0.0),
                DataPoint::new(0.9, 0.0, 1.0, 0.0),
            ],
        );
        assert_eq!(ms.x_range(), Some((0.2, 0.9)));
        assert_eq!(Measurement::default().x_range(), None);
    }

    #[test]
    fn test_scale_keeps_input_untouched() {
        let mut headers = Header::new();
        headers.insert("SAMPLE".to_string(), "Si".to_string());
        let ms = Measurement::new(headers, vec![DataPoint::new(0.5, 0.01, 4.0, 2.0)])
            .with_source("scan.uxd");

        let scaled = ms.scale_y(0.5);

        assert_eq!(ms.points()[0].y, 4.0);
        assert_eq!(scaled.points()[0], DataPoint::new(0.5, 0.01, 2.0, 1.0));
        assert_eq!(scaled.headers().get("SAMPLE").map(String::as_str), Some("Si"));
        assert_eq!(scaled.source(), Some("scan.uxd"));
    }
}
