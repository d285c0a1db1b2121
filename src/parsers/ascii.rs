//! # 两列 ASCII 格式解析器
//!
//! 解析最简单的 `2θ cps` 两列文本数据。
//!
//! ## 格式说明
//! ```text
//! # 注释行
//! 0.200  12345.0
//! 0.210  12001.5
//! ```
//! 空行和 `#` 开头的行被忽略，多余的列被忽略。
//! 结果为单个信号扫描，无头信息、无背景；没有任何可解析的数据行时报错。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 使用
//! - 使用 `models/`

use crate::error::{XrrError, Result};
use crate::models::{DataPoint, Header, Measurement, MeasurementContext, MeasurementSet};

/// 从字符串内容解析两列 ASCII 格式
pub fn parse_ascii_content(content: &str, source: &str) -> Result<MeasurementSet> {
    let mut points = Vec::new();

    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let values: Vec<f64> = line
            .split_whitespace()
            .take(2)
            .map_while(|s| s.parse::<f64>().ok())
            .collect();

        match values.as_slice() {
            [two_theta, cps] => points.push(DataPoint::new(two_theta / 2.0, 0.0, *cps, 0.0)),
            _ => log::error!("{}: could not parse data line {}", source, lineno + 1),
        }
    }

    if points.is_empty() {
        return Err(XrrError::ParseError {
            format: "ASCII".to_string(),
            path: source.to_string(),
            reason: "no '2theta cps' data lines found".to_string(),
        });
    }

    let measurement = Measurement::new(Header::new(), points).with_source(source);

    Ok(MeasurementSet::new(
        Header::new(),
        vec![measurement],
        Vec::new(),
        MeasurementContext::default(),
    ))
}
