//! # Bruker UXD 格式解析器
//!
//! 解析衍射仪导出的 UXD 文本文件。
//!
//! ## UXD 格式说明
//! ```text
//! ; 全局注释
//! _FILEVERSION=1
//! _SAMPLE=Si wafer
//! ; (Data for Range number 1)
//! _STEPSIZE=0.01
//! _2THETACPS
//! 0.200  12345.0
//! 0.210  12001.5
//! ; (Data for Range number 2)
//! ...
//! ```
//! 第一个 `; (Data for Range number` 之前为全局头，之后每一段是一次扫描：
//! `_2THETACPS` 之前为扫描头，之后为 `2θ cps` 数据行。
//! 多于一个扫描时最后一个视为背景扫描。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 使用
//! - 使用 `models/`

use crate::error::{XrrError, Result};
use crate::models::{DataPoint, Header, Measurement, MeasurementContext, MeasurementSet};

use regex::Regex;

/// 扫描段起始标记
const RANGE_MARKER: &str = r"^;\s*\(Data for Range number\s*(\d*)";
/// 数据段起始标记
const DATA_MARKER: &str = "_2THETACPS";

/// 从字符串内容解析 UXD 格式
pub fn parse_uxd_content(content: &str, source: &str) -> Result<MeasurementSet> {
    let marker = Regex::new(RANGE_MARKER).map_err(|e| XrrError::Other(e.to_string()))?;

    // blocks[0] 为全局头，其余每块为一个扫描
    let mut blocks: Vec<Vec<&str>> = vec![Vec::new()];
    for line in content.lines() {
        if let Some(caps) = marker.captures(line) {
            log::debug!(
                "{}: range block {}",
                source,
                caps.get(1).map_or("?", |m| m.as_str())
            );
            blocks.push(Vec::new());
        }
        if let Some(block) = blocks.last_mut() {
            block.push(line);
        }
    }

    let global = blocks.remove(0);
    let header = parse_header(&global, source);

    if blocks.is_empty() {
        log::error!("{}: no measurement ranges found", source);
    }

    let mut signals: Vec<Measurement> = blocks
        .iter()
        .map(|block| parse_range(block, source))
        .collect();

    let mut backgrounds = Vec::new();
    if signals.len() > 1 {
        backgrounds.extend(signals.pop());
    }

    Ok(MeasurementSet::new(
        header,
        signals,
        backgrounds,
        MeasurementContext::default(),
    ))
}

/// 解析单个扫描段
fn parse_range(block: &[&str], source: &str) -> Measurement {
    let split = block
        .iter()
        .position(|line| line.trim_start().starts_with(DATA_MARKER));

    let (header_lines, data_lines) = match split {
        Some(idx) => (&block[..idx], &block[idx + 1..]),
        None => (block, &block[block.len()..]),
    };

    let headers = parse_header(header_lines, source);
    let points = data_lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match parse_data_line(line) {
            Some(point) => Some(point),
            None => {
                log::error!("{}: could not parse data line '{}'", source, line.trim());
                None
            }
        })
        .collect();

    Measurement::new(headers, points).with_source(source)
}

/// 解析 `_KEY=VALUE` 头信息行
///
/// `;` 开头的行为注释；无法拆成一个键一个值的行记录警告后跳过。
fn parse_header(lines: &[&str], source: &str) -> Header {
    let mut header = Header::new();

    for line in lines {
        let line = line.trim();
        if line.starts_with(';') || !line.starts_with('_') {
            continue;
        }

        let parts: Vec<&str> = line.split('=').collect();
        if parts.len() != 2 {
            log::warn!("{}: could not parse header line '{}'", source, line);
            continue;
        }

        header.insert(parts[0][1..].trim().to_string(), parts[1].trim().to_string());
    }

    header
}

/// 解析 `2θ cps` 数据行，θ = 2θ / 2
fn parse_data_line(line: &str) -> Option<DataPoint> {
    let normalized = line.replace(',', ".");
    let parts: Vec<&str> = normalized.split_whitespace().collect();
    if parts.len() != 2 {
        return None;
    }

    let two_theta: f64 = parts[0].parse().ok()?;
    let cps: f64 = parts[1].parse().ok()?;

    Some(DataPoint::new(two_theta / 2.0, 0.0, cps, 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"; global comment
_FILEVERSION=1
_SAMPLE=Si wafer
_BROKEN=a=b
; (Data for Range number 1)
_STEPSIZE=0.02
_2THETACPS
0.200  1000.0
0.240  900,5
0.280  0
; (Data for Range number 2)
_STEPSIZE=0.02
_2THETACPS
0.240  90.0
0.280  80.0
0.320  70.0
garbage line here
; (Data for Range number 3)
_2THETACPS
0.200  1.0
0.320  2.0
"#;

    #[test]
    fn test_parse_uxd_ranges() {
        let set = parse_uxd_content(SAMPLE, "sample.uxd").unwrap();

        assert_eq!(set.header.get("FILEVERSION").map(String::as_str), Some("1"));
        assert_eq!(set.header.get("SAMPLE").map(String::as_str), Some("Si wafer"));
        assert!(!set.header.contains_key("BROKEN"));

        assert_eq!(set.signals.len(), 2);
        assert_eq!(set.backgrounds.len(), 1);

        let first = &set.signals[0];
        assert_eq!(first.headers().get("STEPSIZE").map(String::as_str), Some("0.02"));
        // cps = 0 的点被丢弃，逗号小数被接受
        assert_eq!(first.len(), 2);
        assert_eq!(first.points()[0], DataPoint::new(0.1, 0.0, 1000.0, 0.0));
        assert_eq!(first.points()[1].y, 900.5);
        assert_eq!(first.source(), Some("sample.uxd"));

        // 无法解析的行被跳过
        assert_eq!(set.signals[1].len(), 3);
        assert_eq!(set.backgrounds[0].len(), 2);
    }

    #[test]
    fn test_single_range_has_no_background() {
        let content = "; (Data for Range number 1)\n_2THETACPS\n1.0 5.0\n1.2 4.0\n";
        let set = parse_uxd_content(content, "single.uxd").unwrap();

        assert_eq!(set.signals.len(), 1);
        assert!(set.backgrounds.is_empty());
        assert_eq!(set.signals[0].points()[1].x, 0.6);
    }

    #[test]
    fn test_no_ranges() {
        let set = parse_uxd_content("_SAMPLE=x\n", "empty.uxd").unwrap();
        assert!(set.signals.is_empty());
        assert!(set.backgrounds.is_empty());
    }
}
