//! # PANalytical XRDML 格式解析器
//!
//! 解析 XRDML（XML）测量文件。
//!
//! ## 格式说明
//! ```text
//! <xrdMeasurements>
//!   <xrdMeasurement>
//!     <scan>
//!       <dataPoints>
//!         <positions axis="2Theta" unit="deg">
//!           <startPosition>0.1</startPosition>
//!           <endPosition>0.5</endPosition>
//!         </positions>
//!         <counts unit="counts">120 98 77</counts>
//!       </dataPoints>
//!     </scan>
//!   </xrdMeasurement>
//! </xrdMeasurements>
//! ```
//! 每个 `<scan>` 为一个信号扫描，没有背景扫描。
//! 2θ 轴取 `commonPosition`（常数）、`listPositions`（逐点列表）
//! 或 `startPosition`/`endPosition`（按点数等间距）之一，除以 2 得到 θ。
//! 数据点为 `(θ, 0, counts, 0)`。标签按本地名匹配，忽略命名空间。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 使用
//! - 使用 `models/`
//! - 使用 `roxmltree` 读取 XML

use crate::error::{XrrError, Result};
use crate::models::{DataPoint, Header, Measurement, MeasurementContext, MeasurementSet};

use roxmltree::{Document, Node};

const AXIS_2THETA: &str = "2Theta";

/// 从字符串内容解析 XRDML 格式
pub fn parse_xrdml_content(content: &str, source: &str) -> Result<MeasurementSet> {
    let doc = Document::parse(content).map_err(|e| parse_error(source, e.to_string()))?;
    let root = doc.root_element();

    let measurements: Vec<Node> = if root.has_tag_name("xrdMeasurement") {
        vec![root]
    } else {
        children(root, "xrdMeasurement").collect()
    };

    let measurement = match measurements.as_slice() {
        [single] => *single,
        [] => return Err(parse_error(source, "no <xrdMeasurement> entry".to_string())),
        _ => {
            return Err(parse_error(
                source,
                format!("{} <xrdMeasurement> entries, expected one", measurements.len()),
            ))
        }
    };

    let signals = children(measurement, "scan")
        .enumerate()
        .map(|(i, scan)| {
            parse_scan(scan, source).map_err(|reason| {
                parse_error(source, format!("scan {}: {}", i + 1, reason))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    if signals.is_empty() {
        log::error!("{}: no <scan> entries found", source);
    }

    Ok(MeasurementSet::new(
        Header::new(),
        signals,
        Vec::new(),
        MeasurementContext::default(),
    ))
}

fn parse_error(source: &str, reason: String) -> XrrError {
    XrrError::ParseError {
        format: "XRDML".to_string(),
        path: source.to_string(),
        reason,
    }
}

/// 按本地名筛选子元素
fn children<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |n| n.is_element() && n.has_tag_name(name))
}

fn child<'a, 'input: 'a>(node: Node<'a, 'input>, name: &'a str) -> Option<Node<'a, 'input>> {
    children(node, name).next()
}

/// 解析单个 `<scan>`
fn parse_scan(scan: Node, source: &str) -> std::result::Result<Measurement, String> {
    let data_points =
        child(scan, "dataPoints").ok_or_else(|| "missing <dataPoints>".to_string())?;

    let counts_node =
        child(data_points, "counts").ok_or_else(|| "missing <counts>".to_string())?;
    let counts = parse_values(counts_node.text().unwrap_or(""))?;

    let two_theta = axis_positions(data_points, AXIS_2THETA, counts.len())?
        .ok_or_else(|| format!("no '{}' positions", AXIS_2THETA))?;

    if two_theta.len() != counts.len() {
        return Err(format!(
            "{} positions for {} counts",
            two_theta.len(),
            counts.len()
        ));
    }

    let points = two_theta
        .iter()
        .zip(counts.iter())
        .map(|(tt, y)| DataPoint::new(tt / 2.0, 0.0, *y, 0.0))
        .collect();

    let mut headers = Header::new();
    if let Some(mode) = scan.attribute("scanAxis") {
        headers.insert("SCANAXIS".to_string(), mode.to_string());
    }

    Ok(Measurement::new(headers, points).with_source(source))
}

/// 读取某个轴的位置，`None` 表示文件中没有该轴
fn axis_positions(
    data_points: Node,
    axis: &str,
    steps: usize,
) -> std::result::Result<Option<Vec<f64>>, String> {
    let positions = match children(data_points, "positions")
        .find(|p| p.attribute("axis") == Some(axis))
    {
        Some(p) => p,
        None => return Ok(None),
    };

    if let Some(common) = child(positions, "commonPosition") {
        let value = parse_value(common.text().unwrap_or(""))?;
        return Ok(Some(vec![value; steps]));
    }

    if let Some(list) = child(positions, "listPositions") {
        return parse_values(list.text().unwrap_or("")).map(Some);
    }

    let start = child(positions, "startPosition");
    let end = child(positions, "endPosition");
    match (start, end) {
        (Some(start), Some(end)) => {
            let start = parse_value(start.text().unwrap_or(""))?;
            let end = parse_value(end.text().unwrap_or(""))?;
            Ok(Some(linspace(start, end, steps)))
        }
        (None, None) => Ok(None),
        _ => Err(format!(
            "'{}' has only one of startPosition/endPosition",
            axis
        )),
    }
}

fn parse_value(text: &str) -> std::result::Result<f64, String> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| format!("invalid number '{}'", text.trim()))
}

fn parse_values(text: &str) -> std::result::Result<Vec<f64>, String> {
    text.split_whitespace().map(parse_value).collect()
}

/// `n` 个等间距点，包含两端
fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + i as f64 * step).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xrdMeasurements xmlns="http://www.xrdml.com/XRDMeasurement/1.5">
  <xrdMeasurement measurementType="Scan" status="Completed">
    <scan scanAxis="Gonio" status="Completed">
      <dataPoints>
        <positions axis="2Theta" unit="deg">
          <startPosition>0.2</startPosition>
          <endPosition>1.0</endPosition>
        </positions>
        <positions axis="Omega" unit="deg">
          <startPosition>0.1</startPosition>
          <endPosition>0.5</endPosition>
        </positions>
        <counts unit="counts">1000 800 0 400 200</counts>
      </dataPoints>
    </scan>
    <scan scanAxis="Gonio" status="Completed">
      <dataPoints>
        <positions axis="2Theta" unit="deg">
          <listPositions>0.8 1.0 1.2</listPositions>
        </positions>
        <counts unit="counts">30 20 10</counts>
      </dataPoints>
    </scan>
  </xrdMeasurement>
</xrdMeasurements>
"#;

    fn xs(ms: &Measurement) -> Vec<f64> {
        ms.points().iter().map(|p| p.x).collect()
    }

    #[test]
    fn test_parse_xrdml_scans() {
        let set = parse_xrdml_content(SAMPLE, "film.xrdml").unwrap();

        assert_eq!(set.signals.len(), 2);
        assert!(set.backgrounds.is_empty());

        // 计数为 0 的点被丢弃
        let first = &set.signals[0];
        assert_eq!(first.len(), 4);
        let expected = [0.1, 0.2, 0.4, 0.5];
        for (got, want) in xs(first).iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-12);
        }
        assert_eq!(first.points()[0].y, 1000.0);
        assert_eq!(first.points()[0].dx, 0.0);
        assert_eq!(first.points()[0].dy, 0.0);
        assert_eq!(first.source(), Some("film.xrdml"));
        assert_eq!(
            first.headers().get("SCANAXIS").map(String::as_str),
            Some("Gonio")
        );

        assert_eq!(xs(&set.signals[1]), vec![0.4, 0.5, 0.6]);
    }

    #[test]
    fn test_common_position_axis() {
        let content = r#"<xrdMeasurements><xrdMeasurement><scan><dataPoints>
            <positions axis="2Theta"><commonPosition>0.6</commonPosition></positions>
            <counts>5 6</counts>
        </dataPoints></scan></xrdMeasurement></xrdMeasurements>"#;

        let set = parse_xrdml_content(content, "common.xrdml").unwrap();
        assert_eq!(xs(&set.signals[0]), vec![0.3, 0.3]);
    }

    #[test]
    fn test_malformed_xrdml() {
        let missing_end = r#"<xrdMeasurements><xrdMeasurement><scan><dataPoints>
            <positions axis="2Theta"><startPosition>0.2</startPosition></positions>
            <counts>5 6</counts>
        </dataPoints></scan></xrdMeasurement></xrdMeasurements>"#;
        let no_counts = r#"<xrdMeasurements><xrdMeasurement><scan><dataPoints>
            <positions axis="2Theta"><listPositions>0.2 0.4</listPositions></positions>
        </dataPoints></scan></xrdMeasurement></xrdMeasurements>"#;
        let two_measurements =
            "<xrdMeasurements><xrdMeasurement/><xrdMeasurement/></xrdMeasurements>";

        for content in [missing_end, no_counts, two_measurements, "<not xml"] {
            assert!(matches!(
                parse_xrdml_content(content, "bad.xrdml"),
                Err(XrrError::ParseError { .. })
            ));
        }
    }

    #[test]
    fn test_linspace() {
        assert_eq!(linspace(0.0, 1.0, 3), vec![0.0, 0.5, 1.0]);
        assert_eq!(linspace(2.0, 4.0, 1), vec![2.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }
}
