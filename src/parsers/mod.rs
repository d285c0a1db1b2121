//! # 解析器模块
//!
//! 把各种测量文件格式统一解析为 `MeasurementSet`。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: uxd, xrdml, ascii

pub mod ascii;
pub mod uxd;
pub mod xrdml;

use crate::error::{XrrError, Result};
use crate::models::MeasurementSet;
use std::fs;
use std::path::Path;

/// 从文件路径推断格式并解析
pub fn parse_measurement_file(path: &Path) -> Result<MeasurementSet> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    if ext == "raw" {
        return Err(XrrError::UnsupportedFormat(format!(
            "'.{}' files are not supported: {}",
            ext,
            path.display()
        )));
    }

    let bytes = fs::read(path).map_err(|e| XrrError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    // 仪器软件常写入非 UTF-8 字节，按有损方式解码
    let content = String::from_utf8_lossy(&bytes);
    let source = path.display().to_string();

    match ext.as_str() {
        "uxd" => uxd::parse_uxd_content(&content, &source),
        "xrdml" => xrdml::parse_xrdml_content(content.trim_start_matches('\u{feff}'), &source),
        _ => ascii::parse_ascii_content(&content, &source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_by_extension() {
        let dir = std::env::temp_dir();
        let uxd = dir.join(format!("xrrconv_parse_{}.UXD", std::process::id()));
        let txt = dir.join(format!("xrrconv_parse_{}.txt", std::process::id()));
        let xml = dir.join(format!("xrrconv_parse_{}.xrdml", std::process::id()));

        fs::write(&uxd, "; (Data for Range number 1)\n_2THETACPS\n1.0 5.0\n").unwrap();
        fs::write(&txt, "1.0 5.0\n1.2 4.0\n").unwrap();
        fs::write(
            &xml,
            "\u{feff}<xrdMeasurements><xrdMeasurement><scan><dataPoints>\
             <positions axis=\"2Theta\"><listPositions>1.0 1.2 1.4</listPositions></positions>\
             <counts>9 8 7</counts></dataPoints></scan></xrdMeasurement></xrdMeasurements>",
        )
        .unwrap();

        let from_uxd = parse_measurement_file(&uxd).unwrap();
        let from_txt = parse_measurement_file(&txt).unwrap();
        let from_xml = parse_measurement_file(&xml).unwrap();
        fs::remove_file(&uxd).ok();
        fs::remove_file(&txt).ok();
        fs::remove_file(&xml).ok();

        assert_eq!(from_uxd.signals[0].len(), 1);
        assert_eq!(from_txt.signals[0].len(), 2);
        assert_eq!(from_xml.signals[0].len(), 3);
        assert!(from_xml.backgrounds.is_empty());
    }

    #[test]
    fn test_unsupported_and_missing() {
        assert!(matches!(
            parse_measurement_file(Path::new("scan.raw")),
            Err(XrrError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            parse_measurement_file(Path::new("/nonexistent/xrrconv/scan.uxd")),
            Err(XrrError::FileReadError { .. })
        ));
    }
}
