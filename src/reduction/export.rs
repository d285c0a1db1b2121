//! # 反射率数据导出
//!
//! ## 支持格式
//! - Parratt `.dat`: 注释头 + 制表符分隔的 `x dx R dR`，4 位有效数字的科学计数法，
//!   最多 999 行（Parratt 软件的上限）
//! - CSV: 全部数据点（serde 序列化 `DataPoint`），表头随坐标轴变化
//!
//! ## 依赖关系
//! - 被 `commands/convert.rs` 调用
//! - 使用 `models/measurement.rs`
//! - 使用 `csv` 库写入 CSV 文件

use crate::error::{XrrError, Result};
use crate::models::Measurement;

use std::fs;
use std::path::Path;

/// Parratt 格式最多写出的数据行数
pub const PARRATT_MAX_LINES: usize = 999;

/// 输出数据的横轴
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisMode {
    /// 入射角 θ（度）
    Theta,
    /// 动量传递 qz（Å⁻¹）
    Qz,
}

impl AxisMode {
    pub fn from_qz_conversion(qz_conversion: bool) -> Self {
        if qz_conversion {
            AxisMode::Qz
        } else {
            AxisMode::Theta
        }
    }

    /// 坐标轴名称（用于表头和图表）
    pub fn label(&self) -> &'static str {
        match self {
            AxisMode::Theta => "θ (°)",
            AxisMode::Qz => "qz (Å⁻¹)",
        }
    }

    fn column_names(&self) -> [&'static str; 4] {
        match self {
            AxisMode::Theta => ["theta", "dtheta", "R", "dR"],
            AxisMode::Qz => ["qz", "dqz", "R", "dR"],
        }
    }

    fn parratt_header(&self) -> [&'static str; 5] {
        match self {
            AxisMode::Theta => [
                "# Theta [deg]: incident angle theta of x-rays",
                "# dTheta [deg]: error in theta (absolute)",
                "# R [1]: normalized reflectivity",
                "# dR [1]: error in reflectivity (absolute)",
                "# theta\tdTheta\tR\tdR",
            ],
            AxisMode::Qz => [
                "# q_z [A^-1]: wavevector transfer in z direction",
                "# dq [A^-1]: error in q (absolute)",
                "# R [1]: normalized reflectivity",
                "# dR [1]: error in reflectivity (absolute)",
                "# q\tdq\tR\tdR",
            ],
        }
    }
}

/// 科学计数法，4 位小数，指数带符号且至少两位（如 `1.2345E-03`）
pub fn format_scientific(value: f64) -> String {
    let formatted = format!("{:.4E}", value);
    match formatted.split_once('E') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}E{}{:0>2}", mantissa, sign, digits)
        }
        None => formatted,
    }
}

/// 生成 Parratt 格式文本
pub fn to_parratt_string(measurement: &Measurement, mode: AxisMode) -> String {
    let mut lines: Vec<String> = mode
        .parratt_header()
        .iter()
        .map(|s| s.to_string())
        .collect();

    lines.extend(
        measurement
            .points()
            .iter()
            .take(PARRATT_MAX_LINES)
            .map(|p| {
                [p.x, p.dx, p.y, p.dy]
                    .iter()
                    .map(|v| format_scientific(*v))
                    .collect::<Vec<_>>()
                    .join("\t")
            }),
    );

    let mut content = lines.join("\n");
    content.push('\n');
    content
}

/// 导出为 Parratt `.dat` 文件
pub fn to_parratt(measurement: &Measurement, mode: AxisMode, output_path: &Path) -> Result<()> {
    if measurement.len() > PARRATT_MAX_LINES {
        log::warn!(
            "Parratt output is limited to {} lines; {} points dropped",
            PARRATT_MAX_LINES,
            measurement.len() - PARRATT_MAX_LINES
        );
    }

    fs::write(output_path, to_parratt_string(measurement, mode)).map_err(|e| {
        XrrError::FileWriteError {
            path: output_path.display().to_string(),
            source: e,
        }
    })
}

/// 导出为 CSV 文件
pub fn to_csv(measurement: &Measurement, mode: AxisMode, output_path: &Path) -> Result<()> {
    // 表头随坐标轴变化，由这里写出；数据行按 DataPoint 字段顺序序列化
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(output_path)?;

    wtr.write_record(mode.column_names())?;

    for p in measurement.points() {
        wtr.serialize(p)?;
    }

    wtr.flush().map_err(|e| XrrError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DataPoint, Header};

    fn sample(n: usize) -> Measurement {
        Measurement::new(
            Header::new(),
            (1..=n)
                .map(|i| DataPoint::new(i as f64 * 0.01, 0.0, 1.0 / i as f64, 0.001))
                .collect(),
        )
    }

    #[test]
    fn test_format_scientific() {
        assert_eq!(format_scientific(0.0012345), "1.2345E-03");
        assert_eq!(format_scientific(12345.0), "1.2345E+04");
        assert_eq!(format_scientific(1.0), "1.0000E+00");
        assert_eq!(format_scientific(0.0), "0.0000E+00");
        assert_eq!(format_scientific(-2.5e-120), "-2.5000E-120");
    }

    #[test]
    fn test_parratt_layout() {
        let content = to_parratt_string(&sample(2), AxisMode::Qz);
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "# q_z [A^-1]: wavevector transfer in z direction");
        assert_eq!(lines[4], "# q\tdq\tR\tdR");
        assert_eq!(lines[5], "1.0000E-02\t0.0000E+00\t1.0000E+00\t1.0000E-03");
        assert_eq!(lines[6], "2.0000E-02\t0.0000E+00\t5.0000E-01\t1.0000E-03");

        let theta = to_parratt_string(&sample(1), AxisMode::Theta);
        assert!(theta.starts_with("# Theta [deg]"));
    }

    #[test]
    fn test_parratt_truncates() {
        let content = to_parratt_string(&sample(1200), AxisMode::Theta);
        let data_lines = content.lines().filter(|l| !l.starts_with('#')).count();
        assert_eq!(data_lines, PARRATT_MAX_LINES);
    }

    #[test]
    fn test_csv_export() {
        let path = std::env::temp_dir().join(format!("xrrconv_export_{}.csv", std::process::id()));
        let ms = sample(3);

        to_csv(&ms, AxisMode::Theta, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut rdr = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<DataPoint> = rdr
            .records()
            .map(|r| r.unwrap().deserialize(None).unwrap())
            .collect();
        fs::remove_file(&path).ok();

        assert_eq!(content.lines().next(), Some("theta,dtheta,R,dR"));
        assert_eq!(content.lines().count(), 4);
        assert_eq!(rows, ms.points().to_vec());
    }
}
