//! # qz 转换与区间裁剪
//!
//! - 角度轴转动量传递：`qz = 4π / λ · sin θ`
//! - 按区间裁剪最终曲线
//! - 光子能量与波长互换
//!
//! 角度误差 dx 不传播到 qz（转换后保持原值）。
//!
//! ## 依赖关系
//! - 被 `reduction/pipeline.rs` 和 `commands/calc.rs` 调用
//! - 使用 `models/` 的 Measurement, MeasurementContext

use crate::error::{XrrError, Result};
use crate::models::{DataPoint, Measurement, MeasurementContext};

use std::f64::consts::PI;

/// 普朗克常数 (J s)
const PLANCK: f64 = 6.62607015e-34;
/// 光速 (m/s)
const SPEED_OF_LIGHT: f64 = 299_792_458.0;
/// 元电荷 (C)
const ELEMENTARY_CHARGE: f64 = 1.602176634e-19;

/// θ（度）→ qz（Å⁻¹）
pub fn theta_to_qz(theta: f64, wavelength: f64) -> f64 {
    4.0 * PI / wavelength * theta.to_radians().sin()
}

/// qz（Å⁻¹）→ θ（度）
pub fn qz_to_theta(qz: f64, wavelength: f64) -> Result<f64> {
    let sin_theta = qz * wavelength / (4.0 * PI);
    if !(-1.0..=1.0).contains(&sin_theta) {
        return Err(XrrError::InvalidArgument(format!(
            "qz = {} is not reachable with λ = {} Å",
            qz, wavelength
        )));
    }
    Ok(sin_theta.asin().to_degrees())
}

/// 光子能量（eV）→ 波长（Å）
pub fn energy_to_wavelength(energy_ev: f64) -> f64 {
    PLANCK * SPEED_OF_LIGHT / (energy_ev * ELEMENTARY_CHARGE) * 1e10
}

/// 波长（Å）→ 光子能量（eV）
pub fn wavelength_to_energy(wavelength: f64) -> f64 {
    PLANCK * SPEED_OF_LIGHT / (wavelength * 1e-10) / ELEMENTARY_CHARGE
}

/// 把整条曲线的 x 轴转换为 qz
pub fn convert(measurement: &Measurement, context: &MeasurementContext) -> Measurement {
    let points = measurement
        .points()
        .iter()
        .map(|p| DataPoint {
            x: theta_to_qz(p.x, context.wavelength),
            ..*p
        })
        .collect();

    measurement.derive(points)
}

/// 只保留 `min <= x <= max` 的点
pub fn crop(measurement: &Measurement, range: (f64, f64)) -> Measurement {
    let (min, max) = range;
    let points: Vec<DataPoint> = measurement
        .points()
        .iter()
        .filter(|p| min <= p.x && p.x <= max)
        .copied()
        .collect();

    log::debug!(
        "Cropped to [{}, {}]: {} of {} points kept",
        min,
        max,
        points.len(),
        measurement.len()
    );

    measurement.derive(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Header;

    #[test]
    fn test_theta_to_qz_and_back() {
        let qz = theta_to_qz(1.0, 1.5418);
        assert!((qz - 0.1422450).abs() < 1e-6);

        let theta = qz_to_theta(qz, 1.5418).unwrap();
        assert!((theta - 1.0).abs() < 1e-12);

        assert!(qz_to_theta(10.0, 1.5418).is_err());
    }

    #[test]
    fn test_energy_wavelength() {
        // Cu Kα ≈ 8.04 keV
        let wl = energy_to_wavelength(8041.0);
        assert!((wl - 1.5419).abs() < 1e-3);
        assert!((wavelength_to_energy(wl) - 8041.0).abs() < 1e-6);
    }

    #[test]
    fn test_convert_keeps_y_and_errors() {
        let ms = Measurement::new(Header::new(), vec![DataPoint::new(0.5, 0.01, 3.0, 0.3)]);
        let ctx = MeasurementContext::default();

        let converted = convert(&ms, &ctx);
        let p = converted.points()[0];

        assert!((p.x - theta_to_qz(0.5, 1.5418)).abs() < 1e-15);
        assert_eq!(p.dx, 0.01);
        assert_eq!(p.y, 3.0);
        assert_eq!(p.dy, 0.3);
    }

    #[test]
    fn test_crop_inclusive() {
        let xs: Vec<f64> = (1..=10).map(|i| i as f64 / 10.0).collect();
        let ms = Measurement::new(
            Header::new(),
            xs.iter().map(|&x| DataPoint::new(x, 0.0, 1.0, 0.0)).collect(),
        );

        let cropped = crop(&ms, (0.3, 0.7));

        let kept: Vec<f64> = cropped.points().iter().map(|p| p.x).collect();
        let expected: Vec<f64> = xs.into_iter().filter(|&x| (0.3..=0.7).contains(&x)).collect();
        assert_eq!(kept, expected);
        assert_eq!(kept.len(), 5);
    }
}
