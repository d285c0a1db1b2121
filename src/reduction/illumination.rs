//! # 照明（光斑）校正
//!
//! 小角度时光束在样品上的投影 `w / sin θ` 超过样品长度 `l`，
//! 测得强度只对应被照明部分，需乘以 `(w / l) / sin θ`。
//!
//! 只在 `θ <= θc = asin(w / l)` 时校正；使用刀口时整个步骤跳过。
//!
//! ## 依赖关系
//! - 被 `reduction/pipeline.rs` 调用
//! - 使用 `models/` 的 Measurement, MeasurementContext

use crate::models::{DataPoint, Measurement, MeasurementContext};

/// 临界角 θc（度）
///
/// 光束宽于样品（`w / l > 1`）时所有角度都需要校正，θc 取 90°。
pub fn critical_angle(context: &MeasurementContext) -> f64 {
    let ratio = context.xray_width / context.sample_length;
    ratio.min(1.0).asin().to_degrees()
}

/// 应用照明校正
pub fn apply(measurement: &Measurement, context: &MeasurementContext) -> Measurement {
    if context.knife_edge {
        return measurement.clone();
    }

    let theta_c = critical_angle(context);
    let pre_scaling = context.xray_width / context.sample_length;

    log::debug!(
        "Illumination correction below θc = {:.4}° (w = {} mm, l = {} mm)",
        theta_c,
        context.xray_width,
        context.sample_length
    );

    let points: Vec<DataPoint> = measurement
        .points()
        .iter()
        .map(|p| {
            // θ <= 0 时 sin θ 无意义，保持原值
            if p.x > 0.0 && p.x <= theta_c {
                p.scale_y(pre_scaling / p.x.to_radians().sin())
            } else {
                *p
            }
        })
        .collect();

    measurement.derive(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Header;

    fn context() -> MeasurementContext {
        MeasurementContext {
            xray_width: 0.1,
            sample_length: 10.0,
            ..MeasurementContext::default()
        }
    }

    #[test]
    fn test_critical_angle() {
        let theta_c = critical_angle(&context());
        assert!((theta_c - 0.5729673).abs() < 1e-6);
    }

    #[test]
    fn test_low_angle_scaled_high_angle_untouched() {
        let ms = Measurement::new(
            Header::new(),
            vec![
                DataPoint::new(0.3, 0.0, 100.0, 10.0),
                DataPoint::new(5.0, 0.0, 100.0, 10.0),
            ],
        );

        let corrected = apply(&ms, &context());

        let low = corrected.points()[0];
        let expected = 0.01 / 0.3_f64.to_radians().sin();
        assert!(expected > 1.0);
        assert!((low.y - 100.0 * expected).abs() < 1e-9);
        assert!((low.dy - 10.0 * expected).abs() < 1e-9);
        assert_eq!(low.x, 0.3);

        assert_eq!(corrected.points()[1], ms.points()[1]);
    }

    #[test]
    fn test_knife_edge_skips_correction() {
        let ms = Measurement::new(Header::new(), vec![DataPoint::new(0.3, 0.0, 100.0, 10.0)]);
        let ctx = MeasurementContext {
            knife_edge: true,
            ..context()
        };
        assert_eq!(apply(&ms, &ctx), ms);
    }

    #[test]
    fn test_wide_beam_clamps_to_right_angle() {
        let ctx = MeasurementContext {
            xray_width: 20.0,
            sample_length: 10.0,
            ..MeasurementContext::default()
        };
        assert!((critical_angle(&ctx) - 90.0).abs() < 1e-12);
    }
}
