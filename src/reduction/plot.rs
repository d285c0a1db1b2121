//! # 反射率曲线图
//!
//! 使用 `plotters` 库绘制归一化反射率曲线（对数纵轴）。
//!
//! ## 功能
//! - 论文级别的图表质量
//! - 横轴随输出模式为 θ 或 qz
//! - 支持 PNG 和 SVG 输出
//!
//! ## 依赖关系
//! - 被 `commands/convert.rs` 调用
//! - 使用 `reduction/export.rs` 的 AxisMode
//! - 使用 `plotters` 渲染图表

use crate::error::{XrrError, Result};
use crate::models::Measurement;
use crate::reduction::export::AxisMode;

use plotters::prelude::*;
use std::path::Path;

/// 图表参数
#[derive(Debug, Clone)]
pub struct PlotOptions {
    pub title: String,
    pub mode: AxisMode,
    pub wavelength: f64,
    pub width: u32,
    pub height: u32,
    pub use_svg: bool,
}

/// 生成反射率曲线图
pub fn generate_reflectivity_plot(
    measurement: &Measurement,
    output_path: &Path,
    options: &PlotOptions,
) -> Result<()> {
    if measurement.is_empty() {
        return Err(XrrError::EmptyCurve("plot the reflectivity".to_string()));
    }

    if options.use_svg {
        let root =
            SVGBackend::new(output_path, (options.width, options.height)).into_drawing_area();
        draw_reflectivity_chart(&root, measurement, options)?;
        root.present()
            .map_err(|e| XrrError::PlotError(e.to_string()))?;
    } else {
        let root =
            BitMapBackend::new(output_path, (options.width, options.height)).into_drawing_area();
        draw_reflectivity_chart(&root, measurement, options)?;
        root.present()
            .map_err(|e| XrrError::PlotError(e.to_string()))?;
    }
    Ok(())
}

/// 绘制图表的核心逻辑
fn draw_reflectivity_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    measurement: &Measurement,
    options: &PlotOptions,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)
        .map_err(|e| XrrError::PlotError(format!("{:?}", e)))?;

    let (x_min, x_max) = measurement.x_range().unwrap_or((0.0, 1.0));
    let x_pad = ((x_max - x_min) * 0.02).max(1e-6);

    let y_values = measurement.points().iter().map(|p| p.y);
    let y_min = y_values.clone().fold(f64::INFINITY, f64::min);
    let y_max = y_values.fold(f64::NEG_INFINITY, f64::max);

    // 对数轴两端各留半个数量级
    let y_lo = y_min / 3.0;
    let y_hi = y_max * 3.0;

    let mut chart = ChartBuilder::on(root)
        .caption(&options.title, ("sans-serif", 28).into_font())
        .margin(30)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(x_min - x_pad..x_max + x_pad, (y_lo..y_hi).log_scale())
        .map_err(|e| XrrError::PlotError(format!("{:?}", e)))?;

    chart
        .configure_mesh()
        .x_desc(options.mode.label())
        .y_desc("Reflectivity")
        .y_label_formatter(&|v| format!("{:.0e}", v))
        .x_label_style(("sans-serif", 16))
        .y_label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 18))
        .draw()
        .map_err(|e| XrrError::PlotError(format!("{:?}", e)))?;

    let line_color = RGBColor(0, 102, 204);
    chart
        .draw_series(LineSeries::new(
            measurement.points().iter().map(|p| (p.x, p.y)),
            line_color.stroke_width(2),
        ))
        .map_err(|e| XrrError::PlotError(format!("{:?}", e)))?;

    chart
        .draw_series(
            measurement
                .points()
                .iter()
                .map(|p| Circle::new((p.x, p.y), 2, line_color.filled())),
        )
        .map_err(|e| XrrError::PlotError(format!("{:?}", e)))?;

    let wavelength_text = format!("λ = {:.4} Å", options.wavelength);
    chart
        .draw_series(std::iter::once(Text::new(
            wavelength_text,
            (x_max - (x_max - x_min) * 0.2, y_hi / 2.0),
            ("sans-serif", 14).into_font().color(&BLACK),
        )))
        .map_err(|e| XrrError::PlotError(format!("{:?}", e)))?;

    Ok(())
}
