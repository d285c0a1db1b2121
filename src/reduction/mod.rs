//! # 反射率数据处理模块
//!
//! 把原始角度扫描转换为单条归一化反射率曲线。
//!
//! ## 子模块
//! - `overlap`: 重叠区间与缩放因子
//! - `merge`: 扫描拼接
//! - `subtract`: 背景扣除
//! - `illumination`: 照明校正
//! - `normalize`: 归一化
//! - `qz`: qz 转换与裁剪
//! - `pipeline`: 完整转换流程
//! - `export`: 数据导出
//! - `plot`: 图表生成
//!
//! ## 依赖关系
//! - 被 `commands/convert.rs` 使用
//! - 使用 `models/`

pub mod export;
pub mod illumination;
pub mod merge;
pub mod normalize;
pub mod overlap;
pub mod pipeline;
pub mod plot;
pub mod qz;
pub mod subtract;

pub use export::AxisMode;
pub use pipeline::convert;
