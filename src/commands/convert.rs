//! # convert 命令实现
//!
//! 把测量文件转换为归一化反射率曲线并写出。
//!
//! ## 功能
//! - 单文件模式：打印扫描概要表，写出数据文件和可选图表
//! - 合并模式（`--combine`）：所有输入合并为一个测量集，只转换一次
//! - 批量模式：每个文件独立转换，rayon 并行，失败汇总报告
//!
//! ## 依赖关系
//! - 使用 `cli/convert.rs` 定义的参数
//! - 使用 `batch/` 模块进行批量处理
//! - 使用 `parsers/` 读取测量文件
//! - 使用 `reduction/` 转换、导出与绘图

use crate::batch::{BatchRunner, FileCollector, ProcessResult};
use crate::cli::convert::{ConvertArgs, OutputFormat};
use crate::cli::parse_wavelength;
use crate::error::{XrrError, Result};
use crate::models::{Measurement, MeasurementContext, MeasurementSet, Normalization};
use crate::parsers;
use crate::reduction::{self, export, plot, AxisMode};
use crate::utils::output;

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabled::{Table, Tabled};

/// 批量模式默认输出目录
const DEFAULT_BATCH_DIR: &str = "dat";

/// 执行 convert 命令
pub fn execute(args: ConvertArgs) -> Result<()> {
    output::print_header("X-Ray Reflectivity Conversion");

    let context = build_context(&args)?;
    output::print_info(&format!(
        "λ = {:.4} Å, beam {} mm, sample {} mm, normalization '{}'",
        context.wavelength,
        context.xray_width,
        context.sample_length,
        context.normalization.unwrap_or(Normalization::Flank)
    ));

    let files = collect_files(&args)?;
    if files.is_empty() {
        output::print_warning(&format!(
            "No matching files found with pattern '{}'",
            args.pattern
        ));
        return Ok(());
    }

    if args.combine {
        execute_combined(&files, &args, context)
    } else if files.len() == 1 {
        execute_single_file(&files[0], &args, context)
    } else {
        execute_batch(files, &args, context)
    }
}

// ─────────────────────────────────────────────────────────────
// 参数解析
// ─────────────────────────────────────────────────────────────

/// 由命令行参数构造测量上下文
fn build_context(args: &ConvertArgs) -> Result<MeasurementContext> {
    let wavelength = parse_wavelength(&args.wavelength)
        .ok_or_else(|| XrrError::InvalidWavelength(args.wavelength.clone()))?;

    if args.beam_width <= 0.0 || args.sample_length <= 0.0 {
        return Err(XrrError::InvalidArgument(format!(
            "Beam width and sample length must be positive (got {} mm, {} mm)",
            args.beam_width, args.sample_length
        )));
    }

    Ok(MeasurementContext {
        wavelength,
        xray_width: args.beam_width,
        sample_length: args.sample_length,
        knife_edge: args.knife_edge,
        average_overlapping: args.average,
        normalization: Some(args.normalization),
        qz_conversion: !args.no_qz,
        qz_range: parse_range(&args.range)?,
    })
}

/// 解析裁剪区间 `min:max`
fn parse_range(range: &str) -> Result<(f64, f64)> {
    let (min, max) = range
        .split_once(':')
        .ok_or_else(|| XrrError::InvalidRange(format!("{} (expected 'min:max')", range)))?;

    let min: f64 = min
        .trim()
        .parse()
        .map_err(|_| XrrError::InvalidRange(range.to_string()))?;
    let max: f64 = max
        .trim()
        .parse()
        .map_err(|_| XrrError::InvalidRange(range.to_string()))?;

    if min.is_nan() || max.is_nan() || min >= max {
        return Err(XrrError::InvalidRange(format!(
            "{} (must be min < max)",
            range
        )));
    }

    Ok((min, max))
}

/// 收集所有输入路径下的文件，保持输入顺序并去重
fn collect_files(args: &ConvertArgs) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();

    for input in &args.inputs {
        let found = FileCollector::new(input.clone())
            .with_pattern(&args.pattern)
            .recursive(args.recursive)
            .collect()?;

        for file in found {
            if !files.contains(&file) {
                files.push(file);
            }
        }
    }

    Ok(files)
}

/// 从文件扩展名推断输出格式
fn guess_format_from_extension(path: &Path) -> OutputFormat {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .as_deref()
    {
        Some("csv") => OutputFormat::Csv,
        Some("png") => OutputFormat::Png,
        Some("svg") => OutputFormat::Svg,
        _ => OutputFormat::Dat,
    }
}

/// 单文件/合并模式的输出路径：显式给出或与输入同名同目录
fn resolve_output(
    input: &Path,
    output: Option<&PathBuf>,
    format: Option<OutputFormat>,
) -> (PathBuf, OutputFormat) {
    match output {
        Some(path) => {
            let format = format.unwrap_or_else(|| guess_format_from_extension(path));
            (path.clone(), format)
        }
        None => {
            let format = format.unwrap_or(OutputFormat::Dat);
            (input.with_extension(format.extension()), format)
        }
    }
}

// ─────────────────────────────────────────────────────────────
// 读取与写出
// ─────────────────────────────────────────────────────────────

/// 读取单个文件并附上上下文
fn load_set(
    path: &Path,
    context: &MeasurementContext,
    no_background: bool,
) -> Result<MeasurementSet> {
    let set = parsers::parse_measurement_file(path)?;
    let set = if no_background {
        set.into_signal_only()
    } else {
        set
    };
    Ok(set.with_context(context.clone()))
}

/// 写出转换结果
fn write_result(
    measurement: &Measurement,
    path: &Path,
    format: OutputFormat,
    title: &str,
    context: &MeasurementContext,
    size: (u32, u32),
) -> Result<()> {
    let mode = AxisMode::from_qz_conversion(context.qz_conversion);

    match format {
        OutputFormat::Dat => export::to_parratt(measurement, mode, path),
        OutputFormat::Csv => export::to_csv(measurement, mode, path),
        OutputFormat::Png | OutputFormat::Svg => {
            let options = plot::PlotOptions {
                title: title.to_string(),
                mode,
                wavelength: context.wavelength,
                width: size.0,
                height: size.1,
                use_svg: format == OutputFormat::Svg,
            };
            plot::generate_reflectivity_plot(measurement, path, &options)
        }
    }
}

/// 输入文件的默认标题
fn default_title(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("reflectivity")
        .to_string()
}

// ─────────────────────────────────────────────────────────────
// 单文件与合并模式
// ─────────────────────────────────────────────────────────────

/// 单文件模式
fn execute_single_file(
    input: &Path,
    args: &ConvertArgs,
    context: MeasurementContext,
) -> Result<()> {
    output::print_info(&format!("Single file mode: '{}'", input.display()));

    let set = load_set(input, &context, args.no_background)?;
    convert_and_write(&set, input, args)
}

/// 合并模式：所有文件的扫描合为一个测量集
fn execute_combined(
    files: &[PathBuf],
    args: &ConvertArgs,
    context: MeasurementContext,
) -> Result<()> {
    output::print_info(&format!("Combining {} file(s) into one curve", files.len()));

    let mut combined: Option<MeasurementSet> = None;
    for file in files {
        let set = load_set(file, &context, args.no_background)?;
        log::debug!("Loaded {} range(s) from {}", set.range_count(), file.display());
        match combined.as_mut() {
            Some(acc) => acc.extend(set),
            None => combined = Some(set),
        }
    }

    let set = combined.ok_or(XrrError::EmptyInput)?;
    convert_and_write(&set, &files[0], args)
}

fn convert_and_write(set: &MeasurementSet, input: &Path, args: &ConvertArgs) -> Result<()> {
    print_range_table(set);

    let curve = reduction::convert(set)?;
    output::print_success(&format!("Converted curve has {} points", curve.len()));

    if curve.is_empty() {
        output::print_warning("No points left inside the crop range");
    }

    let title = args.title.clone().unwrap_or_else(|| default_title(input));
    let size = (args.width, args.height);

    let (path, format) = resolve_output(input, args.output.as_ref(), args.format);
    if path.exists() && !args.overwrite {
        output::print_warning(&format!(
            "Output exists, skipping: {} (use --overwrite)",
            path.display()
        ));
    } else {
        write_result(&curve, &path, format, &title, &set.context, size)?;
        output::print_success(&format!("Saved {} to '{}'", format, path.display()));
    }

    if let Some(plot_path) = &args.plot {
        let plot_format = match guess_format_from_extension(plot_path) {
            OutputFormat::Svg => OutputFormat::Svg,
            _ => OutputFormat::Png,
        };
        write_result(&curve, plot_path, plot_format, &title, &set.context, size)?;
        output::print_success(&format!("Plot saved to '{}'", plot_path.display()));
    }

    Ok(())
}

/// 打印扫描概要表
fn print_range_table(set: &MeasurementSet) {
    #[derive(Tabled)]
    struct RangeRow {
        #[tabled(rename = "#")]
        index: usize,
        #[tabled(rename = "Kind")]
        kind: &'static str,
        #[tabled(rename = "Source")]
        source: String,
        #[tabled(rename = "Points")]
        points: usize,
        #[tabled(rename = "θ min (°)")]
        theta_min: String,
        #[tabled(rename = "θ max (°)")]
        theta_max: String,
    }

    let ranges = set
        .signals
        .iter()
        .map(|m| ("signal", m))
        .chain(set.backgrounds.iter().map(|m| ("background", m)));

    let rows: Vec<RangeRow> = ranges
        .enumerate()
        .map(|(i, (kind, m))| {
            log::debug!("Range {} ({}) header: {:?}", i + 1, kind, m.headers());
            let (lo, hi) = match m.x_range() {
                Some((lo, hi)) => (format!("{:.4}", lo), format!("{:.4}", hi)),
                None => ("-".to_string(), "-".to_string()),
            };
            RangeRow {
                index: i + 1,
                kind,
                source: m
                    .source()
                    .map(|s| default_title(Path::new(s)))
                    .unwrap_or_else(|| "-".to_string()),
                points: m.len(),
                theta_min: lo,
                theta_max: hi,
            }
        })
        .collect();

    if !rows.is_empty() {
        output::print_header(&format!("{} Measured Range(s)", rows.len()));
        println!("{}", Table::new(&rows));
    }
}

// ─────────────────────────────────────────────────────────────
// 批量模式
// ─────────────────────────────────────────────────────────────

/// 批量处理配置
struct BatchConvertConfig {
    output_dir: PathBuf,
    format: OutputFormat,
    context: MeasurementContext,
    no_background: bool,
    overwrite: bool,
    width: u32,
    height: u32,
    /// 被多个输入共用的输出路径
    collisions: HashSet<PathBuf>,
}

impl BatchConvertConfig {
    /// 输入文件在输出目录中的目标路径
    fn output_path(&self, input: &Path) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", default_title(input), self.format.extension()))
    }
}

/// 找出会被多个输入写入的输出路径
fn colliding_outputs(files: &[PathBuf], config: &BatchConvertConfig) -> HashSet<PathBuf> {
    let mut counts: HashMap<PathBuf, usize> = HashMap::new();
    for file in files {
        *counts.entry(config.output_path(file)).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(path, _)| path)
        .collect()
}

/// 批量处理模式
fn execute_batch(
    files: Vec<PathBuf>,
    args: &ConvertArgs,
    context: MeasurementContext,
) -> Result<()> {
    output::print_info(&format!("Batch mode: {} measurement files", files.len()));

    let output_dir = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_BATCH_DIR));

    fs::create_dir_all(&output_dir).map_err(|e| XrrError::FileWriteError {
        path: output_dir.display().to_string(),
        source: e,
    })?;

    if args.plot.is_some() {
        output::print_warning("--plot is ignored in batch mode; use --format png or svg");
    }

    let format = args.format.unwrap_or(OutputFormat::Dat);
    output::print_info(&format!(
        "Writing {} files to '{}'",
        format,
        output_dir.display()
    ));

    let mut config = BatchConvertConfig {
        output_dir,
        format,
        context,
        no_background: args.no_background,
        overwrite: args.overwrite,
        width: args.width,
        height: args.height,
        collisions: HashSet::new(),
    };
    config.collisions = colliding_outputs(&files, &config);
    if !config.collisions.is_empty() {
        output::print_warning(&format!(
            "{} output name(s) are shared by several inputs; those inputs will fail",
            config.collisions.len()
        ));
    }
    let config = Arc::new(config);

    let runner = BatchRunner::new(args.jobs);
    let result = runner.run(files, |file| process_batch_file(file, &config))?;

    output::print_separator();
    output::print_success(&format!(
        "Batch complete: {} of {} converted, {} skipped, {} failed",
        result.success,
        result.total(),
        result.skipped,
        result.failed
    ));

    if !result.failures.is_empty() {
        output::print_warning("Failed files:");
        for (path, err) in result.failures.iter().take(10) {
            output::print_error(&format!("  {}: {}", path, err));
        }
        if result.failures.len() > 10 {
            output::print_warning(&format!("  ... and {} more", result.failures.len() - 10));
        }
    }

    Ok(())
}

/// 处理批量模式中的单个文件
fn process_batch_file(input: &PathBuf, config: &Arc<BatchConvertConfig>) -> ProcessResult {
    let stem = default_title(input);
    let output_file = config.output_path(input);

    if config.collisions.contains(&output_file) {
        return ProcessResult::Failed(
            input.display().to_string(),
            format!(
                "Output name {} is shared with another input; convert separately or rename",
                output_file.display()
            ),
        );
    }

    if output_file.exists() && !config.overwrite {
        return ProcessResult::Skipped(format!(
            "Output exists, skipping: {}",
            output_file.display()
        ));
    }

    let converted = load_set(input, &config.context, config.no_background)
        .and_then(|set| reduction::convert(&set))
        .and_then(|curve| {
            write_result(
                &curve,
                &output_file,
                config.format,
                &stem,
                &config.context,
                (config.width, config.height),
            )
        });

    match converted {
        Ok(()) => {
            ProcessResult::Success(format!("{} -> {}", input.display(), output_file.display()))
        }
        Err(e) => ProcessResult::Failed(input.display().to_string(), e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn convert_args(extra: &[&str]) -> ConvertArgs {
        let mut argv = vec!["xrrconv", "convert", "scan.uxd"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Convert(args) => args,
            Commands::Calc(_) => unreachable!(),
        }
    }

    #[test]
    fn test_parse_range() {
        assert_eq!(parse_range("0:1").unwrap(), (0.0, 1.0));
        assert_eq!(parse_range(" 0.01 : 0.35 ").unwrap(), (0.01, 0.35));
        assert!(parse_range("1:0").is_err());
        assert!(parse_range("0-1").is_err());
        assert!(parse_range("a:b").is_err());
    }

    #[test]
    fn test_build_context_from_defaults() {
        let context = build_context(&convert_args(&["--wavelength", "cu-ka"])).unwrap();
        assert_eq!(context.wavelength, 1.5418);
        assert_eq!(context.xray_width, 0.1);
        assert_eq!(context.sample_length, 10.0);
        assert!(context.qz_conversion);
        assert_eq!(context.qz_range, (0.0, 1.0));
        assert_eq!(context.normalization, Some(Normalization::Flank));
    }

    #[test]
    fn test_build_context_overrides() {
        let context = build_context(&convert_args(&[
            "--wavelength",
            "0.7107",
            "--no-qz",
            "--range",
            "0.2:3",
            "--normalization",
            "2.5",
            "--average",
        ]))
        .unwrap();
        assert_eq!(context.wavelength, 0.7107);
        assert!(!context.qz_conversion);
        assert!(context.average_overlapping);
        assert_eq!(context.qz_range, (0.2, 3.0));
        assert_eq!(
            context.normalization,
            Some(Normalization::Factor(2.5))
        );

        assert!(matches!(
            build_context(&convert_args(&["--wavelength", "unobtainium"])),
            Err(XrrError::InvalidWavelength(_))
        ));
    }

    #[test]
    fn test_resolve_output() {
        let input = Path::new("/data/film.uxd");

        let (path, format) = resolve_output(input, None, None);
        assert_eq!(path, PathBuf::from("/data/film.dat"));
        assert_eq!(format, OutputFormat::Dat);

        let explicit = PathBuf::from("curve.svg");
        let (path, format) = resolve_output(input, Some(&explicit), None);
        assert_eq!(path, explicit);
        assert_eq!(format, OutputFormat::Svg);

        let (path, format) = resolve_output(input, None, Some(OutputFormat::Csv));
        assert_eq!(path, PathBuf::from("/data/film.csv"));
        assert_eq!(format, OutputFormat::Csv);
    }

    fn write_uxd(path: &Path, factor: f64) {
        let mut content = String::from("_WL1=1.5406\n; (Data for Range number 1)\n_2THETACPS\n");
        for i in 1..=30 {
            let two_theta = i as f64 * 0.1;
            content.push_str(&format!(
                "{:.2} {:.3}\n",
                two_theta,
                factor * 1.0e4 * (-two_theta).exp()
            ));
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_convert_uxd_file_to_parratt() {
        let dir = std::env::temp_dir().join(format!("xrrconv_cmd_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let input = dir.join("film.uxd");
        write_uxd(&input, 1.0);

        let args = convert_args(&["--knife-edge", "--normalization", "max", "--overwrite"]);
        let context = build_context(&args).unwrap();
        execute_single_file(&input, &args, context).unwrap();

        let written = fs::read_to_string(dir.join("film.dat")).unwrap();
        fs::remove_dir_all(&dir).ok();

        let data: Vec<&str> = written.lines().filter(|l| !l.starts_with('#')).collect();
        assert_eq!(data.len(), 30);
        assert!(data[0].contains("1.0000E+00"));
    }

    #[test]
    fn test_batch_same_stem_inputs_fail_instead_of_overwriting() {
        let dir = std::env::temp_dir().join(format!("xrrconv_batch_{}", std::process::id()));
        let out = dir.join("out");
        for sub in ["a", "b", "c"] {
            fs::create_dir_all(dir.join(sub)).unwrap();
        }
        let files = vec![
            dir.join("a").join("film.uxd"),
            dir.join("b").join("film.uxd"),
            dir.join("c").join("other.uxd"),
        ];
        write_uxd(&files[0], 1.0);
        write_uxd(&files[1], 2.0);
        write_uxd(&files[2], 1.0);
        fs::create_dir_all(&out).unwrap();

        let args = convert_args(&["--knife-edge", "--normalization", "max"]);
        let mut config = BatchConvertConfig {
            output_dir: out.clone(),
            format: OutputFormat::Dat,
            context: build_context(&args).unwrap(),
            no_background: false,
            overwrite: true,
            width: 800,
            height: 600,
            collisions: HashSet::new(),
        };
        config.collisions = colliding_outputs(&files, &config);
        assert_eq!(config.collisions.len(), 1);
        assert!(config.collisions.contains(&out.join("film.dat")));

        let config = Arc::new(config);
        let results: Vec<ProcessResult> = files
            .iter()
            .map(|f| process_batch_file(f, &config))
            .collect();

        let mut written: Vec<String> = fs::read_dir(&out)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        written.sort();
        fs::remove_dir_all(&dir).ok();

        assert!(matches!(results[0], ProcessResult::Failed(..)));
        assert!(matches!(results[1], ProcessResult::Failed(..)));
        assert!(matches!(results[2], ProcessResult::Success(_)));
        assert_eq!(written, vec!["other.dat".to_string()]);
    }
}
