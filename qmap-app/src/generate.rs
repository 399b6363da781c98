use std::path::PathBuf;

use qmap_builder::example::example_map;
use qmap_builder::{BrushBuilder, BuildError, StepDimensions};
use qmap_config::AppConfig;
use qmap_io::{DocumentSaver, IoError, MapFacade};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("几何体生成失败: {0}")]
    Build(#[from] BuildError),
    #[error(transparent)]
    Io(#[from] IoError),
}

/// 一次生成的结果摘要。
#[derive(Debug, Clone)]
pub struct GenerateReport {
    pub path: PathBuf,
    pub world_brushes: usize,
    pub point_entities: usize,
}

fn builder_from_config(config: &AppConfig) -> BrushBuilder {
    let geometry = &config.geometry;
    BrushBuilder::new()
        .with_default_texture(config.output.default_texture.clone())
        .with_step_dimensions(StepDimensions {
            width: geometry.step_width,
            depth: geometry.step_depth,
            thickness: geometry.step_thickness,
        })
        .strict(geometry.strict)
}

/// 生成示例关卡并写出到配置的路径。
pub fn run(config: &AppConfig) -> Result<GenerateReport, GenerateError> {
    let builder = builder_from_config(config);

    println!("正在生成地图几何体...");
    let (document, summary) = example_map(&builder, config.geometry.room_thickness)?;
    println!("笔刷总数: {}", summary.world_brushes);

    println!("正在写出地图文件...");
    let path = config.output.path.clone();
    MapFacade::new().save(&document, &path)?;
    info!(
        path = %path.display(),
        strict = builder.is_strict(),
        texture = builder.default_texture(),
        "示例地图生成完成"
    );

    Ok(GenerateReport {
        path,
        world_brushes: summary.world_brushes,
        point_entities: summary.point_entities,
    })
}

/// 打印后续编译步骤提示，与文件内容无关。
pub fn print_next_steps(report: &GenerateReport) {
    let file_name = report
        .path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| report.path.display().to_string());
    let map_name = report
        .path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.clone());

    println!();
    println!(
        "✓ 地图已生成: {} ({} 个笔刷, {} 个点实体)",
        report.path.display(),
        report.world_brushes,
        report.point_entities
    );
    println!();
    println!("后续步骤：");
    println!("1. 在 TrenchBroom 中打开并指定纹理");
    println!("2. 编译: qbsp {file_name} && vis {map_name}.bsp && light {map_name}.bsp");
    println!("3. 将 {map_name}.bsp 复制到 Quake/id1/maps/ 目录");
    println!("4. 启动 Quake 并在控制台输入: map {map_name}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_follows_geometry_config() {
        let mut config = AppConfig::default();
        config.output.default_texture = "CITY4_6".to_string();
        config.geometry.step_width = 32.0;
        config.geometry.strict = true;

        let builder = builder_from_config(&config);
        assert_eq!(builder.default_texture(), "CITY4_6");
        assert_eq!(builder.step_dimensions().width, 32.0);
        assert_eq!(builder.step_dimensions().depth, 64.0);
        assert!(builder.is_strict());
    }

    #[test]
    fn run_writes_configured_path() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let mut config = AppConfig::default();
        config.output.path = dir.path().join("demo.map");

        let report = run(&config).expect("generate map");
        assert_eq!(report.world_brushes, 37);
        assert_eq!(report.point_entities, 11);
        assert!(report.path.exists());
    }

    #[test]
    fn strict_run_surfaces_build_errors() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let mut config = AppConfig::default();
        config.output.path = dir.path().join("never.map");
        config.geometry.strict = true;
        config.geometry.room_thickness = 0.0;

        let err = run(&config).unwrap_err();
        assert!(matches!(err, GenerateError::Build(BuildError::InvalidThickness { .. })));
        assert!(!config.output.path.exists());
    }
}
