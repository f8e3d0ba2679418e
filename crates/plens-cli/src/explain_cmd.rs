//! `plens explain` — 单个配置的逐条规则说明

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use plens_common::RenderError;
use plens_policy::{
    Document, DocumentFormat, DocumentRenderer, Explanation, builtin_renderer, load_file,
    output_file_name,
};

/// 运行 explain 子命令
pub fn run(file: String, output: Option<String>, format: DocumentFormat) -> Result<()> {
    tracing::info!(%file, ?output, %format, "explaining configuration");

    // ── 1. 加载配置 ──
    let path = Path::new(&file);
    let outcome =
        load_file(path).with_context(|| format!("failed to load configuration '{}'", file))?;
    let Some(config) = outcome.configuration() else {
        println!("Configuration '{}' is empty; nothing to explain.", file);
        return Ok(());
    };

    // ── 2. 生成说明 ──
    let explanation = Explanation::from_configuration(&config, &display_name(path));

    // ── 3. 输出 ──
    match output {
        None => print!("{}", explanation.to_markdown()),
        Some(dir) => {
            let dir = Path::new(&dir);
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create output directory '{}'", dir.display()))?;
            let written = write_document(&explanation, dir, format)
                .with_context(|| format!("failed to render {} document", format))?;
            println!("✓ Generated {}", written.display());
        }
    }

    Ok(())
}

/// 渲染说明文档到 `dir/<dataset>_explanation.<ext>`
fn write_document(
    explanation: &Explanation,
    dir: &Path,
    format: DocumentFormat,
) -> Result<PathBuf, RenderError> {
    let renderer = builtin_renderer(format)?;
    let destination = artifact_path(explanation, dir, renderer.as_ref());
    renderer.render(&Document::assemble(explanation), &destination)?;
    Ok(destination)
}

/// 渲染器产物路径，扩展名取自渲染器自身的格式
pub fn artifact_path(
    explanation: &Explanation,
    dir: &Path,
    renderer: &dyn DocumentRenderer,
) -> PathBuf {
    dir.join(output_file_name(&explanation.dataset_name, renderer.format()))
}

/// 文件名（不含目录）
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
