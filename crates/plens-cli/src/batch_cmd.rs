//! `plens batch` — 目录级批量生成说明文档
//!
//! 每个文件独立处理：一个文件失败只计入错误，不影响其余文件；
//! 同一文件的各个格式也相互独立，渲染失败只跳过对应产物。

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use plens_common::{PlensError, RenderError};
use plens_policy::{Document, DocumentFormat, Explanation, builtin_renderer, load_file};

use crate::explain_cmd::{artifact_path, display_name};

/// 单个文件的处理结局
enum FileOutcome {
    Rendered(Vec<Artifact>),
    SkippedEmpty,
}

/// 单个产物的结局
enum Artifact {
    Generated(PathBuf),
    /// 本次运行中更早的文件已写出同名产物
    Collision { destination: PathBuf, first: String },
    Failed(DocumentFormat, RenderError),
}

/// 批处理统计
#[derive(Default)]
struct BatchSummary {
    processed: usize,
    skipped_empty: usize,
    collisions: usize,
    errors: Vec<(String, PlensError)>,
}

/// 运行 batch 子命令
pub fn run(input: String, output: String, formats: Vec<DocumentFormat>) -> Result<()> {
    tracing::info!(%input, %output, ?formats, "starting batch");

    // ── 1. 校验目录 ──
    let input_dir = Path::new(&input);
    if !input_dir.is_dir() {
        return Err(PlensError::InvalidInvocation(format!(
            "input directory '{}' does not exist",
            input
        ))
        .into());
    }
    let output_dir = Path::new(&output);
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output directory '{}'", output))?;

    // ── 2. 收集 YAML 文件 ──
    let files = yaml_files(input_dir)
        .with_context(|| format!("failed to scan input directory '{}'", input))?;
    if files.is_empty() {
        println!("No YAML files found in {}", input);
        return Ok(());
    }
    println!("Found {} YAML file(s) to process", files.len());

    // ── 3. 逐个处理 ──
    let mut summary = BatchSummary::default();
    // 产物路径 → 写出它的输入文件
    let mut produced: HashMap<PathBuf, String> = HashMap::new();
    for path in &files {
        let name = display_name(path);
        match process_file(path, output_dir, &formats, &mut produced) {
            Ok(FileOutcome::Rendered(artifacts)) => {
                let mut generated = 0;
                for artifact in artifacts {
                    match artifact {
                        Artifact::Generated(file) => {
                            println!("✓ Generated: {}", display_name(&file));
                            generated += 1;
                        }
                        Artifact::Collision { destination, first } => {
                            tracing::warn!(
                                file = %name,
                                destination = %destination.display(),
                                %first,
                                "output already generated in this run; not overwritten"
                            );
                            println!(
                                "! Skipped {}: {} was already generated from {}",
                                name,
                                display_name(&destination),
                                first
                            );
                            summary.collisions += 1;
                        }
                        Artifact::Failed(format, e) => {
                            tracing::warn!(file = %name, %format, error = %e, "artifact failed");
                            println!("✗ Error rendering {} for {}: {}", format, name, e);
                            summary.errors.push((name.clone(), e.into()));
                        }
                    }
                }
                if generated > 0 {
                    summary.processed += 1;
                }
            }
            Ok(FileOutcome::SkippedEmpty) => {
                println!("- Skipped empty configuration: {}", name);
                summary.skipped_empty += 1;
            }
            Err(e) => {
                tracing::warn!(file = %name, error = %e, "batch item failed");
                println!("✗ Error processing {}: {}", name, e);
                summary.errors.push((name, e));
            }
        }
    }

    // ── 4. 汇总 ──
    println!();
    println!("=== SUMMARY ===");
    println!("Total files processed: {}", summary.processed);
    println!("Skipped (empty): {}", summary.skipped_empty);
    println!("Output collisions: {}", summary.collisions);
    println!("Errors: {}", summary.errors.len());
    println!("Output folder: {}", output_dir.display());

    tracing::info!(
        processed = summary.processed,
        skipped_empty = summary.skipped_empty,
        collisions = summary.collisions,
        errors = summary.errors.len(),
        "batch complete"
    );

    Ok(())
}

/// 目录下的 `*.yaml` / `*.yml`，按路径排序
fn yaml_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == "yaml" || ext == "yml");
        if is_yaml && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn process_file(
    path: &Path,
    output_dir: &Path,
    formats: &[DocumentFormat],
    produced: &mut HashMap<PathBuf, String>,
) -> Result<FileOutcome, PlensError> {
    let Some(config) = load_file(path)?.configuration() else {
        return Ok(FileOutcome::SkippedEmpty);
    };

    let name = display_name(path);
    let explanation = Explanation::from_configuration(&config, &name);
    let document = Document::assemble(&explanation);

    let mut artifacts = Vec::with_capacity(formats.len());
    for &format in formats {
        let renderer = match builtin_renderer(format) {
            Ok(renderer) => renderer,
            Err(e) => {
                artifacts.push(Artifact::Failed(format, e));
                continue;
            }
        };
        let destination = artifact_path(&explanation, output_dir, renderer.as_ref());
        if let Some(first) = produced.get(&destination) {
            artifacts.push(Artifact::Collision {
                destination,
                first: first.clone(),
            });
            continue;
        }
        match renderer.render(&document, &destination) {
            Ok(()) => {
                produced.insert(destination.clone(), name.clone());
                artifacts.push(Artifact::Generated(destination));
            }
            Err(e) => artifacts.push(Artifact::Failed(format, e)),
        }
    }
    Ok(FileOutcome::Rendered(artifacts))
}
