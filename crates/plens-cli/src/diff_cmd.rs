//! `plens diff` — 策略版本之间的影响分析

use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use plens_impact::{
    ChangeType, ChatCompletionSummarizer, ImpactAnalyzer, ImpactReport, SummarizerConfig,
    scenario_tally,
};
use plens_policy::read_source;

/// 报告输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}

/// 运行 diff 子命令
pub fn run(
    old_path: String,
    new_path: String,
    output: Option<String>,
    format: ReportFormat,
    no_llm: bool,
) -> Result<()> {
    tracing::info!(%old_path, %new_path, ?output, ?format, no_llm, "analyzing policy impact");

    // ── 1. 读取两个配置 ──
    let old_source = read_source(Path::new(&old_path))
        .with_context(|| format!("failed to read old configuration '{}'", old_path))?;
    let new_source = read_source(Path::new(&new_path))
        .with_context(|| format!("failed to read new configuration '{}'", new_path))?;

    // ── 2. 分析 ──
    let analyzer = build_analyzer(no_llm);
    let report = analyzer
        .analyze(&old_source, &new_source)
        .with_context(|| format!("failed to analyze '{}' against '{}'", old_path, new_path))?;

    // ── 3. 输出报告 ──
    match format {
        ReportFormat::Json => {
            let json_str = serde_json::to_string_pretty(&report)?;
            println!("{}", json_str);
        }
        ReportFormat::Text => print_text_report(&report),
    }

    // ── 4. 写入文件 ──
    if let Some(ref out_path) = output {
        let json_str = serde_json::to_string_pretty(&report)?;
        std::fs::write(out_path, &json_str)
            .with_context(|| format!("failed to write report to '{}'", out_path))?;
        eprintln!("Report written to {}", out_path);
    }

    Ok(())
}

/// 只有配置了 `PLENS_LLM_ENDPOINT` 且未指定 `--no-llm` 才接入摘要服务
fn build_analyzer(no_llm: bool) -> ImpactAnalyzer {
    if no_llm {
        return ImpactAnalyzer::default();
    }
    let Some(config) = SummarizerConfig::from_env() else {
        tracing::debug!("PLENS_LLM_ENDPOINT not set; narrative disabled");
        return ImpactAnalyzer::default();
    };

    match ChatCompletionSummarizer::new(config) {
        Ok(summarizer) => {
            tracing::info!(
                endpoint = %summarizer.config().endpoint,
                model = %summarizer.config().model,
                "narrative summarizer enabled"
            );
            ImpactAnalyzer::new(Box::new(summarizer))
        }
        Err(e) => {
            tracing::warn!(error = %e, "cannot build summarizer; narrative disabled");
            ImpactAnalyzer::default()
        }
    }
}

/// 打印文本报告
fn print_text_report(report: &ImpactReport) {
    let summary = &report.summary;

    println!("Policy Impact Report");
    println!("====================");
    println!();
    println!(
        "Rules: {} -> {} ({} added, {} removed)",
        summary.old_rule_count, summary.new_rule_count, summary.rules_added, summary.rules_removed
    );
    println!("Impact level: {}", summary.impact_level);
    println!();

    if !report.has_changes() {
        println!("No changes detected.");
    } else {
        println!(
            "Summary: {} change(s): {} added, {} removed, {} modified",
            report.rule_changes.len(),
            report.count(ChangeType::Added),
            report.count(ChangeType::Removed),
            report.count(ChangeType::Modified),
        );
        println!();
        println!("Rule changes:");
        for change in &report.rule_changes {
            let marker = match change.change_type {
                ChangeType::Added => '+',
                ChangeType::Removed => '-',
                ChangeType::Modified => '~',
            };
            println!(
                "  {} Rule {} [{}] {}",
                marker, change.rule_number, change.impact, change.description
            );
        }
    }
    println!();

    let access = &report.access_impact;
    println!("Access impact: {}", access.description);
    if access.expanded {
        println!("  ⚠ {}", scenario_tally(&access.scenarios));
    }
    for scenario in &access.scenarios {
        println!("  - {}: {}", scenario.user_type, scenario.description);
    }

    if report.affected_user_groups.is_empty() {
        println!("Affected user groups: none");
    } else {
        let groups: Vec<&str> = report
            .affected_user_groups
            .iter()
            .map(String::as_str)
            .collect();
        println!("Affected user groups: {}", groups.join(", "));
    }

    println!();
    println!(
        "Recommendations ({}):",
        summary.impact_level.recommendation_heading()
    );
    for recommendation in &report.recommendations {
        println!("  - {}", recommendation);
    }

    if let Some(ref narrative) = report.narrative_summary {
        println!();
        println!("Narrative:");
        println!("{}", narrative);
    }
}
