//! 影响分析入口
//!
//! 先完整计算结构化报告，再调用摘要器生成叙述；摘要失败只降级为占位文本。

use plens_common::ParseError;
use plens_common::hash::fingerprint;
use plens_policy::{Configuration, LoadOutcome, Rule, extract_rules, load};

use crate::classifier::{access_impact, affected_user_groups, summarize_counts};
use crate::differ::diff_rules;
use crate::report::{Fingerprints, ImpactReport};
use crate::summarizer::{ANALYSIS_UNAVAILABLE, Summarizer, SummaryRequest, UnavailableSummarizer};

/// 只含结构化部分的报告（不调用摘要器，不带指纹）
pub fn structural_report(old: &[Rule], new: &[Rule]) -> ImpactReport {
    let summary = summarize_counts(old, new);
    let recommendations = summary
        .impact_level
        .recommendations()
        .iter()
        .map(|r| r.to_string())
        .collect();

    ImpactReport {
        summary,
        rule_changes: diff_rules(old, new),
        access_impact: access_impact(old, new),
        affected_user_groups: affected_user_groups(old, new),
        recommendations,
        narrative_summary: None,
        fingerprints: None,
    }
}

/// 影响分析器
pub struct ImpactAnalyzer {
    summarizer: Box<dyn Summarizer>,
}

impl Default for ImpactAnalyzer {
    fn default() -> Self {
        Self::new(Box::new(UnavailableSummarizer))
    }
}

impl ImpactAnalyzer {
    pub fn new(summarizer: Box<dyn Summarizer>) -> Self {
        Self { summarizer }
    }

    /// 分析两份 YAML 文本；空文档视为零条规则
    pub fn analyze(&self, old_text: &str, new_text: &str) -> Result<ImpactReport, ParseError> {
        let old = configuration_or_empty(load(old_text)?, "old");
        let new = configuration_or_empty(load(new_text)?, "new");

        let mut report = self.report_for(&old, &new, old_text, new_text);
        report.fingerprints = Some(Fingerprints {
            old: fingerprint(old_text),
            new: fingerprint(new_text),
        });
        Ok(report)
    }

    /// 分析两份已加载的配置；叙述基于重新序列化的 YAML
    pub fn analyze_configurations(&self, old: &Configuration, new: &Configuration) -> ImpactReport {
        let old_text = rerender(old);
        let new_text = rerender(new);
        self.report_for(old, new, &old_text, &new_text)
    }

    fn report_for(
        &self,
        old: &Configuration,
        new: &Configuration,
        old_text: &str,
        new_text: &str,
    ) -> ImpactReport {
        let old_rules = extract_rules(old);
        let new_rules = extract_rules(new);

        let mut report = structural_report(&old_rules, &new_rules);

        tracing::info!(
            old_rules = old_rules.len(),
            new_rules = new_rules.len(),
            changes = report.rule_changes.len(),
            impact = %report.summary.impact_level,
            "impact analysis complete"
        );

        let request = SummaryRequest {
            old_text,
            new_text,
            changes: &report.rule_changes,
        };
        let narrative = match self.summarizer.summarize(&request) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "impact narrative unavailable");
                ANALYSIS_UNAVAILABLE.to_string()
            }
        };
        report.narrative_summary = Some(narrative);

        report
    }
}

fn configuration_or_empty(outcome: LoadOutcome, side: &str) -> Configuration {
    if matches!(outcome, LoadOutcome::Empty) {
        tracing::warn!(side, "empty configuration treated as zero rules");
    }
    outcome.or_empty_configuration()
}

fn rerender(config: &Configuration) -> String {
    serde_yaml::to_string(&config.document).unwrap_or_default()
}
