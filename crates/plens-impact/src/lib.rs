//! policy-lens Impact — 策略版本之间的影响分析
//!
//! 包含：
//! - 按位置的规则差异（带类型化的字段差异）
//! - 单条与整体影响等级、访问方向判定、受影响用户组
//! - 可替换的叙述摘要器（默认不可用，可接 OpenAI 兼容服务）

pub mod analyzer;
pub mod classifier;
pub mod differ;
pub mod report;
pub mod summarizer;

pub use analyzer::{ImpactAnalyzer, structural_report};
pub use classifier::{
    access_impact, aggregate_impact, affected_user_groups, rule_impact, scenario_tally,
};
pub use differ::{compare_rule, diff_rules, rule_deltas};
pub use report::{
    AccessDirection, AccessImpact, AccessScenario, ChangeType, FieldDelta, Fingerprints,
    ImpactLevel, ImpactReport, ImpactSummary, RuleChange,
};
pub use summarizer::{
    ANALYSIS_UNAVAILABLE, ChatCompletionSummarizer, Summarizer, SummarizerConfig, SummaryRequest,
    UnavailableSummarizer,
};
