//! 影响报告数据结构
//!
//! 每次分析重新计算，调用方用完即弃，不持有对源配置的引用。

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

/// 严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImpactLevel {
    None,
    Low,
    Medium,
    High,
}

impl fmt::Display for ImpactLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ImpactLevel::None => "NONE",
            ImpactLevel::Low => "LOW",
            ImpactLevel::Medium => "MEDIUM",
            ImpactLevel::High => "HIGH",
        })
    }
}

impl ImpactLevel {
    /// 建议标题
    pub fn recommendation_heading(self) -> &'static str {
        match self {
            ImpactLevel::High => "High Impact Changes Detected",
            ImpactLevel::Medium => "Medium Impact Changes Detected",
            ImpactLevel::Low => "Low Impact Changes Detected",
            ImpactLevel::None => "No Significant Changes Detected",
        }
    }

    /// 按整体影响等级给出的固定处理建议
    pub fn recommendations(self) -> &'static [&'static str] {
        match self {
            ImpactLevel::High => &[
                "Review all changes carefully before deployment",
                "Test with affected user groups",
                "Consider phased rollout",
                "Notify stakeholders about access changes",
            ],
            ImpactLevel::Medium => &[
                "Review changes with data owners",
                "Test with sample users",
                "Monitor access patterns after deployment",
            ],
            ImpactLevel::Low => &[
                "Changes appear minimal",
                "Standard testing recommended",
                "Monitor for unexpected issues",
            ],
            ImpactLevel::None => &[
                "Policies appear identical",
                "Standard deployment process can be followed",
            ],
        }
    }
}

/// 差异类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    Added,
    Removed,
    Modified,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChangeType::Added => "ADDED",
            ChangeType::Removed => "REMOVED",
            ChangeType::Modified => "MODIFIED",
        })
    }
}

/// 同位置两条规则之间的单个字段差异
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum FieldDelta {
    Predicate { old: String, new: String },
    GroupsAdded { groups: Vec<String> },
    GroupsRemoved { groups: Vec<String> },
    Operator { old: String, new: String },
}

impl fmt::Display for FieldDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldDelta::Predicate { old, new } => {
                write!(f, "Predicate changed from '{}' to '{}'", old, new)
            }
            FieldDelta::GroupsAdded { groups } => write!(f, "Added groups: {}", groups.join(", ")),
            FieldDelta::GroupsRemoved { groups } => {
                write!(f, "Removed groups: {}", groups.join(", "))
            }
            FieldDelta::Operator { old, new } => {
                write!(f, "Operator changed from '{}' to '{}'", old, new)
            }
        }
    }
}

/// 一条规则差异
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleChange {
    /// 从 1 开始
    pub rule_number: usize,
    pub change_type: ChangeType,
    pub description: String,
    pub impact: ImpactLevel,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deltas: Vec<FieldDelta>,
}

/// 报告摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImpactSummary {
    pub old_rule_count: usize,
    pub new_rule_count: usize,
    pub rules_added: usize,
    pub rules_removed: usize,
    pub impact_level: ImpactLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessDirection {
    Expanded,
    Restricted,
}

/// 某类用户的访问变化
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessScenario {
    pub user_type: String,
    pub old_access: bool,
    pub new_access: bool,
    pub direction: AccessDirection,
    pub description: String,
}

/// 访问方向判定（启发式，不是对真实数据的求值）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessImpact {
    pub expanded: bool,
    pub restricted: bool,
    pub unchanged: bool,
    pub description: String,
    pub scenarios: Vec<AccessScenario>,
}

/// 两份输入的 blake3 指纹
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fingerprints {
    pub old: String,
    pub new: String,
}

/// 影响报告
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImpactReport {
    pub summary: ImpactSummary,
    pub rule_changes: Vec<RuleChange>,
    pub access_impact: AccessImpact,
    pub affected_user_groups: BTreeSet<String>,
    /// 随整体影响等级而定
    pub recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narrative_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprints: Option<Fingerprints>,
}

impl ImpactReport {
    pub fn count(&self, change_type: ChangeType) -> usize {
        self.rule_changes
            .iter()
            .filter(|c| c.change_type == change_type)
            .count()
    }

    pub fn has_changes(&self) -> bool {
        !self.rule_changes.is_empty()
    }
}
