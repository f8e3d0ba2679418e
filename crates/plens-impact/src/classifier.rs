//! 影响等级与访问方向判定

use std::collections::BTreeSet;

use plens_policy::{Rule, is_unrestricted};

use crate::differ::{rule_deltas, rule_groups};
use crate::report::{
    AccessDirection, AccessImpact, AccessScenario, FieldDelta, ImpactLevel, ImpactSummary,
};

pub const NO_SIGNIFICANT_ACCESS_CHANGES: &str = "No significant access changes detected";

/// 单条修改的影响等级
pub fn rule_impact(deltas: &[FieldDelta]) -> ImpactLevel {
    let predicate = deltas
        .iter()
        .any(|d| matches!(d, FieldDelta::Predicate { .. }));
    let narrowing = deltas.iter().any(|d| {
        matches!(
            d,
            FieldDelta::GroupsRemoved { .. } | FieldDelta::Operator { .. }
        )
    });
    let widening = deltas
        .iter()
        .any(|d| matches!(d, FieldDelta::GroupsAdded { .. }));

    if predicate {
        ImpactLevel::High
    } else if narrowing || widening {
        ImpactLevel::Medium
    } else {
        ImpactLevel::Low
    }
}

/// 整体影响等级
///
/// 规则数量不同直接判 HIGH；否则按修改对数占旧规则数的比例分级，
/// 边界包含在较低一级（30% 整数算术 `m*10 <= n*3`）。
pub fn aggregate_impact(old: &[Rule], new: &[Rule]) -> ImpactLevel {
    if old.len() != new.len() {
        return ImpactLevel::High;
    }

    let n = old.len();
    let m = modified_pairs(old, new);

    if m == 0 {
        ImpactLevel::None
    } else if m * 10 <= n * 3 {
        ImpactLevel::Low
    } else if m * 10 <= n * 7 {
        ImpactLevel::Medium
    } else {
        ImpactLevel::High
    }
}

/// 报告摘要
pub fn summarize_counts(old: &[Rule], new: &[Rule]) -> ImpactSummary {
    ImpactSummary {
        old_rule_count: old.len(),
        new_rule_count: new.len(),
        rules_added: new.len().saturating_sub(old.len()),
        rules_removed: old.len().saturating_sub(new.len()),
        impact_level: aggregate_impact(old, new),
    }
}

/// 访问方向判定
///
/// 只识别一种扩大：同位置谓词被放宽为恰好 `1=1`。只报告第一处；
/// 不做收紧判定。
pub fn access_impact(old: &[Rule], new: &[Rule]) -> AccessImpact {
    let widened = old
        .iter()
        .zip(new.iter())
        .enumerate()
        .find(|(_, (o, n))| o.predicate() != n.predicate() && is_unrestricted(n.predicate()));

    let Some((i, (_, rule))) = widened else {
        return AccessImpact {
            expanded: false,
            restricted: false,
            unchanged: true,
            description: NO_SIGNIFICANT_ACCESS_CHANGES.to_string(),
            scenarios: Vec::new(),
        };
    };

    let rule_number = i + 1;
    let groups = &rule.inclusions().groups;
    let user_type = if groups.is_empty() {
        format!("All users matched by rule {}", rule_number)
    } else {
        groups.join(", ")
    };

    tracing::debug!(rule_number, %user_type, "predicate widened to unrestricted");

    AccessImpact {
        expanded: true,
        restricted: false,
        unchanged: false,
        description: format!(
            "Rule {}: users will now see ALL data (1=1) instead of filtered data",
            rule_number
        ),
        scenarios: vec![AccessScenario {
            user_type,
            old_access: true,
            new_access: true,
            direction: AccessDirection::Expanded,
            description: "Users will see ALL data (1=1) instead of filtered data".to_string(),
        }],
    }
}

/// 新旧两侧 inclusion 组并集的对称差
pub fn affected_user_groups(old: &[Rule], new: &[Rule]) -> BTreeSet<String> {
    let old_groups = group_union(old);
    let new_groups = group_union(new);
    old_groups.symmetric_difference(&new_groups).cloned().collect()
}

fn group_union(rules: &[Rule]) -> BTreeSet<String> {
    rules.iter().flat_map(rule_groups).collect()
}

/// 同位置存在差异的规则对数
pub fn modified_pairs(old: &[Rule], new: &[Rule]) -> usize {
    old.iter()
        .zip(new.iter())
        .filter(|(before, after)| !rule_deltas(before, after).is_empty())
        .count()
}

/// 场景计数描述，例如 `1 user scenario(s) gained access`
pub fn scenario_tally(scenarios: &[AccessScenario]) -> String {
    let count = |direction: AccessDirection| {
        scenarios
            .iter()
            .filter(|s| s.direction == direction)
            .count()
    };
    let expanded = count(AccessDirection::Expanded);
    let restricted = count(AccessDirection::Restricted);

    let mut parts = Vec::new();
    if expanded > 0 {
        parts.push(format!("{} user scenario(s) gained access", expanded));
    }
    if restricted > 0 {
        parts.push(format!("{} user scenario(s) lost access", restricted));
    }
    if parts.is_empty() {
        NO_SIGNIFICANT_ACCESS_CHANGES.to_string()
    } else {
        parts.join("; ")
    }
}
