//! 规则差异计算
//!
//! 按位置配对新旧规则；多出来的旧规则记为删除，多出来的新规则记为新增。
//! 规则挪动位置会在每个错位处报告为修改。

use std::collections::BTreeSet;

use plens_policy::Rule;

use crate::classifier::rule_impact;
use crate::report::{ChangeType, FieldDelta, ImpactLevel, RuleChange};

/// 规则已解析的 inclusion 组集合
pub fn rule_groups(rule: &Rule) -> BTreeSet<String> {
    rule.inclusions().groups.iter().cloned().collect()
}

/// 同位置两条规则的字段差异，顺序固定：谓词、新增组、移除组、operator
pub fn rule_deltas(old: &Rule, new: &Rule) -> Vec<FieldDelta> {
    let mut deltas = Vec::new();

    if old.predicate() != new.predicate() {
        deltas.push(FieldDelta::Predicate {
            old: old.predicate().to_string(),
            new: new.predicate().to_string(),
        });
    }

    let old_groups = rule_groups(old);
    let new_groups = rule_groups(new);
    let added: Vec<String> = new_groups.difference(&old_groups).cloned().collect();
    let removed: Vec<String> = old_groups.difference(&new_groups).cloned().collect();
    if !added.is_empty() {
        deltas.push(FieldDelta::GroupsAdded { groups: added });
    }
    if !removed.is_empty() {
        deltas.push(FieldDelta::GroupsRemoved { groups: removed });
    }

    if old.operator_text() != new.operator_text() {
        deltas.push(FieldDelta::Operator {
            old: old.operator_text().to_string(),
            new: new.operator_text().to_string(),
        });
    }

    deltas
}

/// 比较一对规则；没有差异时返回 `None`
pub fn compare_rule(old: &Rule, new: &Rule, rule_number: usize) -> Option<RuleChange> {
    let deltas = rule_deltas(old, new);
    if deltas.is_empty() {
        return None;
    }

    let description = deltas
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");

    Some(RuleChange {
        rule_number,
        change_type: ChangeType::Modified,
        description,
        impact: rule_impact(&deltas),
        deltas,
    })
}

/// 计算两组规则的全部差异
pub fn diff_rules(old: &[Rule], new: &[Rule]) -> Vec<RuleChange> {
    let mut changes = Vec::new();

    // ── 1. 同位置配对 ──
    for (i, (o, n)) in old.iter().zip(new.iter()).enumerate() {
        if let Some(change) = compare_rule(o, n, i + 1) {
            changes.push(change);
        }
    }

    // ── 2. 多出的旧规则 ──
    for i in new.len()..old.len() {
        changes.push(RuleChange {
            rule_number: i + 1,
            change_type: ChangeType::Removed,
            description: format!("Rule {} was removed", i + 1),
            impact: ImpactLevel::High,
            deltas: Vec::new(),
        });
    }

    // ── 3. 多出的新规则 ──
    for i in old.len()..new.len() {
        changes.push(RuleChange {
            rule_number: i + 1,
            change_type: ChangeType::Added,
            description: format!("New rule {} was added", i + 1),
            impact: ImpactLevel::Medium,
            deltas: Vec::new(),
        });
    }

    tracing::debug!(
        old = old.len(),
        new = new.len(),
        changes = changes.len(),
        "rule diff computed"
    );

    changes
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn where_rule(predicate: &str, groups: &[&str]) -> Rule {
        let groups = groups
            .iter()
            .map(|g| format!("\"{}\"", g))
            .collect::<Vec<_>>()
            .join(", ");
        let yaml = format!(
            "type: Row Restriction by Custom Where Clause\n\
             inclusions:\n  groups: [{}]\n\
             config:\n  predicate: \"{}\"\n",
            groups, predicate
        );
        serde_yaml::from_str(&yaml).unwrap()
    }

    // ---- 1. 相同规则无差异 ----
    #[test]
    fn test_identical_rules_no_changes() {
        let rules = vec![
            where_rule("DeptName in ('ECM')", &["team.finance"]),
            where_rule("1=1", &[]),
        ];
        assert!(diff_rules(&rules, &rules).is_empty());
    }

    // ---- 2. 谓词变化 ----
    #[test]
    fn test_predicate_change() {
        let old = vec![where_rule("DeptName in ('ECM','EFE')", &[])];
        let new = vec![where_rule("1=1", &[])];
        let changes = diff_rules(&old, &new);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].rule_number, 1);
        assert_eq!(changes[0].change_type, ChangeType::Modified);
        assert_eq!(changes[0].impact, ImpactLevel::High);
        assert_eq!(
            changes[0].description,
            "Predicate changed from 'DeptName in ('ECM','EFE')' to '1=1'"
        );
    }

    // ---- 3. 组变化（集合语义） ----
    #[test]
    fn test_group_changes_use_set_semantics() {
        let old = vec![where_rule("x", &["b", "a", "a"])];
        let reordered = vec![where_rule("x", &["a", "b"])];
        assert!(diff_rules(&old, &reordered).is_empty());

        let new = vec![where_rule("x", &["a", "d", "c"])];
        let changes = diff_rules(&old, &new);
        assert_eq!(changes[0].description, "Added groups: c, d; Removed groups: b");
        assert_eq!(changes[0].impact, ImpactLevel::Medium);
    }

    // ---- 4. operator 缺省为 any ----
    #[test]
    fn test_operator_default_and_change() {
        let implicit: Rule = serde_yaml::from_str("config:\n  predicate: x\n").unwrap();
        let explicit: Rule =
            serde_yaml::from_str("operator: any\nconfig:\n  predicate: x\n").unwrap();
        assert!(compare_rule(&implicit, &explicit, 1).is_none());

        let all: Rule =
            serde_yaml::from_str("config:\n  operator: all\n  predicate: x\n").unwrap();
        let change = compare_rule(&implicit, &all, 1).unwrap();
        assert_eq!(change.description, "Operator changed from 'any' to 'all'");
        assert_eq!(change.impact, ImpactLevel::Medium);
    }

    // ---- 5. 数量不同 ----
    #[test]
    fn test_added_and_removed() {
        let one = vec![where_rule("x", &[])];
        let three = vec![where_rule("x", &[]), where_rule("y", &[]), where_rule("z", &[])];

        let grown = diff_rules(&one, &three);
        assert_eq!(grown.len(), 2);
        assert!(grown.iter().all(|c| c.change_type == ChangeType::Added));
        assert_eq!(grown[0].description, "New rule 2 was added");
        assert_eq!(grown[1].rule_number, 3);
        assert_eq!(grown[0].impact, ImpactLevel::Medium);

        let shrunk = diff_rules(&three, &one);
        assert_eq!(shrunk.len(), 2);
        assert_eq!(shrunk[0].description, "Rule 2 was removed");
        assert_eq!(shrunk[0].impact, ImpactLevel::High);
    }
}
