//! 规则叙述器：把一条规则展开成分步骤的自然语言说明
//!
//! 适用条件 / 豁免条件两段可以同时出现；随后的类型相关段落按
//! 权限匹配 → 脱敏 → 单一条件 → 通用规则 的顺序取第一个满足的。

use crate::model::{Rule, RuleType};
use crate::predicate::explain;

/// 生成第 `index`（从 0 开始）条规则的说明块
pub fn narrate(rule: &Rule, index: usize) -> String {
    let mut out = format!("\n**Rule {}:**\n", index + 1);

    let predicate = rule.predicate();
    let matches = rule.matches();
    let inclusions = rule.inclusions();
    let exceptions = rule.exceptions();
    let operator = rule.operator();
    let rule_type = rule.rule_type();

    if !inclusions.is_empty() {
        out.push_str("**Step 1: Check Inclusions**\n");

        let mut conditions: Vec<String> = inclusions
            .attributes
            .iter()
            .map(|attr| format!("user's {} is '{}'", attr.name, attr.value))
            .collect();
        if !inclusions.groups.is_empty() {
            conditions.push(format!(
                "user belongs to one of these groups: {}",
                inclusions.groups.join(", ")
            ));
        }

        if !conditions.is_empty() {
            out.push_str(&format!(
                "Immuta checks if {}.\n",
                conditions.join(operator.joiner())
            ));
            out.push_str(&format!(
                "- **Action if True:** User will see data where {}.\n",
                explain(predicate)
            ));
            out.push_str("- **Action if False:** Move to next condition.\n\n");
        }
    }

    if !exceptions.is_empty() {
        out.push_str("**Step 2: Check Exceptions**\n");
        out.push_str(&format!(
            "Immuta checks if user belongs to exception groups: {}.\n",
            exceptions.groups.join(", ")
        ));
        out.push_str("- **Action if Yes:** User will see all data (exception applies).\n");
        out.push_str("- **Action if No:** Apply the standard rule filter.\n\n");
    }

    if !matches.is_empty() && rule_type == RuleType::UserEntitlements {
        out.push_str("**User Entitlements Rule:**\n");
        for m in matches {
            out.push_str(&format!(
                "User's {} must match values in {} (type: {}).\n",
                m.attribute, m.tag, m.match_type
            ));
        }
        out.push('\n');
    } else if rule_type == RuleType::Masking {
        out.push_str("**Masking Rule:**\n");
        let fields = &rule.config.fields;
        if !fields.is_empty() {
            let method = rule.masking_method();
            out.push_str("This rule applies masking to the following fields:\n");
            for field in fields {
                out.push_str(&format!(
                    "- {} (type: {})\n",
                    field.column_tag, field.field_type
                ));
            }
            out.push_str(&format!("**Masking Type:** {}\n", method));
            out.push_str(&format!(
                "**Action:** Data in these fields will be masked using {} method.\n\n",
                method
            ));
        }
    } else if inclusions.is_empty() && exceptions.is_empty() && !predicate.is_empty() {
        out.push_str(&format!(
            "**Condition:** User will see data where {}.\n\n",
            explain(predicate)
        ));
    } else if inclusions.is_empty()
        && exceptions.is_empty()
        && predicate.is_empty()
        && matches.is_empty()
    {
        out.push_str("**Universal Rule:** This rule applies to all users and data.\n\n");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(yaml: &str) -> Rule {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_heading_is_one_based() {
        let text = narrate(&Rule::default(), 4);
        assert!(text.starts_with("\n**Rule 5:**\n"), "got: {text}");
    }

    #[test]
    fn test_inclusions_with_any_operator() {
        let r = rule(
            r#"
type: Row Restriction by Custom Where Clause
inclusions:
  attributes:
    - name: Division
      value: OWO
  groups: [team.finance, team.audit]
config:
  predicate: "DeptName in ('ECM', 'EFE')"
"#,
        );
        let text = narrate(&r, 0);
        assert!(text.contains("**Step 1: Check Inclusions**"));
        assert!(text.contains(
            "Immuta checks if user's Division is 'OWO' OR user belongs to one of these groups: team.finance, team.audit."
        ));
        assert!(text.contains(
            "- **Action if True:** User will see data where DeptName is one of: ECM, EFE."
        ));
        assert!(text.contains("- **Action if False:** Move to next condition."));
        assert!(!text.contains("**Condition:**"));
        assert!(!text.contains("**Universal Rule:**"));
    }

    #[test]
    fn test_inclusions_with_all_operator_from_config() {
        let r = rule(
            r#"
config:
  operator: all
  inclusions:
    attributes:
      - { name: Region, value: APAC }
      - { name: Level, value: 2 }
"#,
        );
        let text = narrate(&r, 0);
        assert!(text.contains("user's Region is 'APAC' AND user's Level is '2'"));
    }

    #[test]
    fn test_exceptions_section() {
        let r = rule(
            r#"
exceptions:
  groups: [admins, auditors]
config:
  predicate: "1=1"
"#,
        );
        let text = narrate(&r, 1);
        assert!(text.contains("**Step 2: Check Exceptions**"));
        assert!(text.contains("exception groups: admins, auditors."));
        assert!(text.contains("- **Action if Yes:** User will see all data (exception applies)."));
        assert!(text.contains("- **Action if No:** Apply the standard rule filter."));
        assert!(!text.contains("**Step 1"));
        assert!(!text.contains("**Condition:**"));
    }

    #[test]
    fn test_entitlements_rule() {
        let r = rule(
            r#"
type: Row Restriction by User Entitlements
config:
  matches:
    - attribute: region
      tag: Data.Region
      type: tag
"#,
        );
        let text = narrate(&r, 0);
        assert!(text.contains("**User Entitlements Rule:**"));
        assert!(text.contains("User's region must match values in Data.Region (type: tag)."));
    }

    #[test]
    fn test_matches_without_entitlements_type_not_listed() {
        let r = rule(
            r#"
type: Row Restriction by Custom Where Clause
matches:
  - { attribute: region, tag: Data.Region, type: tag }
"#,
        );
        let text = narrate(&r, 0);
        assert!(!text.contains("User Entitlements"));
        assert!(!text.contains("Universal Rule"));
    }

    #[test]
    fn test_masking_rule() {
        let r = rule(
            r#"
type: Masking
config:
  fields:
    - columnTag: PII.Email
      type: columnTag
    - columnTag: PII.Phone
      type: columnTag
  maskingConfig:
    type: Consistent Value
"#,
        );
        let text = narrate(&r, 0);
        assert!(text.contains("**Masking Rule:**"));
        assert!(text.contains("This rule applies masking to the following fields:"));
        assert!(text.contains("- PII.Email (type: columnTag)\n- PII.Phone (type: columnTag)"));
        assert!(text.contains("**Masking Type:** Consistent Value"));
        assert!(text.contains("masked using Consistent Value method."));
    }

    #[test]
    fn test_condition_only() {
        let r = rule("config:\n  predicate: \"@attributeValuesContains('region','user_region')\"\n");
        let text = narrate(&r, 0);
        assert!(text.contains(
            "**Condition:** User will see data where the user's region matches values in user_region."
        ));
    }

    #[test]
    fn test_universal_rule() {
        let text = narrate(&Rule::default(), 0);
        assert!(text.contains("**Universal Rule:** This rule applies to all users and data."));
    }
}
