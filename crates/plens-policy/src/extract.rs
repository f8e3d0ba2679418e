//! 规则提取：把顶层 `rules` 与各 `actions[].rules` 拉平成一个有序列表
//!
//! 规则没有稳定 ID，拉平后的位置就是它的身份，因此这里只追加、不去重、不合并。

use crate::model::{Configuration, Rule};

/// 提取配置中的全部规则（顶层在前，随后按 action 顺序）
pub fn extract_rules(config: &Configuration) -> Vec<Rule> {
    let mut rules = Vec::new();

    if let Some(top_level) = &config.rules {
        rules.extend(top_level.iter().cloned());
    }

    for action in config.actions.iter().flatten() {
        if let Some(nested) = &action.rules {
            rules.extend(nested.iter().cloned());
        }
    }

    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load;

    fn config(yaml: &str) -> Configuration {
        load(yaml).unwrap().configuration().unwrap()
    }

    #[test]
    fn test_top_level_then_actions_in_order() {
        let c = config(
            r#"
rules:
  - config: { predicate: "a in ('1')" }
actions:
  - type: rowRestriction
    rules:
      - config: { predicate: "b in ('2')" }
      - config: { predicate: "c in ('3')" }
  - type: masking
  - rules:
      - config: { predicate: "d in ('4')" }
"#,
        );
        let rules = extract_rules(&c);
        let predicates: Vec<&str> = rules.iter().map(Rule::predicate).collect();
        assert_eq!(
            predicates,
            vec!["a in ('1')", "b in ('2')", "c in ('3')", "d in ('4')"]
        );
    }

    #[test]
    fn test_no_rules_anywhere() {
        let c = config("name: placeholder\n");
        assert!(extract_rules(&c).is_empty());
    }

    #[test]
    fn test_duplicates_preserved() {
        let c = config(
            r#"
rules:
  - config: { predicate: "1=1" }
actions:
  - rules:
      - config: { predicate: "1=1" }
"#,
        );
        assert_eq!(extract_rules(&c).len(), 2);
    }
}
