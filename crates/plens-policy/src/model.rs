//! 策略配置数据模型
//!
//! 只识别固定的一组键；其余键在反序列化时忽略。规则的部分字段既可以写在规则层，
//! 也可以写在 `config` 下，统一经 [`resolve`] 取值。

use std::fmt;

use serde::{Deserialize, Deserializer};

/// 自定义 where 子句行过滤
pub const CUSTOM_WHERE_CLAUSE_TYPE: &str = "Row Restriction by Custom Where Clause";
/// 用户权限匹配行过滤
pub const USER_ENTITLEMENTS_TYPE: &str = "Row Restriction by User Entitlements";
/// 列脱敏
pub const MASKING_TYPE: &str = "Masking";

/// 缺省组合方式
pub const DEFAULT_OPERATOR: &str = "any";
/// 缺省规则类型
pub const DEFAULT_RULE_TYPE: &str = "Unknown";

static EMPTY_INCLUSIONS: Inclusions = Inclusions {
    attributes: Vec::new(),
    groups: Vec::new(),
};
static EMPTY_EXCEPTIONS: Exceptions = Exceptions { groups: Vec::new() };

/// 双位置字段解析：优先规则层，其次 `config` 内嵌，最后默认值
pub fn resolve<'a, T: ?Sized>(
    rule_level: Option<&'a T>,
    nested: Option<&'a T>,
    default: &'a T,
) -> &'a T {
    rule_level.or(nested).unwrap_or(default)
}

/// 策略配置（一个 YAML 文档）
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Configuration {
    #[serde(default, deserialize_with = "opt_scalar")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub circumstances: Vec<Circumstance>,
    #[serde(default)]
    pub rules: Option<Vec<Rule>>,
    #[serde(default)]
    pub actions: Option<Vec<Action>>,
    /// 原始文档，用于重新渲染配置
    #[serde(skip)]
    pub document: serde_yaml::Value,
}

/// 生效条件描述（只关心 tags 类型）
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Circumstance {
    #[serde(rename = "type", default, deserialize_with = "opt_scalar")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub tag: Option<String>,
}

/// 动作组，内嵌规则
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Action {
    #[serde(default)]
    pub rules: Option<Vec<Rule>>,
}

/// 单条访问规则
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Rule {
    #[serde(rename = "type", default, deserialize_with = "opt_scalar")]
    pub rule_type: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub operator: Option<String>,
    #[serde(default)]
    pub inclusions: Option<Inclusions>,
    #[serde(default)]
    pub exceptions: Option<Exceptions>,
    #[serde(default)]
    pub matches: Option<Vec<EntitlementMatch>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub config: RuleConfig,
}

/// 规则的 `config` 子映射
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RuleConfig {
    #[serde(default, deserialize_with = "opt_scalar")]
    pub predicate: Option<String>,
    #[serde(default)]
    pub matches: Option<Vec<EntitlementMatch>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fields: Vec<MaskedField>,
    #[serde(rename = "maskingConfig", default)]
    pub masking_config: Option<MaskingConfig>,
    #[serde(default)]
    pub inclusions: Option<Inclusions>,
    #[serde(default)]
    pub exceptions: Option<Exceptions>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub operator: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "opt_scalar")]
    pub rule_type: Option<String>,
}

/// 规则适用条件
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Inclusions {
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: Vec<AttributeCondition>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub groups: Vec<String>,
}

impl Inclusions {
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.groups.is_empty()
    }
}

/// 规则豁免条件
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Exceptions {
    #[serde(default, deserialize_with = "null_as_default")]
    pub groups: Vec<String>,
}

impl Exceptions {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// `user's <name> is '<value>'`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AttributeCondition {
    #[serde(default, deserialize_with = "scalar_text")]
    pub name: String,
    #[serde(default, deserialize_with = "scalar_text")]
    pub value: String,
}

/// 权限匹配项（User Entitlements 规则）
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EntitlementMatch {
    #[serde(default, deserialize_with = "scalar_text")]
    pub attribute: String,
    #[serde(default, deserialize_with = "scalar_text")]
    pub tag: String,
    #[serde(rename = "type", default, deserialize_with = "scalar_text")]
    pub match_type: String,
}

/// 脱敏列
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MaskedField {
    #[serde(rename = "columnTag", default, deserialize_with = "scalar_text")]
    pub column_tag: String,
    #[serde(rename = "type", default, deserialize_with = "scalar_text")]
    pub field_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MaskingConfig {
    #[serde(rename = "type", default, deserialize_with = "opt_scalar")]
    pub masking_type: Option<String>,
}

/// 规则类型
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RuleType {
    CustomWhereClause,
    UserEntitlements,
    Masking,
    Other(String),
}

impl From<&str> for RuleType {
    fn from(s: &str) -> Self {
        match s {
            CUSTOM_WHERE_CLAUSE_TYPE => RuleType::CustomWhereClause,
            USER_ENTITLEMENTS_TYPE => RuleType::UserEntitlements,
            MASKING_TYPE => RuleType::Masking,
            other => RuleType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleType::CustomWhereClause => f.write_str(CUSTOM_WHERE_CLAUSE_TYPE),
            RuleType::UserEntitlements => f.write_str(USER_ENTITLEMENTS_TYPE),
            RuleType::Masking => f.write_str(MASKING_TYPE),
            RuleType::Other(s) => f.write_str(s),
        }
    }
}

/// 多个适用条件的组合方式
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    Any,
    All,
    Other(String),
}

impl Operator {
    /// 只有 `any` 用 OR 连接，其余一律 AND
    pub fn joiner(&self) -> &'static str {
        match self {
            Operator::Any => " OR ",
            _ => " AND ",
        }
    }
}

impl From<&str> for Operator {
    fn from(s: &str) -> Self {
        match s {
            "any" => Operator::Any,
            "all" => Operator::All,
            other => Operator::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Any => f.write_str("any"),
            Operator::All => f.write_str("all"),
            Operator::Other(s) => f.write_str(s),
        }
    }
}

impl Rule {
    pub fn inclusions(&self) -> &Inclusions {
        resolve(
            self.inclusions.as_ref(),
            self.config.inclusions.as_ref(),
            &EMPTY_INCLUSIONS,
        )
    }

    pub fn exceptions(&self) -> &Exceptions {
        resolve(
            self.exceptions.as_ref(),
            self.config.exceptions.as_ref(),
            &EMPTY_EXCEPTIONS,
        )
    }

    /// 原始 operator 文本（缺省 `any`）
    pub fn operator_text(&self) -> &str {
        resolve(
            self.operator.as_deref(),
            self.config.operator.as_deref(),
            DEFAULT_OPERATOR,
        )
    }

    pub fn operator(&self) -> Operator {
        Operator::from(self.operator_text())
    }

    pub fn rule_type(&self) -> RuleType {
        RuleType::from(resolve(
            self.rule_type.as_deref(),
            self.config.rule_type.as_deref(),
            DEFAULT_RULE_TYPE,
        ))
    }

    pub fn matches(&self) -> &[EntitlementMatch] {
        resolve::<[EntitlementMatch]>(
            self.matches.as_deref(),
            self.config.matches.as_deref(),
            &[],
        )
    }

    /// 过滤谓词（只存在于 `config` 下，缺省空串）
    pub fn predicate(&self) -> &str {
        self.config.predicate.as_deref().unwrap_or("")
    }

    pub fn masking_method(&self) -> &str {
        self.config
            .masking_config
            .as_ref()
            .and_then(|m| m.masking_type.as_deref())
            .unwrap_or(DEFAULT_RULE_TYPE)
    }
}

// ============================================================
// serde helpers
// ============================================================

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// 接受任意 YAML 标量并转为文本
fn opt_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::Null => Ok(None),
        serde_yaml::Value::String(s) => Ok(Some(s)),
        serde_yaml::Value::Bool(b) => Ok(Some(b.to_string())),
        serde_yaml::Value::Number(n) => Ok(Some(n.to_string())),
        serde_yaml::Value::Sequence(_) => Err(D::Error::custom("expected scalar, found sequence")),
        serde_yaml::Value::Mapping(_) => Err(D::Error::custom("expected scalar, found mapping")),
        serde_yaml::Value::Tagged(_) => Err(D::Error::custom("expected scalar, found tag")),
    }
}

fn scalar_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_scalar(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(yaml: &str) -> Rule {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_rule_level_takes_precedence() {
        let r = rule(
            r#"
operator: all
inclusions:
  groups: [rule.level]
config:
  operator: any
  inclusions:
    groups: [config.level]
"#,
        );
        assert_eq!(r.operator(), Operator::All);
        assert_eq!(r.inclusions().groups, vec!["rule.level"]);
    }

    #[test]
    fn test_falls_back_to_config_then_default() {
        let r = rule(
            r#"
config:
  type: Masking
  exceptions:
    groups: [auditors]
"#,
        );
        assert_eq!(r.rule_type(), RuleType::Masking);
        assert_eq!(r.exceptions().groups, vec!["auditors"]);
        assert_eq!(r.operator_text(), "any");
        assert!(r.inclusions().is_empty());
        assert_eq!(r.predicate(), "");
        assert_eq!(r.masking_method(), "Unknown");

        let bare = Rule::default();
        assert_eq!(bare.rule_type(), RuleType::Other("Unknown".into()));
    }

    #[test]
    fn test_scalar_values_rendered_as_text() {
        let r = rule(
            r#"
inclusions:
  attributes:
    - name: Level
      value: 3
    - name: Active
      value: true
"#,
        );
        let attrs = &r.inclusions().attributes;
        assert_eq!(attrs[0].value, "3");
        assert_eq!(attrs[1].value, "true");
    }

    #[test]
    fn test_null_collections_tolerated() {
        let r = rule("config:\n  fields: ~\ninclusions:\n  groups: ~\n");
        assert!(r.config.fields.is_empty());
        assert!(r.inclusions().is_empty());
    }

    #[test]
    fn test_operator_joiner() {
        assert_eq!(Operator::from("any").joiner(), " OR ");
        assert_eq!(Operator::from("all").joiner(), " AND ");
        assert_eq!(Operator::from("some").joiner(), " AND ");
        assert_eq!(Operator::from("some").to_string(), "some");
    }
}
