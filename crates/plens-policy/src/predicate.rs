//! 谓词解释器：把固定几种谓词形态翻译成英文从句
//!
//! 识别三种形态（互相独立尝试，识别到的从句用 " or " 连接）：
//! 1. `split(<field>, '<delim>')[safe_offset(<n>)] in (<v>, ...)`
//! 2. `<field> in (<v>, ...)`（文本中没有 `split(` 时才尝试，避免重复渲染）
//! 3. `@attributeValuesContains('<attr>', '<tag>')`
//!
//! 都不匹配时原样返回，让读者看到无法识别的复杂表达式。

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// 恒真谓词字面量
pub const UNRESTRICTED_PREDICATE: &str = "1=1";

static SPLIT_MEMBERSHIP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"split\(\s*([^,]+),\s*'([^']+)'\s*\)\s*\[safe_offset\((\d+)\)\]\s*in\s*\(\s*([^)]+)\s*\)",
    )
    .unwrap()
});

static MEMBERSHIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+)\s+in\s+\(\s*([^)]+)\s*\)").unwrap());

static ATTRIBUTE_VALUES_CONTAINS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@attributeValuesContains\(\s*'([^']+)',\s*'([^']+)'\s*\)").unwrap()
});

/// 识别出的谓词从句
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredicateClause {
    SplitMembership {
        field: String,
        delimiter: String,
        /// 只记录，说明文本总按 "the first part" 措辞
        offset: usize,
        values: Vec<String>,
    },
    Membership {
        field: String,
        values: Vec<String>,
    },
    AttributeValuesContains {
        user_attribute: String,
        values_from: String,
    },
}

impl fmt::Display for PredicateClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredicateClause::SplitMembership {
                field,
                delimiter,
                values,
                ..
            } => write!(
                f,
                "the first part of {} (split by '{}') is one of: {}",
                field,
                delimiter,
                values.join(", ")
            ),
            PredicateClause::Membership { field, values } => {
                write!(f, "{} is one of: {}", field, values.join(", "))
            }
            PredicateClause::AttributeValuesContains {
                user_attribute,
                values_from,
            } => write!(
                f,
                "the user's {} matches values in {}",
                user_attribute, values_from
            ),
        }
    }
}

/// 拆分值列表：逗号分隔，去空白，去首尾引号
fn clean_values(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|v| v.trim().trim_matches(|c| c == '\'' || c == '"').to_string())
        .collect()
}

/// 识别谓词中的全部已知形态
pub fn recognize(predicate: &str) -> Vec<PredicateClause> {
    let mut clauses = Vec::new();
    let has_split = predicate.contains("split(");

    if has_split && let Some(caps) = SPLIT_MEMBERSHIP_RE.captures(predicate) {
        // \d+ 超出 usize 范围时按 0 处理
        let offset = caps[3].parse().unwrap_or(0);
        clauses.push(PredicateClause::SplitMembership {
            field: caps[1].trim().to_string(),
            delimiter: caps[2].to_string(),
            offset,
            values: clean_values(&caps[4]),
        });
    }

    if !has_split
        && predicate.contains(" in (")
        && let Some(caps) = MEMBERSHIP_RE.captures(predicate)
    {
        clauses.push(PredicateClause::Membership {
            field: caps[1].to_string(),
            values: clean_values(&caps[2]),
        });
    }

    if predicate.contains("@attributeValuesContains")
        && let Some(caps) = ATTRIBUTE_VALUES_CONTAINS_RE.captures(predicate)
    {
        clauses.push(PredicateClause::AttributeValuesContains {
            user_attribute: caps[1].to_string(),
            values_from: caps[2].to_string(),
        });
    }

    clauses
}

/// 把谓词翻译成自然语言；无法识别时原样返回
pub fn explain(predicate: &str) -> String {
    let clauses = recognize(predicate);
    if clauses.is_empty() {
        return predicate.to_string();
    }
    clauses
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" or ")
}

/// 新谓词是否为恒真字面量（`1=1`）
pub fn is_unrestricted(predicate: &str) -> bool {
    predicate == UNRESTRICTED_PREDICATE
}
