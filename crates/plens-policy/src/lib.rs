//! policy-lens Policy — 策略配置的加载与解释
//!
//! 包含：
//! - YAML 配置加载（容忍制表符 / CRLF / 空文档）
//! - 规则提取（顶层 + actions 内嵌，保持顺序）
//! - 谓词解释与规则分步叙述
//! - 数据集名解析与文档组装

pub mod dataset;
pub mod document;
pub mod extract;
pub mod loader;
pub mod model;
pub mod narrator;
pub mod predicate;

pub use dataset::dataset_name;
pub use document::{
    Block, Document, DocumentFormat, DocumentRenderer, Explanation, MarkdownRenderer, Section,
    builtin_renderer, output_file_name,
};
pub use extract::extract_rules;
pub use loader::{LoadOutcome, load, load_bytes, load_file, read_source};
pub use model::*;
pub use narrator::narrate;
pub use predicate::{PredicateClause, explain, is_unrestricted, recognize};
