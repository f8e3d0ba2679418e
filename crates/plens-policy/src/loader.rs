//! 配置加载器：原始文本 → [`Configuration`]
//!
//! 解析前先做格式清理（制表符 → 四个空格，CRLF → LF）。空文档不是错误，
//! 返回 [`LoadOutcome::Empty`]，调用方据此按文件跳过。

use std::path::Path;

use plens_common::ParseError;

use crate::model::Configuration;

/// 加载结果
pub type LoadResult<T> = Result<T, ParseError>;

/// 加载成功时的两种结局
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded(Configuration),
    /// 空白文档或只有注释的文档
    Empty,
}

impl LoadOutcome {
    pub fn configuration(self) -> Option<Configuration> {
        match self {
            LoadOutcome::Loaded(config) => Some(config),
            LoadOutcome::Empty => None,
        }
    }

    /// 空文档视为没有任何规则的配置
    pub fn or_empty_configuration(self) -> Configuration {
        self.configuration().unwrap_or_default()
    }
}

/// 解析前的格式清理
pub fn normalize(text: &str) -> String {
    text.replace('\t', "    ").replace("\r\n", "\n")
}

/// 从文本加载配置
pub fn load(text: &str) -> LoadResult<LoadOutcome> {
    if text.trim().is_empty() {
        return Ok(LoadOutcome::Empty);
    }

    let cleaned = normalize(text);
    let document: serde_yaml::Value = serde_yaml::from_str(&cleaned)
        .map_err(|e| ParseError::syntax(e.to_string(), &cleaned))?;

    let found = match &document {
        serde_yaml::Value::Null => return Ok(LoadOutcome::Empty),
        serde_yaml::Value::Mapping(_) => None,
        serde_yaml::Value::Bool(_) => Some("a boolean"),
        serde_yaml::Value::Number(_) => Some("a number"),
        serde_yaml::Value::String(_) => Some("a string"),
        serde_yaml::Value::Sequence(_) => Some("a sequence"),
        serde_yaml::Value::Tagged(_) => Some("a tagged value"),
    };
    if let Some(found) = found {
        return Err(ParseError::NotAMapping { found });
    }

    let mut config: Configuration = serde_yaml::from_value(document.clone())
        .map_err(|e| ParseError::Schema(e.to_string()))?;
    config.document = document;

    tracing::debug!(
        name = config.name.as_deref().unwrap_or("<unnamed>"),
        top_level_rules = config.rules.as_ref().map_or(0, Vec::len),
        actions = config.actions.as_ref().map_or(0, Vec::len),
        "configuration loaded"
    );

    Ok(LoadOutcome::Loaded(config))
}

/// 从字节加载（要求 UTF-8）
pub fn load_bytes(bytes: &[u8]) -> LoadResult<LoadOutcome> {
    let text = std::str::from_utf8(bytes)?;
    load(text)
}

/// 读取配置文件原文（要求 UTF-8），不解析
pub fn read_source(path: &Path) -> LoadResult<String> {
    let bytes = std::fs::read(path).map_err(|source| ParseError::Io {
        path: path.display().to_string(),
        source,
    })?;
    String::from_utf8(bytes).map_err(|e| ParseError::Decode(e.utf8_error()))
}

/// 从文件加载
pub fn load_file(path: &Path) -> LoadResult<LoadOutcome> {
    load(&read_source(path)?)
}
