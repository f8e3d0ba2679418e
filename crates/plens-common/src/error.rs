use thiserror::Error;

/// 配置解析错误（按文件可恢复，批处理继续下一个文件）
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration is not valid UTF-8: {0}")]
    Decode(#[from] std::str::Utf8Error),

    #[error("YAML syntax error in {line_count}-line document: {message}")]
    Syntax {
        message: String,
        line_count: usize,
        /// 文档前几行，用于诊断
        preview: Vec<String>,
    },

    #[error("configuration root must be a mapping, found {found}")]
    NotAMapping { found: &'static str },

    #[error("configuration schema error: {0}")]
    Schema(String),
}

/// 文档渲染错误（只跳过对应产物，解释文本本身不丢失）
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to write '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no renderer registered for {0} output")]
    UnsupportedFormat(String),
}

/// 可选的摘要服务不可用（总是降级为占位文本，从不作为失败上抛）
#[derive(Error, Debug)]
pub enum AnalysisUnavailable {
    #[error("summarizer is not configured")]
    NotConfigured,

    #[error("summarizer timed out after {0}s")]
    Timeout(u64),

    #[error("summarizer transport error: {0}")]
    Transport(String),

    #[error("summarizer returned HTTP {0}")]
    Status(u16),

    #[error("summarizer returned an unusable response: {0}")]
    BadResponse(String),
}

/// policy-lens 通用错误类型
///
/// 摘要服务不可用不在其中：它只会降级，不计入失败。
#[derive(Error, Debug)]
pub enum PlensError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("invalid invocation: {0}")]
    InvalidInvocation(String),
}

impl ParseError {
    /// 从 serde_yaml 错误构造 Syntax 变体，附带行数与前三行预览
    pub fn syntax(message: impl Into<String>, source_text: &str) -> Self {
        ParseError::Syntax {
            message: message.into(),
            line_count: source_text.lines().count(),
            preview: source_text.lines().take(3).map(str::to_string).collect(),
        }
    }
}
