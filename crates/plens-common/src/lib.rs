//! policy-lens Common — 共享错误类型与工具函数
//!
//! 包含按文件隔离的错误分类（解析 / 渲染 / 摘要不可用）以及 blake3 内容指纹。

pub mod error;
pub mod hash;

pub use error::{AnalysisUnavailable, ParseError, PlensError, RenderError};
