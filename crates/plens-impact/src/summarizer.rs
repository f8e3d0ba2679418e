//! 叙述性影响摘要
//!
//! 结构化报告完成后才调用摘要器；任何失败都只降级为占位文本，
//! 不影响报告本身。

use std::time::Duration;

use plens_common::AnalysisUnavailable;
use serde::{Deserialize, Serialize};

use crate::report::RuleChange;

/// 摘要不可用时的占位文本
pub const ANALYSIS_UNAVAILABLE: &str = "analysis unavailable";

/// 默认模型
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// 默认请求超时（秒）
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// 默认输出语言
pub const DEFAULT_LANGUAGE: &str = "English";
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// 摘要请求：两份配置原文和检测到的差异
#[derive(Debug, Clone, Copy)]
pub struct SummaryRequest<'a> {
    pub old_text: &'a str,
    pub new_text: &'a str,
    pub changes: &'a [RuleChange],
}

/// 摘要器
pub trait Summarizer: Send + Sync {
    fn summarize(&self, request: &SummaryRequest<'_>) -> Result<String, AnalysisUnavailable>;
}

/// 未配置摘要服务时使用
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableSummarizer;

impl Summarizer for UnavailableSummarizer {
    fn summarize(&self, _request: &SummaryRequest<'_>) -> Result<String, AnalysisUnavailable> {
        Err(AnalysisUnavailable::NotConfigured)
    }
}

// ============================================================
// 配置
// ============================================================

/// 摘要服务配置
#[derive(Debug, Clone, PartialEq)]
pub struct SummarizerConfig {
    /// OpenAI 兼容服务的基地址，请求发往 `{endpoint}/chat/completions`
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
    pub max_tokens: u32,
    pub temperature: f32,
    pub language: String,
}

impl SummarizerConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    /// 从环境变量读取；未设置 `PLENS_LLM_ENDPOINT` 时返回 `None`
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 用任意键值来源构建配置
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let endpoint = lookup("PLENS_LLM_ENDPOINT").filter(|v| !v.trim().is_empty())?;
        let mut config = Self::new(endpoint);

        config.api_key = lookup("PLENS_LLM_API_KEY").filter(|v| !v.is_empty());
        if let Some(model) = lookup("PLENS_LLM_MODEL").filter(|v| !v.is_empty()) {
            config.model = model;
        }
        let timeout_secs = lookup("PLENS_LLM_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        config.timeout = Duration::from_secs(timeout_secs);
        if let Some(language) = lookup("PLENS_LLM_LANGUAGE").filter(|v| !v.is_empty()) {
            config.language = language;
        }

        Some(config)
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
    }
}

// ============================================================
// Chat completion 摘要器
// ============================================================

/// 调用 OpenAI 兼容 `/chat/completions` 接口的摘要器
///
/// 自带一个单线程 tokio 运行时，对外保持同步接口。
pub struct ChatCompletionSummarizer {
    config: SummarizerConfig,
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionSummarizer {
    pub fn new(config: SummarizerConfig) -> Result<Self, AnalysisUnavailable> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AnalysisUnavailable::Transport(e.to_string()))?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| AnalysisUnavailable::Transport(e.to_string()))?;

        Ok(Self {
            config,
            client,
            runtime,
        })
    }

    pub fn config(&self) -> &SummarizerConfig {
        &self.config
    }

    async fn complete(&self, prompt: &str) -> Result<String, AnalysisUnavailable> {
        let system = format!(
            "You are an expert in data policy analysis. \
             Provide detailed impact analysis in {}.",
            self.config.language
        );
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let mut request = self.client.post(self.config.completions_url()).json(&body);
        if let Some(ref key) = self.config.api_key {
            request = request.bearer_auth(key);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| AnalysisUnavailable::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AnalysisUnavailable::Status(status.as_u16()));
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| AnalysisUnavailable::BadResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| AnalysisUnavailable::BadResponse("empty completion".to_string()))
    }
}

impl Summarizer for ChatCompletionSummarizer {
    fn summarize(&self, request: &SummaryRequest<'_>) -> Result<String, AnalysisUnavailable> {
        let prompt = build_prompt(request, &self.config.language);
        let timeout = self.config.timeout;

        tracing::debug!(
            endpoint = %self.config.endpoint,
            model = %self.config.model,
            changes = request.changes.len(),
            "requesting impact narrative"
        );

        self.runtime.block_on(async {
            tokio::time::timeout(timeout, self.complete(&prompt))
                .await
                .map_err(|_| AnalysisUnavailable::Timeout(timeout.as_secs()))?
        })
    }
}

// ============================================================
// Prompt
// ============================================================

const FEW_SHOT_EXAMPLES: &str = r#"# Few-shot Examples:

## Example 1:
Old YAML: predicate: "DeptName in ('ECM', 'EFE')"
New YAML: predicate: "1=1"

Analysis:
🚨 **Critical impact - predicate changed to 1=1**

**Business impact:**
- Users will see all data (no filtering)
- Previously they only saw rows matching the Department condition

**Security risk:**
- Data that should stay hidden may be exposed
- Access control over this dataset is weakened

**Recommendations:**
- Confirm that this change is really intended
- Test with affected users before rolling out

## Example 2:
Old YAML: groups: ["team.finance"]
New YAML: groups: ["team.finance", "team.audit"]

Analysis:
✅ **Access granted to an additional group**

**Business impact:**
- The Audit team joins the groups that can access this data
- Access is extended to more users

**Security risk:**
- Low risk - the added team is related to the data

**Recommendations:**
- Confirm that the Audit team needs access to this data"#;

/// 构建 few-shot 提示词
pub fn build_prompt(request: &SummaryRequest<'_>, language: &str) -> String {
    let changes = if request.changes.is_empty() {
        "- (none)".to_string()
    } else {
        request
            .changes
            .iter()
            .map(|c| {
                format!(
                    "- Rule {} ({}, {}): {}",
                    c.rule_number, c.change_type, c.impact, c.description
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "You are an expert in Immuta data policy analysis. Analyze the changes between \
         old and new YAML configurations and provide impact assessment in {language}.\n\n\
         {FEW_SHOT_EXAMPLES}\n\n\
         # Current Analysis:\n\
         Old YAML:\n{old}\n\n\
         New YAML:\n{new}\n\n\
         Detected Changes:\n{changes}\n\n\
         Please analyze the impact in {language} following the format above:",
        old = request.old_text,
        new = request.new_text,
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::report::{ChangeType, ImpactLevel};

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_requires_endpoint() {
        assert!(SummarizerConfig::from_lookup(lookup_from(&[])).is_none());
        let blank = lookup_from(&[("PLENS_LLM_ENDPOINT", " ")]);
        assert!(SummarizerConfig::from_lookup(blank).is_none());
    }

    #[test]
    fn test_config_defaults_and_overrides() {
        let config =
            SummarizerConfig::from_lookup(lookup_from(&[("PLENS_LLM_ENDPOINT", "http://llm/v1/")]))
                .unwrap();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.language, "English");
        assert!(config.api_key.is_none());
        assert_eq!(config.completions_url(), "http://llm/v1/chat/completions");

        let config = SummarizerConfig::from_lookup(lookup_from(&[
            ("PLENS_LLM_ENDPOINT", "http://llm"),
            ("PLENS_LLM_API_KEY", "sk-test"),
            ("PLENS_LLM_MODEL", "local-model"),
            ("PLENS_LLM_TIMEOUT_SECS", "5"),
            ("PLENS_LLM_LANGUAGE", "Thai"),
        ]))
        .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.model, "local-model");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.language, "Thai");

        let bad_timeout = SummarizerConfig::from_lookup(lookup_from(&[
            ("PLENS_LLM_ENDPOINT", "http://llm"),
            ("PLENS_LLM_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap();
        assert_eq!(bad_timeout.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_prompt_carries_inputs_and_changes() {
        let changes = vec![RuleChange {
            rule_number: 1,
            change_type: ChangeType::Modified,
            description: "Predicate changed from 'a' to '1=1'".into(),
            impact: ImpactLevel::High,
            deltas: Vec::new(),
        }];
        let request = SummaryRequest {
            old_text: "name: old-policy",
            new_text: "name: new-policy",
            changes: &changes,
        };
        let prompt = build_prompt(&request, "Thai");
        assert!(prompt.contains("provide impact assessment in Thai"));
        assert!(prompt.contains("## Example 2:"));
        assert!(prompt.contains("Old YAML:\nname: old-policy"));
        assert!(prompt.contains("New YAML:\nname: new-policy"));
        assert!(prompt.contains("- Rule 1 (MODIFIED, HIGH): Predicate changed from 'a' to '1=1'"));
        assert!(prompt.ends_with("following the format above:"));
    }

    #[test]
    fn test_unavailable_summarizer() {
        let request = SummaryRequest {
            old_text: "",
            new_text: "",
            changes: &[],
        };
        assert!(matches!(
            UnavailableSummarizer.summarize(&request),
            Err(AnalysisUnavailable::NotConfigured)
        ));
    }

    #[test]
    fn test_unreachable_endpoint_is_unavailable() {
        let mut config = SummarizerConfig::new("http://127.0.0.1:1");
        config.timeout = Duration::from_secs(2);
        let summarizer = ChatCompletionSummarizer::new(config).unwrap();
        let request = SummaryRequest {
            old_text: "a",
            new_text: "b",
            changes: &[],
        };
        let err = summarizer.summarize(&request).unwrap_err();
        assert!(matches!(
            err,
            AnalysisUnavailable::Transport(_) | AnalysisUnavailable::Timeout(_)
        ));
    }
}
