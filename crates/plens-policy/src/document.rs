//! 文档组装：解释文本 → 可导出的文档结构
//!
//! [`Explanation`] 是单个配置的完整说明（数据集、原始配置、逐条规则叙述），
//! [`Document`] 是渲染后端消费的分段结构。Word / PDF 后端不在本 crate 内，
//! 通过 [`DocumentRenderer`] 接入；内置只有 Markdown。

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use plens_common::RenderError;

use crate::dataset::dataset_name;
use crate::extract::extract_rules;
use crate::model::Configuration;
use crate::narrator::narrate;

/// 单个配置的说明
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
    pub dataset_name: String,
    pub file_name: String,
    /// 原始配置的 YAML 重新渲染
    pub configuration_yaml: String,
    /// 每条规则一个叙述块
    pub rules: Vec<String>,
}

impl Explanation {
    pub fn from_configuration(config: &Configuration, file_name: &str) -> Self {
        let configuration_yaml = serde_yaml::to_string(&config.document).unwrap_or_else(|e| {
            tracing::warn!(error = %e, file_name, "cannot re-render configuration");
            String::new()
        });
        let rules = extract_rules(config)
            .iter()
            .enumerate()
            .map(|(i, rule)| narrate(rule, i))
            .collect();

        Self {
            dataset_name: dataset_name(config),
            file_name: file_name.to_string(),
            configuration_yaml,
            rules,
        }
    }

    /// 完整的叙述文本（Markdown）
    pub fn to_markdown(&self) -> String {
        if self.rules.is_empty() {
            return format!(
                "# Immuta Rule Configuration\n\n\
                 Dataset/Table: {}\n\
                 File Name: {}\n\n\
                 ## Configuration\n\n\
                 ```yaml\n{}```\n\n\
                 ## Analysis\n\n\
                 {}",
                self.dataset_name,
                self.file_name,
                self.configuration_yaml,
                NO_RULES_ANALYSIS,
            );
        }

        let mut out = String::from("# Immuta Rule Configuration Explanation\n");
        out.push_str(&format!("Dataset/Table: {}\n", self.dataset_name));
        out.push_str(&format!("File Name: {}\n\n", self.file_name));
        out.push_str("## Configuration\n```yaml\n");
        out.push_str(&self.configuration_yaml);
        out.push_str("```\n\n## Explanation\n");
        for block in &self.rules {
            out.push_str(block);
        }
        out
    }
}

const NO_RULES_ANALYSIS: &str = "No rules found in this configuration file. This may be:\n\
- A configuration file without rules\n\
- A template or placeholder file\n\
- An incomplete configuration";

// ============================================================
// Document structure
// ============================================================

/// 文档块
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    RuleHeading(String),
    StepHeading(String),
    /// `- **Action if True:** ...`
    ActionBullet {
        label: String,
        text: String,
    },
    Bullet(String),
    Body(String),
    Code {
        language: String,
        content: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub heading: String,
    pub blocks: Vec<Block>,
}

/// 渲染后端消费的文档
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub title: String,
    /// 信息表（标签, 值）
    pub info: Vec<(String, String)>,
    pub sections: Vec<Section>,
}

impl Document {
    pub fn assemble(explanation: &Explanation) -> Self {
        let mut sections = vec![Section {
            heading: "YAML Configuration".to_string(),
            blocks: vec![Block::Code {
                language: "yaml".to_string(),
                content: explanation.configuration_yaml.clone(),
            }],
        }];

        if explanation.rules.is_empty() {
            sections.push(Section {
                heading: "Analysis".to_string(),
                blocks: classify_lines(NO_RULES_ANALYSIS),
            });
        } else {
            sections.push(Section {
                heading: "Rule Explanations".to_string(),
                blocks: explanation
                    .rules
                    .iter()
                    .flat_map(|block| classify_lines(block))
                    .collect(),
            });
        }

        Self {
            title: "Immuta Rule Configuration Analysis".to_string(),
            info: vec![
                ("Dataset/Table".to_string(), explanation.dataset_name.clone()),
                ("File Name".to_string(), explanation.file_name.clone()),
            ],
            sections,
        }
    }
}

/// 把叙述文本按行归类成块
fn classify_lines(text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(rest) = line.strip_prefix("- ") {
            match split_bold(rest) {
                Some((label, text)) => blocks.push(Block::ActionBullet {
                    label: label.to_string(),
                    text: text.to_string(),
                }),
                None => blocks.push(Block::Bullet(rest.to_string())),
            }
        } else if let Some((label, text)) = split_bold(line) {
            if label.starts_with("Rule ") {
                blocks.push(Block::RuleHeading(label.trim_end_matches(':').to_string()));
            } else {
                blocks.push(Block::StepHeading(label.to_string()));
            }
            if !text.is_empty() {
                blocks.push(Block::Body(text.to_string()));
            }
        } else {
            blocks.push(Block::Body(line.to_string()));
        }
    }

    blocks
}

/// `**label** rest` → (label, rest)
fn split_bold(line: &str) -> Option<(&str, &str)> {
    let inner = line.strip_prefix("**")?;
    let end = inner.find("**")?;
    Some((&inner[..end], inner[end + 2..].trim()))
}

// ============================================================
// Rendering
// ============================================================

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    Word,
    Pdf,
    Markdown,
}

impl DocumentFormat {
    pub fn extension(self) -> &'static str {
        match self {
            DocumentFormat::Word => "docx",
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Markdown => "md",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentFormat::Word => f.write_str("word"),
            DocumentFormat::Pdf => f.write_str("pdf"),
            DocumentFormat::Markdown => f.write_str("markdown"),
        }
    }
}

impl FromStr for DocumentFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "word" | "docx" => Ok(DocumentFormat::Word),
            "pdf" => Ok(DocumentFormat::Pdf),
            "markdown" | "md" => Ok(DocumentFormat::Markdown),
            other => Err(format!(
                "unknown document format '{other}' (expected markdown, word or pdf)"
            )),
        }
    }
}

/// `<dataset>_explanation.<ext>`
pub fn output_file_name(dataset: &str, format: DocumentFormat) -> String {
    format!("{}_explanation.{}", dataset, format.extension())
}

/// 文档渲染后端
pub trait DocumentRenderer {
    fn format(&self) -> DocumentFormat;

    fn render(&self, document: &Document, destination: &Path) -> Result<(), RenderError>;
}

/// 内置 Markdown 渲染
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    pub fn render_to_string(&self, document: &Document) -> String {
        let mut out = format!("# {}\n\n", document.title);

        if !document.info.is_empty() {
            out.push_str("| Document Information | |\n|---|---|\n");
            for (label, value) in &document.info {
                out.push_str(&format!("| {} | {} |\n", label, value));
            }
            out.push('\n');
        }

        for section in &document.sections {
            out.push_str(&format!("## {}\n\n", section.heading));
            for block in &section.blocks {
                match block {
                    Block::RuleHeading(text) => out.push_str(&format!("\n### {}\n\n", text)),
                    Block::StepHeading(text) => out.push_str(&format!("**{}**\n\n", text)),
                    Block::ActionBullet { label, text } => {
                        out.push_str(&format!("- **{}** {}\n", label, text))
                    }
                    Block::Bullet(text) => out.push_str(&format!("- {}\n", text)),
                    Block::Body(text) => out.push_str(&format!("{}\n\n", text)),
                    Block::Code { language, content } => {
                        out.push_str(&format!("```{}\n{}", language, content));
                        if !content.ends_with('\n') {
                            out.push('\n');
                        }
                        out.push_str("```\n\n");
                    }
                }
            }
            out.push('\n');
        }

        out.push_str("_Generated by policy-lens_\n");
        out
    }
}

impl DocumentRenderer for MarkdownRenderer {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Markdown
    }

    fn render(&self, document: &Document, destination: &Path) -> Result<(), RenderError> {
        std::fs::write(destination, self.render_to_string(document)).map_err(|source| {
            RenderError::Io {
                path: destination.display().to_string(),
                source,
            }
        })?;
        tracing::debug!(destination = %destination.display(), "markdown document written");
        Ok(())
    }
}

/// 取内置渲染器；Word / PDF 需要外部后端
pub fn builtin_renderer(format: DocumentFormat) -> Result<Box<dyn DocumentRenderer>, RenderError> {
    match format {
        DocumentFormat::Markdown => Ok(Box::new(MarkdownRenderer)),
        other => Err(RenderError::UnsupportedFormat(other.to_string())),
    }
}
