//! policy-lens CLI — 策略解释、批量文档生成、影响分析、配置校验

mod batch_cmd;
mod diff_cmd;
mod explain_cmd;

use clap::{Parser, Subcommand};
use plens_policy::{DocumentFormat, LoadOutcome, extract_rules, load_file};

#[derive(Parser)]
#[command(name = "plens", about = "Policy Lens CLI", version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 解释单个策略配置
    Explain {
        /// 配置文件路径（YAML）
        #[arg(short, long)]
        file: String,
        /// 输出目录；省略时把说明打印到 stdout
        #[arg(short, long)]
        output: Option<String>,
        /// 文档格式：markdown / word / pdf
        #[arg(long, default_value = "markdown")]
        format: DocumentFormat,
    },
    /// 批量生成目录下所有配置的说明文档
    Batch {
        /// 输入目录（扫描 *.yaml / *.yml）
        #[arg(short, long)]
        input: String,
        /// 输出目录
        #[arg(short, long)]
        output: String,
        /// 文档格式，可用逗号分隔多个：markdown / word / pdf
        #[arg(long, value_delimiter = ',', default_value = "markdown")]
        format: Vec<DocumentFormat>,
    },
    /// 两个策略版本之间的影响分析
    Diff {
        /// 旧配置文件路径
        #[arg(long)]
        old: String,
        /// 新配置文件路径
        #[arg(long)]
        new: String,
        /// 输出报告路径（JSON）
        #[arg(short, long)]
        output: Option<String>,
        /// 输出格式
        #[arg(long, value_enum, default_value_t = diff_cmd::ReportFormat::Text)]
        format: diff_cmd::ReportFormat,
        /// 不调用摘要服务
        #[arg(long)]
        no_llm: bool,
    },
    /// 校验配置能否加载
    Validate {
        /// 配置文件路径
        #[arg(short, long)]
        file: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let env_filter = format!("plens_cli={level},plens_policy={level},plens_impact={level}");
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Explain {
            file,
            output,
            format,
        } => explain_cmd::run(file, output, format),
        Commands::Batch {
            input,
            output,
            format,
        } => batch_cmd::run(input, output, format),
        Commands::Diff {
            old,
            new,
            output,
            format,
            no_llm,
        } => diff_cmd::run(old, new, output, format, no_llm),
        Commands::Validate { file } => {
            tracing::info!(%file, "validating configuration");
            match load_file(std::path::Path::new(&file)) {
                Ok(LoadOutcome::Loaded(config)) => {
                    let rules = extract_rules(&config);
                    println!("Configuration is valid: {} rule(s)", rules.len());
                    Ok(())
                }
                Ok(LoadOutcome::Empty) => {
                    println!("Configuration is empty: 0 rule(s)");
                    Ok(())
                }
                Err(e) => {
                    eprintln!("Configuration validation failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}
