//! 命令行入口

use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use bharatverse::env::{core::LogLevel, generate_env_docs, EnvVar};
use bharatverse::parsers::{html_to_dom, serialize_document};
use bharatverse::translation::{
    content_regions, BatchApplier, ConfigManager, DomAdapter, LanguageChange, LanguageCode,
    PassOutcome, RcDomAdapter, TextExtractor, TranslationConfig, TranslationService,
};

const DOCUMENT_ENCODING: &str = "utf-8";

#[derive(Parser, Debug)]
#[command(name = "bharatverse", version, about = "BharatVerse 页面翻译工具")]
struct Cli {
    /// 配置文件路径，未指定时按默认路径查找
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 按区域列出页面中可翻译的文本
    Extract { file: PathBuf },

    /// 把页面翻译成指定语言
    Translate {
        file: PathBuf,
        #[arg(short, long)]
        lang: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// 跳过确认提示
        #[arg(short, long)]
        yes: bool,
    },

    /// 还原页面中的译文
    Revert {
        file: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 列出支持的语言
    Languages,

    /// 生成示例配置文件
    Config {
        #[arg(long)]
        example: PathBuf,
    },

    /// 打印环境变量说明
    Env,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    init_logging();

    let cli = Cli::parse();
    match cli.command {
        Command::Extract { file } => extract(&file),
        Command::Translate {
            file,
            lang,
            output,
            yes,
        } => {
            let config = load_config(cli.config.as_deref())?;
            translate(&config, &file, &lang, output.as_deref(), yes).await
        }
        Command::Revert { file, output } => {
            let config = load_config(cli.config.as_deref())?;
            revert(&config, &file, output.as_deref())
        }
        Command::Languages => {
            for language in LanguageCode::all() {
                println!(
                    "{:<4} {:<10} {:<12} {}",
                    language.code(),
                    language.label(),
                    language.native_label(),
                    language.direction().as_html()
                );
            }
            Ok(())
        }
        Command::Config { example } => {
            ConfigManager::generate_example_config(&example.to_string_lossy())?;
            println!("示例配置已写入 {}", example.display());
            Ok(())
        }
        Command::Env => {
            print!("{}", generate_env_docs());
            Ok(())
        }
    }
}

fn init_logging() {
    let level = LogLevel::get()
        .ok()
        .and_then(|level| level.parse::<tracing::Level>().ok())
        .unwrap_or(tracing::Level::INFO);

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn load_config(path: Option<&str>) -> Result<TranslationConfig, Box<dyn Error>> {
    let manager = match path {
        Some(path) => ConfigManager::from_file(path)?,
        None => ConfigManager::load()?,
    };
    Ok(manager.into_config())
}

fn read_document(file: &Path) -> Result<RcDomAdapter, Box<dyn Error>> {
    let data = std::fs::read(file)?;
    Ok(RcDomAdapter::new(html_to_dom(&data, DOCUMENT_ENCODING)?))
}

fn write_document(dom: RcDomAdapter, output: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let html = serialize_document(dom.into_dom(), DOCUMENT_ENCODING)?;
    match output {
        Some(path) => std::fs::write(path, html)?,
        None => io::stdout().write_all(&html)?,
    }
    Ok(())
}

fn extract(file: &Path) -> Result<(), Box<dyn Error>> {
    let dom = read_document(file)?;
    let extractor = TextExtractor::new();

    for region in content_regions(&dom, &dom.root()) {
        let tag = dom.tag_name(&region).unwrap_or_else(|| "#document".to_string());
        println!("[{}]", tag);
        for fragment in extractor.extract(&dom, &region) {
            println!("  {}", fragment.text());
        }
    }
    Ok(())
}

fn confirm_prompt(language: LanguageCode) -> io::Result<bool> {
    print!(
        "翻译成 {} ({}) 会调用翻译服务，是否继续? [y/N] ",
        language.native_label(),
        language.code()
    );
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

async fn translate(
    config: &TranslationConfig,
    file: &Path,
    lang: &str,
    output: Option<&Path>,
    yes: bool,
) -> Result<(), Box<dyn Error>> {
    let target = LanguageCode::from_code(lang)?;
    let dom = read_document(file)?;
    let service = TranslationService::from_config(config)?;

    let preferred = service.restore();
    tracing::debug!("上次选择的语言: {}", preferred);

    match service.change_language(&dom, target)? {
        LanguageChange::Unchanged => {
            tracing::info!("页面已经是 {}", target);
        }
        LanguageChange::Reverted { elements } => {
            tracing::info!("已还原 {} 个元素", elements);
        }
        LanguageChange::ConfirmationRequired { target } => {
            if !yes && !confirm_prompt(target)? {
                service.decline()?;
                eprintln!("已取消");
                return Ok(());
            }

            let report = service.confirm(&dom).await?;
            eprintln!(
                "{}: {}/{} 个区域，{} 段文本，跳过 {} 个批次",
                match report.outcome {
                    PassOutcome::Completed => "完成",
                    PassOutcome::Aborted => "已取消",
                },
                report.regions_translated,
                report.regions_total,
                report.fragments_translated,
                report.batches_skipped
            );
        }
    }

    write_document(dom, output)
}

fn revert(
    config: &TranslationConfig,
    file: &Path,
    output: Option<&Path>,
) -> Result<(), Box<dyn Error>> {
    let dom = read_document(file)?;
    let applier = BatchApplier::new(config.marker_attribute.clone());

    let restored = applier.revert(&dom, &dom.root());
    eprintln!("还原了 {} 个元素", restored);

    write_document(dom, output)
}
