use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use featscan_core::{load_catalog, load_tables, parse_catalog, run_audit_with, scan_tree, Feature, ScanOptions};
use std::path::{Path, PathBuf};
use tracing::info;

mod report;

/// 内置功能目录（BlueBubbles 重写项目）
const DEFAULT_CATALOG: &str = include_str!("../catalog/bluebubbles.toml");

/// 命令行入口（基于 clap）
#[derive(Parser, Debug)]
#[command(name = "featscan", version, about = "功能覆盖率审计：对照功能目录扫描源码树")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 扫描源码树，匹配功能目录并生成覆盖率报告
    Scan {
        /// 源码树根目录（其下每个顶层目录视为一个模块）
        #[arg(long)]
        root: PathBuf,

        /// 功能目录文件（TOML），默认使用内置目录
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// 匹配表文件（TOML），默认使用内置表
        #[arg(long)]
        tables: Option<PathBuf>,

        /// 报告输出目录
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// 只打印，不写报告文件
        #[arg(long)]
        no_write: bool,

        /// 以 JSON 形式输出到 stdout（替代终端报告）
        #[arg(long)]
        json: bool,

        /// 匹配线程数（"auto"=CPU 核心数）
        #[arg(long, default_value = "1")]
        threads: String,

        /// 覆盖匹配表中的源文件扩展名
        #[arg(long)]
        extension: Option<String>,

        /// 符号正则无效时告警跳过而非报错
        #[arg(long)]
        lenient: bool,

        /// 报告标题
        #[arg(long, default_value = report::DEFAULT_TITLE)]
        title: String,
    },
    /// 只扫描源码树，打印各模块的统计
    Modules {
        /// 源码树根目录
        #[arg(long)]
        root: PathBuf,

        /// 匹配表文件（TOML），默认使用内置表
        #[arg(long)]
        tables: Option<PathBuf>,

        /// 覆盖匹配表中的源文件扩展名
        #[arg(long)]
        extension: Option<String>,

        /// 以 JSON 形式输出
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    // 初始化日志（支持通过 RUST_LOG 控制等级，例如 info、debug）
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan { root, catalog, tables, out_dir, no_write, json, threads, extension, lenient, title } => {
            info!(?root, ?catalog, ?tables, "starting audit");

            let opts = ScanOptions {
                root,
                tables_path: tables,
                extension,
                threads: parse_threads(&threads),
                lenient_patterns: lenient,
            };
            let tables = load_tables(&opts).context("load matching tables")?;
            let features = read_catalog(catalog.as_deref())?;
            let categories = features.iter().map(|f| f.category.as_str()).collect::<std::collections::BTreeSet<_>>();
            info!(features = features.len(), categories = categories.len(), "catalog loaded");

            let outcome = run_audit_with(&opts, &tables, features).context("audit failed")?;
            let generated = chrono::Utc::now();

            if json {
                let doc = report::coverage_document(&outcome, generated);
                println!("{}", serde_json::to_string_pretty(&doc).context("serialize coverage")?);
            } else {
                print!("{}", report::render_terminal(&title, &outcome, generated));
            }

            if !no_write {
                let written = report::write_reports(&out_dir, &title, &outcome, generated)?;
                if !json {
                    println!("Reports generated:");
                    for path in &written {
                        println!("  - {}", path.display());
                    }
                }
            }
        }
        Commands::Modules { root, tables, extension, json } => {
            let opts = ScanOptions { tables_path: tables, extension, ..ScanOptions::new(root) };
            let tables = load_tables(&opts).context("load matching tables")?;
            let (index, stats) = scan_tree(&opts.root, &tables, opts.extension.as_deref(), opts.lenient_patterns)
                .context("scan source tree")?;
            if json {
                let doc = report::module_summaries(&index.modules);
                println!("{}", serde_json::to_string_pretty(&doc).context("serialize modules")?);
            } else {
                print!("{}", report::render_modules(&index.modules));
            }
            info!(modules = stats.modules, files = stats.files_scanned, lines = stats.lines_total, "modules listed");
        }
    }

    Ok(())
}

/// 读取功能目录：指定文件优先，否则用内置目录
fn read_catalog(path: Option<&Path>) -> Result<Vec<Feature>> {
    match path {
        Some(p) => load_catalog(p).with_context(|| format!("load catalog {}", p.display())),
        None => parse_catalog(DEFAULT_CATALOG, "builtin catalog").context("parse builtin catalog"),
    }
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    // 支持通过环境变量 RUST_LOG 控制日志等级，如：RUST_LOG=debug
    // 日志写 stderr，stdout 留给报告与 JSON
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(env_filter).with_writer(std::io::stderr).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// 解析线程参数："auto" 或非法值表示自动
fn parse_threads(s: &str) -> Option<usize> {
    if s.eq_ignore_ascii_case("auto") { return None; }
    match s.parse::<usize>() {
        Ok(n) if n >= 1 => Some(n),
        _ => None,
    }
}
