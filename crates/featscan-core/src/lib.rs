//! 功能覆盖率审计核心库
//!
//! 设计要点：
//! - 扫描器只做文本级提取（声明正则 + 测试标记计数），不做语法分析。
//! - 单文件读取失败只跳过该文件；非法 UTF-8 有损替换，不中断。
//! - 匹配器按类别构建有序规则表，先命中者胜；条目之间互不依赖。
//! - 所有查找表来自 TOML（内置一份默认表），引擎本身不含项目特定数据。
//! - 核心不接触终端与输出格式，报告由调用方渲染。

mod aggregate;
mod cascade;
mod catalog;
mod endpoint;
mod error;
mod matcher;
mod options;
mod pipeline;
mod rules;
mod scan;
mod symbols;
mod tables;
mod types;

pub use aggregate::{percentage, summarize, CategoryCoverage, Coverage, SubcategoryCoverage, Tally};
pub use catalog::{load_catalog, parse_catalog};
pub use error::{AuditError, Result};
pub use matcher::{match_features, MatchContext};
pub use options::{ScanOptions, ScanStats};
pub use pipeline::{load_tables, run_audit, run_audit_with, AuditOutcome};
pub use scan::{scan_tree, SourceIndex};
pub use tables::{MatcherKind, SymbolKind, Tables};
pub use types::{Feature, ModuleRecord, Status};
