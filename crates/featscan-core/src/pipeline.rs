//! 主流程：加载表 → 扫描一次 → 逐条匹配
use std::collections::BTreeMap;

use crate::aggregate::{summarize, Coverage};
use crate::error::Result;
use crate::matcher::match_features;
use crate::options::{ScanOptions, ScanStats};
use crate::scan::scan_tree;
use crate::tables::Tables;
use crate::types::{Feature, ModuleRecord};

/// 一次审计的完整产物（交给报告层渲染）
#[derive(Debug, Clone)]
pub struct AuditOutcome {
    pub features: Vec<Feature>,
    pub modules: BTreeMap<String, ModuleRecord>,
    pub stats: ScanStats,
}

impl AuditOutcome {
    pub fn coverage(&self) -> Coverage<'_> {
        summarize(&self.features)
    }
}

/// 按选项加载匹配表：指定路径优先，否则用内置表
pub fn load_tables(opts: &ScanOptions) -> Result<Tables> {
    match &opts.tables_path {
        Some(path) => Tables::load(path),
        None => Tables::builtin(),
    }
}

pub fn run_audit(opts: &ScanOptions, catalog: Vec<Feature>) -> Result<AuditOutcome> {
    let tables = load_tables(opts)?;
    run_audit_with(opts, &tables, catalog)
}

/// 使用已加载的表执行审计；重复执行结果一致，不落盘
pub fn run_audit_with(opts: &ScanOptions, tables: &Tables, mut features: Vec<Feature>) -> Result<AuditOutcome> {
    let (index, stats) = scan_tree(&opts.root, tables, opts.extension.as_deref(), opts.lenient_patterns)?;
    match_features(&mut features, &index, tables, opts.effective_threads())?;
    Ok(AuditOutcome { features, modules: index.modules, stats })
}
