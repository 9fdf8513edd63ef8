//! 功能目录加载（TOML）
//!
//! 目录是调用方提供的数据：有序的 (类别, 子类别, 名称) 三元组，加载后全部为 Missing。
use serde::Deserialize;
use std::path::Path;

use crate::error::{AuditError, Result};
use crate::types::Feature;

/// 同一类别/子类别下的一组条目
#[derive(Debug, Clone, Deserialize)]
struct CatalogGroup {
    category: String,
    subcategory: String,
    #[serde(default, alias = "names")]
    entries: Vec<String>,
}

/// 顶层目录文件结构
#[derive(Debug, Clone, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    group: Vec<CatalogGroup>,
}

/// 从 TOML 文本解析目录，保持书写顺序
pub fn parse_catalog(txt: &str, origin: &str) -> Result<Vec<Feature>> {
    let parsed: CatalogFile =
        toml::from_str(txt).map_err(|source| AuditError::Toml { origin: origin.to_string(), source })?;
    let mut out = Vec::new();
    for g in parsed.group {
        for name in g.entries {
            out.push(Feature::new(g.category.clone(), g.subcategory.clone(), name));
        }
    }
    Ok(out)
}

/// 从 TOML 文件加载目录
pub fn load_catalog(path: &Path) -> Result<Vec<Feature>> {
    let txt = std::fs::read_to_string(path).map_err(|source| AuditError::Io { path: path.to_path_buf(), source })?;
    parse_catalog(&txt, &path.display().to_string())
}
