//! 源码树扫描：遍历 → 逐文件容错读取 → 按顶层模块累加符号
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path};
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::error::{AuditError, Result};
use crate::options::ScanStats;
use crate::symbols::{line_count, SymbolDetectors};
use crate::tables::Tables;
use crate::types::ModuleRecord;

/// 扫描产物：模块记录 + 每个模块拼接后的全文 + 跨模块符号索引
///
/// 匹配阶段只读此结构。
#[derive(Debug, Clone, Default)]
pub struct SourceIndex {
    pub modules: BTreeMap<String, ModuleRecord>,
    /// 模块名 → 该模块全部文件文本（按文件路径顺序以换行拼接）
    pub texts: BTreeMap<String, String>,
    pub declared_types: BTreeSet<String>,
    pub declared_enums: BTreeSet<String>,
    pub declared_functions: BTreeSet<String>,
}

impl SourceIndex {
    /// 模块全文；模块不存在时为空串
    pub fn text(&self, module: &str) -> &str {
        self.texts.get(module).map(String::as_str).unwrap_or("")
    }

    /// 从内存中的 `(相对路径, 文本)` 构建索引（不访问文件系统）
    pub fn from_sources<I, P, T>(tables: &Tables, sources: I) -> Result<Self>
    where
        I: IntoIterator<Item = (P, T)>,
        P: Into<String>,
        T: Into<String>,
    {
        let detectors = SymbolDetectors::from_table(&tables.scanner, false)?;
        let mut builder = IndexBuilder::default();
        let mut sources: Vec<(String, String)> = sources.into_iter().map(|(p, t)| (p.into(), t.into())).collect();
        sources.sort_by(|a, b| a.0.cmp(&b.0));
        for (rel, text) in sources {
            builder.add(&detectors, &rel, Some(text.as_str()));
        }
        Ok(builder.finish())
    }
}

/// 逐文件累加，最后统一生成拼接文本与跨模块索引
#[derive(Default)]
struct IndexBuilder {
    modules: BTreeMap<String, ModuleRecord>,
    parts: BTreeMap<String, Vec<String>>,
}

impl IndexBuilder {
    /// `text = None` 表示读取失败：文件仍归属模块，但不参与提取
    fn add(&mut self, detectors: &SymbolDetectors, rel: &str, text: Option<&str>) {
        let module = module_name(rel);
        let record = self
            .modules
            .entry(module.clone())
            .or_insert_with(|| ModuleRecord::new(module.clone()));
        record.files.push(rel.to_string());

        let Some(text) = text else { return };
        record.line_count += line_count(text);
        detectors.extract_into(text, record);
        self.parts.entry(module).or_default().push(text.to_string());
    }

    fn finish(self) -> SourceIndex {
        let mut index = SourceIndex::default();
        for (name, parts) in self.parts {
            index.texts.insert(name, parts.join("\n"));
        }
        for (name, mut record) in self.modules {
            record.files.sort();
            index.declared_types.extend(record.declared_types.iter().cloned());
            index.declared_enums.extend(record.declared_enums.iter().cloned());
            index.declared_functions.extend(record.declared_functions.iter().cloned());
            index.modules.insert(name, record);
        }
        index
    }
}

/// 相对路径的第一段即模块名
fn module_name(rel: &str) -> String {
    rel.split('/').find(|s| !s.is_empty()).unwrap_or("unknown").to_string()
}

/// 相对路径统一为 `/` 分隔
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if parts.is_empty() { None } else { Some(parts.join("/")) }
}

fn is_skipped_dir(entry: &DirEntry, skip_dirs: &[String]) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && skip_dirs.iter().any(|d| entry.file_name().to_str() == Some(d.as_str()))
}

/// 扫描源码树
/// 稳定性保证：
/// - 遍历按文件名排序，拼接文本顺序可复现
/// - 符号均为集合，记录内容与遍历顺序无关
/// - 单文件读取失败只跳过该文件的提取
pub fn scan_tree(
    root: &Path,
    tables: &Tables,
    extension: Option<&str>,
    lenient_patterns: bool,
) -> Result<(SourceIndex, ScanStats)> {
    if !root.is_dir() {
        return Err(AuditError::MissingRoot(root.to_path_buf()));
    }
    let detectors = SymbolDetectors::from_table(&tables.scanner, !lenient_patterns)?;
    let ext = extension.unwrap_or(tables.scanner.extension.as_str()).trim_start_matches('.');
    let skip_dirs = &tables.scanner.skip_dirs;

    let mut stats = ScanStats::default();
    let mut builder = IndexBuilder::default();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e, skip_dirs));
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!(error = %e, "walk error, skipping entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some(ext) {
            continue;
        }
        let Some(rel) = relative_path(root, path) else { continue };

        // 容错解码：非法 UTF-8 替换为 U+FFFD，不中断扫描
        match std::fs::read(path) {
            Ok(bytes) => {
                let text = String::from_utf8_lossy(&bytes);
                stats.files_scanned += 1;
                builder.add(&detectors, &rel, Some(text.as_ref()));
            }
            Err(e) => {
                debug!(file = %rel, error = %e, "unreadable file, extraction skipped");
                stats.files_skipped += 1;
                builder.add(&detectors, &rel, None);
            }
        }
    }

    let index = builder.finish();
    stats.modules = index.modules.len();
    stats.lines_total = index.modules.values().map(|m| m.line_count).sum();
    info!(
        modules = stats.modules,
        files = stats.files_scanned,
        skipped = stats.files_skipped,
        lines = stats.lines_total,
        "scan finished"
    );
    Ok((index, stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_name_is_first_segment() {
        assert_eq!(module_name("bb-api/src/lib.rs"), "bb-api");
        assert_eq!(module_name("build.rs"), "build.rs");
    }

    #[test]
    fn from_sources_groups_by_module_and_joins_text() {
        let t = Tables::builtin().unwrap();
        let idx = SourceIndex::from_sources(
            &t,
            [
                ("bb-models/src/b.rs", "pub struct Handle;"),
                ("bb-models/src/a.rs", "pub struct Chat;\n#[test]\nfn t() {}"),
                ("bb-api/src/lib.rs", "pub fn ping() {}"),
            ],
        )
        .unwrap();

        let models = &idx.modules["bb-models"];
        assert_eq!(models.files, vec!["bb-models/src/a.rs", "bb-models/src/b.rs"]);
        assert_eq!(models.line_count, 4);
        assert_eq!(models.test_count, 1);
        assert!(idx.text("bb-models").starts_with("pub struct Chat;"));
        assert!(idx.declared_types.contains("Handle"));
        assert!(idx.declared_functions.contains("ping"));
        assert_eq!(idx.text("bb-cli"), "");
    }

    #[test]
    fn unreadable_file_keeps_membership_without_extraction() {
        let t = Tables::builtin().unwrap();
        let detectors = SymbolDetectors::from_table(&t.scanner, true).unwrap();
        let mut b = IndexBuilder::default();
        b.add(&detectors, "bb-core/src/bad.rs", None);
        b.add(&detectors, "bb-core/src/ok.rs", Some("pub enum Level {}"));
        let idx = b.finish();
        let core = &idx.modules["bb-core"];
        assert_eq!(core.files.len(), 2);
        assert_eq!(core.line_count, 1);
        assert!(core.declared_enums.contains("Level"));
    }
}
