//! 扫描选项与统计信息（模块）
use std::path::PathBuf;

/// 扫描选项
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// 待审计的源码树根目录
    pub root: PathBuf,
    /// 匹配表路径（TOML）；为空则使用内置默认表
    pub tables_path: Option<PathBuf>,
    /// 覆盖表中的源文件扩展名（不含点）
    pub extension: Option<String>,
    /// 匹配线程数：None 表示自动（等于 CPU 核数）；Some(1) 走串行
    pub threads: Option<usize>,
    /// 符号正则无效时仅告警跳过（默认直接报错）
    pub lenient_patterns: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            tables_path: None,
            extension: None,
            threads: Some(1),
            lenient_patterns: false,
        }
    }
}

impl ScanOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), ..Self::default() }
    }

    /// 实际使用的线程数（至少为 1）
    pub fn effective_threads(&self) -> usize {
        self.threads.unwrap_or_else(num_cpus::get).max(1)
    }
}

/// 扫描统计信息（便于 CLI 打印）
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanStats {
    pub modules: usize,
    pub files_scanned: usize,
    /// 读取失败而跳过提取的文件数
    pub files_skipped: usize,
    pub lines_total: usize,
}
