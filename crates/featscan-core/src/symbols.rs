//! 符号检测器集合（声明正则 + 测试标记自动机）
use aho_corasick::AhoCorasick;
use tracing::warn;

use crate::error::{AuditError, Result};
use crate::tables::{ScannerTable, SymbolKind};
use crate::types::ModuleRecord;

/// 单遍正则：种类 + 编译后的模式（捕获组 1 为符号名）
pub(crate) struct SymbolDetector {
    pub(crate) kind: SymbolKind,
    pub(crate) regex: regex::Regex,
}

/// 扫描器用到的全部检测器
pub(crate) struct SymbolDetectors {
    pub(crate) detectors: Vec<SymbolDetector>,
    pub(crate) markers: Option<AhoCorasick>,
}

impl SymbolDetectors {
    /// 从表配置构建检测器集合
    /// - `strict = true` 时无效正则直接报错；否则记录告警并跳过该条
    pub(crate) fn from_table(table: &ScannerTable, strict: bool) -> Result<Self> {
        let mut detectors = Vec::new();
        for spec in &table.symbols {
            match regex::Regex::new(&spec.regex) {
                Ok(regex) => detectors.push(SymbolDetector { kind: spec.kind, regex }),
                Err(source) if strict => {
                    return Err(AuditError::Pattern {
                        kind: spec.kind.as_str().to_string(),
                        pattern: spec.regex.clone(),
                        source,
                    })
                }
                Err(e) => warn!(kind = spec.kind.as_str(), pattern = %spec.regex, error = %e, "skipping invalid symbol pattern"),
            }
        }

        let markers = if table.test_markers.is_empty() {
            None
        } else {
            Some(AhoCorasick::new(&table.test_markers)?)
        };

        Ok(Self { detectors, markers })
    }

    /// 对单个文件文本执行所有提取遍，结果累加进模块记录
    pub(crate) fn extract_into(&self, text: &str, record: &mut ModuleRecord) {
        for d in &self.detectors {
            let set = match d.kind {
                SymbolKind::Type => &mut record.declared_types,
                SymbolKind::Enum => &mut record.declared_enums,
                SymbolKind::Interface => &mut record.declared_interfaces,
                SymbolKind::Function => &mut record.declared_functions,
                SymbolKind::Impl => &mut record.implementation_blocks,
            };
            for caps in d.regex.captures_iter(text) {
                // 优先捕获组 1，退回整个匹配
                if let Some(m) = caps.get(1).or_else(|| caps.get(0)) {
                    set.insert(m.as_str().to_string());
                }
            }
        }
        record.test_count += self.count_markers(text);
    }

    pub(crate) fn count_markers(&self, text: &str) -> usize {
        self.markers.as_ref().map_or(0, |ac| ac.find_iter(text).count())
    }
}

/// 行数口径：换行符个数 + 1
pub(crate) fn line_count(text: &str) -> usize {
    text.matches('\n').count() + 1
}
