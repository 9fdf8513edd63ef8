//! 公共类型（对外暴露）
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// 匹配结论
/// - Implemented：找到完整证据
/// - Stubbed：只找到外层（类型/服务/命令组），成员未找到
/// - Missing：默认值
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Implemented,
    Stubbed,
    #[default]
    Missing,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Implemented => "implemented",
            Status::Stubbed => "stubbed",
            Status::Missing => "missing",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 目录条目（一项待核对的功能）
///
/// 由目录数据创建，初始为 `Missing`；仅由匹配器写入一次状态与证据字段。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feature {
    pub category: String,
    pub subcategory: String,
    pub name: String,
    pub status: Status,
    /// 证据位置（形如 `<module>/src/...`）
    pub evidence_location: Option<String>,
    pub evidence_symbol: Option<String>,
    pub note: Option<String>,
}

impl Feature {
    pub fn new(category: impl Into<String>, subcategory: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            subcategory: subcategory.into(),
            name: name.into(),
            status: Status::Missing,
            evidence_location: None,
            evidence_symbol: None,
            note: None,
        }
    }

    /// 证据位置中的模块前缀（第一个路径段）
    pub fn evidence_module(&self) -> Option<&str> {
        self.evidence_location
            .as_deref()
            .and_then(|loc| loc.split('/').next())
            .filter(|m| !m.is_empty())
    }
}

/// 单个顶层模块（扫描根目录下第一段路径）的符号与规模统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModuleRecord {
    pub name: String,
    /// 相对扫描根目录的文件路径（按路径排序）
    pub files: Vec<String>,
    pub declared_types: BTreeSet<String>,
    pub declared_enums: BTreeSet<String>,
    pub declared_interfaces: BTreeSet<String>,
    pub declared_functions: BTreeSet<String>,
    pub implementation_blocks: BTreeSet<String>,
    pub test_count: usize,
    pub line_count: usize,
}

impl ModuleRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }
}
