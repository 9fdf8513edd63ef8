//! 匹配表加载（TOML）
//!
//! 所有固定查找表（路由片段 → 函数名、关键字 → 谓词、名称 → 证据文件）都是配置数据，
//! 匹配引擎只负责按顺序求值。凡是顺序有意义的表都用数组表（`[[...]]`），保证“先命中者胜”。
use serde::Deserialize;
use std::path::Path;

use crate::error::{AuditError, Result};

/// 内置默认表（BlueBubbles Rust 重写项目）
const BUILTIN_TABLES: &str = include_str!("../tables/default.toml");

/// 匹配器种类（目录类别名通过 `[[categories]]` 映射到这里）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatcherKind {
    Api,
    Event,
    Model,
    Infra,
    Service,
    Cli,
    Core,
    Settings,
    Ui,
}

/// 符号种类（扫描器的每一遍正则对应一种）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Type,
    Enum,
    Interface,
    Function,
    Impl,
}

impl SymbolKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SymbolKind::Type => "type",
            SymbolKind::Enum => "enum",
            SymbolKind::Interface => "interface",
            SymbolKind::Function => "function",
            SymbolKind::Impl => "impl",
        }
    }
}

/// 单条符号提取规则（兼容 regex 或 pattern 字段名）
#[derive(Debug, Clone, Deserialize)]
pub struct SymbolSpec {
    pub kind: SymbolKind,
    #[serde(alias = "pattern")]
    pub regex: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScannerTable {
    /// 源文件扩展名（不含点）
    #[serde(default = "default_extension")]
    pub extension: String,
    /// 构建输出目录，任意路径段命中即跳过
    #[serde(default)]
    pub skip_dirs: Vec<String>,
    /// 测试标记字面量（同步与异步）
    #[serde(default)]
    pub test_markers: Vec<String>,
    #[serde(default)]
    pub symbols: Vec<SymbolSpec>,
}

fn default_extension() -> String {
    "rs".to_string()
}

/// 各角色对应的模块名
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleRoles {
    pub api: String,
    pub events: String,
    pub models: String,
    pub services: String,
    pub cli: String,
    pub config: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryBinding {
    pub name: String,
    pub kind: MatcherKind,
}

/// 名称 → 证据文件名（无后缀）
#[derive(Debug, Clone, Deserialize)]
pub struct NameFile {
    pub name: String,
    pub file: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteKeyword {
    pub route: String,
    pub function: String,
}

/// 特例配对：所有路由片段都在路由中，且函数片段在模块文本中
#[derive(Debug, Clone, Deserialize)]
pub struct SpecialCase {
    pub route: Vec<String>,
    pub function: String,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
    pub evidence: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiTable {
    /// API 版本前缀，例如 `/api/v1`
    pub prefix: String,
    /// 证据模板，支持 `{subcategory}`（小写）
    pub evidence: String,
    #[serde(default)]
    pub route_keywords: Vec<RouteKeyword>,
    #[serde(default)]
    pub special_cases: Vec<SpecialCase>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventVariant {
    pub event: String,
    pub variant: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventTable {
    pub evidence: String,
    /// 证据符号前缀（枚举名）
    pub enum_name: String,
    #[serde(default)]
    pub variants: Vec<EventVariant>,
    /// 未命中时附带说明的事件
    #[serde(default)]
    pub noted: Vec<String>,
    pub note: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelTable {
    /// 证据模板，支持 `{file}`
    pub evidence: String,
    #[serde(default)]
    pub files: Vec<NameFile>,
    /// 支持 `{member}`
    pub stub_note: String,
}

/// 基础设施检查：`all` 全部出现，且 `any` 为空或至少出现一个
#[derive(Debug, Clone, Deserialize)]
pub struct InfraCheck {
    pub keyword: String,
    #[serde(default)]
    pub all: Vec<String>,
    #[serde(default)]
    pub any: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InfraTable {
    pub evidence: String,
    #[serde(default)]
    pub checks: Vec<InfraCheck>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceTable {
    pub unported_subcategory: String,
    pub unported_note: String,
    /// 证据模板，支持 `{file}`
    pub evidence: String,
    #[serde(default)]
    pub files: Vec<NameFile>,
    /// 支持 `{method}`
    pub stub_note: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CliTable {
    /// 证据模板，支持 `{group}`
    pub evidence: String,
    /// 支持 `{command}`
    pub stub_note: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoreKeyword {
    pub keyword: String,
    pub search: String,
    pub module: String,
    pub evidence: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SettingsTable {
    pub evidence: String,
    pub note: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiTable {
    pub note: String,
}

/// 顶层表文件结构
#[derive(Debug, Clone, Deserialize)]
pub struct Tables {
    pub scanner: ScannerTable,
    pub modules: ModuleRoles,
    #[serde(default)]
    pub categories: Vec<CategoryBinding>,
    pub api: ApiTable,
    pub events: EventTable,
    pub models: ModelTable,
    pub infra: InfraTable,
    pub services: ServiceTable,
    pub cli: CliTable,
    #[serde(default)]
    pub core: Vec<CoreKeyword>,
    pub settings: SettingsTable,
    pub ui: UiTable,
}

impl Tables {
    /// 内置默认表
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_TABLES, "<builtin tables>")
    }

    /// 从 TOML 文件加载
    pub fn load(path: &Path) -> Result<Self> {
        let txt = std::fs::read_to_string(path)
            .map_err(|source| AuditError::Io { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&txt, &path.display().to_string())
    }

    pub fn from_toml_str(txt: &str, origin: &str) -> Result<Self> {
        toml::from_str(txt).map_err(|source| AuditError::Toml { origin: origin.to_string(), source })
    }

    /// 目录类别名 → 匹配器种类（未登记的类别返回 None）
    pub fn kind_of(&self, category: &str) -> Option<MatcherKind> {
        self.categories.iter().find(|c| c.name == category).map(|c| c.kind)
    }
}

/// 名称 → 文件名；表中没有则退回小写名称
pub(crate) fn file_for(files: &[NameFile], name: &str) -> String {
    files
        .iter()
        .find(|nf| nf.name == name)
        .map(|nf| nf.file.clone())
        .unwrap_or_else(|| name.to_lowercase())
}

/// 简单模板替换：`{key}` → value
pub(crate) fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{key}}}"), value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables_parse() {
        let t = Tables::builtin().unwrap();
        assert_eq!(t.scanner.extension, "rs");
        assert!(t.scanner.skip_dirs.iter().any(|d| d == "target"));
        assert_eq!(t.modules.api, "bb-api");
        assert_eq!(t.kind_of("API Endpoints"), Some(MatcherKind::Api));
        assert_eq!(t.kind_of("UI Screens"), Some(MatcherKind::Ui));
        assert_eq!(t.kind_of("Nope"), None);
        assert!(!t.api.route_keywords.is_empty());
        assert!(!t.core.is_empty());
    }

    #[test]
    fn route_keywords_keep_authoring_order() {
        let t = Tables::builtin().unwrap();
        assert_eq!(t.api.route_keywords[0].route, "ping");
        assert_eq!(t.api.route_keywords[1].route, "server/info");
    }

    #[test]
    fn file_for_falls_back_to_lowercase() {
        let files = vec![NameFile { name: "ThemeStruct".into(), file: "theme".into() }];
        assert_eq!(file_for(&files, "ThemeStruct"), "theme");
        assert_eq!(file_for(&files, "Chat"), "chat");
    }

    #[test]
    fn render_replaces_every_key() {
        let s = render("{a}/src/{b}.rs", &[("a", "bb-api"), ("b", "chat")]);
        assert_eq!(s, "bb-api/src/chat.rs");
    }

    #[test]
    fn malformed_toml_is_reported_with_origin() {
        let err = Tables::from_toml_str("scanner = 3", "inline").unwrap_err();
        assert!(err.to_string().contains("inline"));
    }
}
