//! 报告渲染：终端彩色摘要、COVERAGE_REPORT.md、coverage_data.json、FEATURE_MATRIX.md
//!
//! 只读消费审计结果；分组顺序沿用目录顺序，模块按名称排序。
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use colored::{Color, Colorize};
use featscan_core::{percentage, AuditOutcome, Coverage, Feature, ModuleRecord, Status, Tally};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_TITLE: &str = "BlueBubbles Rust Rewrite";

pub const MARKDOWN_REPORT: &str = "COVERAGE_REPORT.md";
pub const JSON_REPORT: &str = "coverage_data.json";
pub const FEATURE_MATRIX: &str = "FEATURE_MATRIX.md";

const OVERALL_BAR: usize = 50;
const CATEGORY_BAR: usize = 30;
const TOP_MISSING: usize = 5;

fn timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// 绿 ≥70%，黄 ≥40%，其余红
fn level_color(pct: f64) -> Color {
    if pct >= 70.0 {
        Color::Green
    } else if pct >= 40.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

/// `[####------]`，填充格数向下取整
fn progress_bar(pct: f64, width: usize) -> String {
    let filled = ((width as f64 * pct / 100.0) as usize).min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

fn round1(pct: f64) -> f64 {
    (pct * 10.0).round() / 10.0
}

fn status_label(status: Status) -> &'static str {
    match status {
        Status::Implemented => "OK",
        Status::Stubbed => "PARTIAL",
        Status::Missing => "MISSING",
    }
}

fn checkbox(status: Status) -> &'static str {
    match status {
        Status::Implemented => "[x]",
        Status::Stubbed => "[~]",
        Status::Missing => "[ ]",
    }
}

/// 终端报告（颜色由 colored 按 NO_COLOR / 终端检测决定）
pub fn render_terminal(title: &str, outcome: &AuditOutcome, generated: DateTime<Utc>) -> String {
    let cov = outcome.coverage();
    let t = cov.overall;
    let pct = t.coverage_pct();
    let rule = "=".repeat(70);
    let thin = format!("  {}", "-".repeat(66));
    let mut out = String::new();

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", rule.bold());
    let _ = writeln!(out, "{}", format!("  {title} - Implementation Coverage Report").bold().cyan());
    let _ = writeln!(out, "{}", rule.bold());
    let _ = writeln!(out);

    let _ = writeln!(
        out,
        "  Overall: {} {}",
        progress_bar(pct, OVERALL_BAR).color(level_color(pct)),
        format!("{pct:.1}%").bold()
    );
    let _ = writeln!(
        out,
        "  {}  |  {}  |  {}  |  {}",
        format!("{} implemented", t.implemented).green(),
        format!("{} stubbed", t.stubbed).yellow(),
        format!("{} missing", t.missing).red(),
        format!("{} total", t.total).dimmed()
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "{}", "  Per-Category Breakdown:".bold());
    let _ = writeln!(out, "{}", thin.dimmed());
    for cat in &cov.categories {
        let cat_pct = cat.tally.coverage_pct();
        let _ = writeln!(
            out,
            "  {:<24} {} {:>3}/{:<3} ({:.0}%)",
            cat.name,
            progress_bar(cat_pct, CATEGORY_BAR).color(level_color(cat_pct)),
            cat.tally.implemented,
            cat.tally.total,
            cat_pct
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "{}", "  Per-Module Source Stats:".bold());
    let _ = writeln!(out, "{}", thin.dimmed());
    out.push_str(&module_lines(&outcome.modules));
    let _ = writeln!(out);

    let missing = cov.missing_by_category();
    if !missing.is_empty() {
        let _ = writeln!(out, "{}", "  Top Missing Features:".bold());
        let _ = writeln!(out, "{}", thin.dimmed());
        for (cat, items) in &missing {
            let _ = writeln!(out, "  {}: {} missing", cat.red(), items.len());
            for f in items.iter().take(TOP_MISSING) {
                let _ = writeln!(out, "    - {}", f.name);
            }
            if items.len() > TOP_MISSING {
                let _ = writeln!(out, "    ... and {} more", items.len() - TOP_MISSING);
            }
        }
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", format!("  Generated: {}", timestamp(generated)).dimmed());
    let _ = writeln!(out);
    out
}

fn module_lines(modules: &BTreeMap<String, ModuleRecord>) -> String {
    let mut out = String::new();
    for m in modules.values() {
        let _ = writeln!(
            out,
            "  {} {:>3} files  {:>6} lines  {:>3} structs  {:>3} fns  {:>3} tests",
            format!("{:<30}", m.name).cyan(),
            m.files.len(),
            m.line_count,
            m.declared_types.len(),
            m.declared_functions.len(),
            m.test_count
        );
    }
    out
}

/// `featscan modules` 的纯文本视图（带合计行）
pub fn render_modules(modules: &BTreeMap<String, ModuleRecord>) -> String {
    let mut out = module_lines(modules);
    let files: usize = modules.values().map(|m| m.files.len()).sum();
    let lines: usize = modules.values().map(|m| m.line_count).sum();
    let tests: usize = modules.values().map(|m| m.test_count).sum();
    let _ = writeln!(
        out,
        "  {} {:>3} files  {:>6} lines  {:>3} modules  {:>3} tests",
        format!("{:<30}", "total").bold(),
        files,
        lines,
        modules.len(),
        tests
    );
    out
}

/// Markdown 报告
pub fn render_markdown(title: &str, outcome: &AuditOutcome, generated: DateTime<Utc>) -> String {
    let cov = outcome.coverage();
    let t = cov.overall;
    let mut lines = vec![
        format!("# {title} - Coverage Report"),
        String::new(),
        format!("*Generated: {}*", timestamp(generated)),
        String::new(),
        "## Overall Progress".to_string(),
        String::new(),
        "| Status | Count | Percentage |".to_string(),
        "|--------|-------|------------|".to_string(),
    ];
    for (label, status) in [("Implemented", Status::Implemented), ("Stubbed", Status::Stubbed), ("Missing", Status::Missing)] {
        lines.push(format!("| {label} | {} | {:.1}% |", t.count(status), t.share_pct(status)));
    }
    lines.push(format!("| **Total** | **{}** | **100%** |", t.total));
    lines.extend(["", "---", "", "## Per-Category Breakdown", ""].map(String::from));
    lines.push("| Category | Implemented | Stubbed | Missing | Total | Coverage |".to_string());
    lines.push("|----------|-------------|---------|---------|-------|----------|".to_string());
    for cat in &cov.categories {
        let c = cat.tally;
        lines.push(format!(
            "| {} | {} | {} | {} | {} | {:.0}% |",
            cat.name,
            c.implemented,
            c.stubbed,
            c.missing,
            c.total,
            c.coverage_pct()
        ));
    }

    lines.extend(["", "---", "", "## Per-Module Source Statistics", ""].map(String::from));
    lines.push("| Module | Files | Lines | Structs | Functions | Tests |".to_string());
    lines.push("|--------|-------|-------|---------|-----------|-------|".to_string());
    for m in outcome.modules.values() {
        lines.push(format!(
            "| {} | {} | {} | {} | {} | {} |",
            m.name,
            m.files.len(),
            m.line_count,
            m.declared_types.len(),
            m.declared_functions.len(),
            m.test_count
        ));
    }
    let total_lines: usize = outcome.modules.values().map(|m| m.line_count).sum();
    let total_tests: usize = outcome.modules.values().map(|m| m.test_count).sum();
    lines.push(format!("| **Total** | | **{total_lines}** | | | **{total_tests}** |"));
    lines.extend(["", "---", ""].map(String::from));

    for cat in &cov.categories {
        lines.push(format!("## {}", cat.name));
        lines.push(String::new());
        for sub in &cat.subcategories {
            lines.push(format!("### {}", sub.name));
            lines.push(String::new());
            lines.push("| Feature | Status | Evidence | Notes |".to_string());
            lines.push("|---------|--------|----------|-------|".to_string());
            for f in &sub.features {
                lines.push(format!(
                    "| {} | {} | {} | {} |",
                    f.name,
                    status_label(f.status),
                    f.evidence_location.as_deref().unwrap_or(""),
                    f.note.as_deref().unwrap_or("")
                ));
            }
            lines.push(String::new());
        }
    }
    lines.join("\n")
}

/// 功能清单（勾选框形式）
pub fn render_matrix(title: &str, cov: &Coverage<'_>, generated: DateTime<Utc>) -> String {
    let mut lines = vec![
        format!("# {title} - Feature Matrix"),
        String::new(),
        format!("*Generated: {}*", timestamp(generated)),
        String::new(),
        "Legend: [x] = implemented, [~] = stubbed/partial, [ ] = missing".to_string(),
        String::new(),
    ];
    for cat in &cov.categories {
        let c = cat.tally;
        lines.push(format!("## {} ({}/{} = {:.0}%)", cat.name, c.implemented, c.total, c.coverage_pct()));
        lines.push(String::new());
        for sub in &cat.subcategories {
            lines.push(format!("### {}", sub.name));
            lines.push(String::new());
            for f in &sub.features {
                let note = f.note.as_deref().map(|n| format!(" *({n})*")).unwrap_or_default();
                lines.push(format!("- {} {}{}", checkbox(f.status), f.name, note));
            }
            lines.push(String::new());
        }
    }
    lines.join("\n")
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub total: usize,
    pub implemented: usize,
    pub stubbed: usize,
    pub missing: usize,
    pub coverage_pct: f64,
}

impl From<Tally> for Summary {
    fn from(t: Tally) -> Self {
        Self {
            total: t.total,
            implemented: t.implemented,
            stubbed: t.stubbed,
            missing: t.missing,
            coverage_pct: round1(percentage(t.implemented, t.total)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ModuleSummary {
    pub files: usize,
    pub lines: usize,
    pub structs: usize,
    pub functions: usize,
    pub enums: usize,
    pub traits: usize,
    pub tests: usize,
}

impl From<&ModuleRecord> for ModuleSummary {
    fn from(m: &ModuleRecord) -> Self {
        Self {
            files: m.files.len(),
            lines: m.line_count,
            structs: m.declared_types.len(),
            functions: m.declared_functions.len(),
            enums: m.declared_enums.len(),
            traits: m.declared_interfaces.len(),
            tests: m.test_count,
        }
    }
}

/// JSON 中的单个条目；缺失的证据与备注写成空串
#[derive(Debug, Serialize)]
pub struct FeatureRow<'a> {
    pub category: &'a str,
    pub subcategory: &'a str,
    pub name: &'a str,
    pub status: Status,
    pub rust_file: &'a str,
    pub rust_symbol: &'a str,
    pub notes: &'a str,
}

impl<'a> From<&'a Feature> for FeatureRow<'a> {
    fn from(f: &'a Feature) -> Self {
        Self {
            category: &f.category,
            subcategory: &f.subcategory,
            name: &f.name,
            status: f.status,
            rust_file: f.evidence_location.as_deref().unwrap_or(""),
            rust_symbol: f.evidence_symbol.as_deref().unwrap_or(""),
            notes: f.note.as_deref().unwrap_or(""),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CoverageDocument<'a> {
    pub generated: String,
    pub summary: Summary,
    pub crates: BTreeMap<&'a str, ModuleSummary>,
    pub features: Vec<FeatureRow<'a>>,
}

pub fn module_summaries(modules: &BTreeMap<String, ModuleRecord>) -> BTreeMap<&str, ModuleSummary> {
    modules.iter().map(|(k, m)| (k.as_str(), ModuleSummary::from(m))).collect()
}

pub fn coverage_document(outcome: &AuditOutcome, generated: DateTime<Utc>) -> CoverageDocument<'_> {
    CoverageDocument {
        generated: generated.to_rfc3339(),
        summary: Summary::from(outcome.coverage().overall),
        crates: module_summaries(&outcome.modules),
        features: outcome.features.iter().map(FeatureRow::from).collect(),
    }
}

/// 写出三份报告文件，返回写入的路径
pub fn write_reports(out_dir: &Path, title: &str, outcome: &AuditOutcome, generated: DateTime<Utc>) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir).with_context(|| format!("create output dir {}", out_dir.display()))?;

    let json = serde_json::to_string_pretty(&coverage_document(outcome, generated)).context("serialize coverage")?;
    let cov = outcome.coverage();
    let files = [
        (MARKDOWN_REPORT, render_markdown(title, outcome, generated)),
        (JSON_REPORT, json),
        (FEATURE_MATRIX, render_matrix(title, &cov, generated)),
    ];

    let mut written = Vec::with_capacity(files.len());
    for (name, body) in files {
        let path = out_dir.join(name);
        fs::write(&path, body).with_context(|| format!("write {}", path.display()))?;
        written.push(path);
    }
    info!(dir = %out_dir.display(), files = written.len(), "reports written");
    Ok(written)
}
