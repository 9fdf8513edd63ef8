//! 覆盖率汇总：总体 / 按类别 / 按子类别
//!
//! 分组保持条目首次出现的顺序（目录书写顺序），不排序。
use serde::Serialize;

use crate::types::{Feature, Status};

/// 百分比；总数为 0 时定义为 0
pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// 各状态计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub total: usize,
    pub implemented: usize,
    pub stubbed: usize,
    pub missing: usize,
}

impl Tally {
    pub fn add(&mut self, status: Status) {
        self.total += 1;
        match status {
            Status::Implemented => self.implemented += 1,
            Status::Stubbed => self.stubbed += 1,
            Status::Missing => self.missing += 1,
        }
    }

    pub fn of<'f>(features: impl IntoIterator<Item = &'f Feature>) -> Self {
        let mut t = Self::default();
        for f in features {
            t.add(f.status);
        }
        t
    }

    /// implemented / total * 100
    pub fn coverage_pct(&self) -> f64 {
        percentage(self.implemented, self.total)
    }

    pub fn count(&self, status: Status) -> usize {
        match status {
            Status::Implemented => self.implemented,
            Status::Stubbed => self.stubbed,
            Status::Missing => self.missing,
        }
    }

    pub fn share_pct(&self, status: Status) -> f64 {
        percentage(self.count(status), self.total)
    }
}

#[derive(Debug, Clone)]
pub struct SubcategoryCoverage<'f> {
    pub name: &'f str,
    pub tally: Tally,
    pub features: Vec<&'f Feature>,
}

#[derive(Debug, Clone)]
pub struct CategoryCoverage<'f> {
    pub name: &'f str,
    pub tally: Tally,
    pub subcategories: Vec<SubcategoryCoverage<'f>>,
}

impl<'f> CategoryCoverage<'f> {
    pub fn features(&self) -> impl Iterator<Item = &'f Feature> + '_ {
        self.subcategories.iter().flat_map(|s| s.features.iter().copied())
    }
}

/// 汇总结果（只读借用已分类的条目）
#[derive(Debug, Clone, Default)]
pub struct Coverage<'f> {
    pub overall: Tally,
    pub categories: Vec<CategoryCoverage<'f>>,
}

impl<'f> Coverage<'f> {
    pub fn category(&self, name: &str) -> Option<&CategoryCoverage<'f>> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// 某类别的覆盖率；类别没有条目时为 0
    pub fn category_pct(&self, name: &str) -> f64 {
        self.category(name).map_or(0.0, |c| c.tally.coverage_pct())
    }

    /// 各类别缺失条目，按缺失数降序（同数保持首次出现顺序）
    pub fn missing_by_category(&self) -> Vec<(&'f str, Vec<&'f Feature>)> {
        let mut out: Vec<(&'f str, Vec<&'f Feature>)> = self
            .categories
            .iter()
            .map(|c| (c.name, c.features().filter(|f| f.status == Status::Missing).collect::<Vec<_>>()))
            .filter(|(_, v)| !v.is_empty())
            .collect();
        out.sort_by_key(|(_, v)| std::cmp::Reverse(v.len()));
        out
    }
}

/// 按类别 → 子类别分组并计数
pub fn summarize(features: &[Feature]) -> Coverage<'_> {
    let mut coverage = Coverage::default();
    for f in features {
        coverage.overall.add(f.status);

        let cat = match coverage.categories.iter().position(|c| c.name == f.category) {
            Some(i) => &mut coverage.categories[i],
            None => {
                coverage.categories.push(CategoryCoverage {
                    name: &f.category,
                    tally: Tally::default(),
                    subcategories: Vec::new(),
                });
                let last = coverage.categories.len() - 1;
                &mut coverage.categories[last]
            }
        };
        cat.tally.add(f.status);

        let sub = match cat.subcategories.iter().position(|s| s.name == f.subcategory) {
            Some(i) => &mut cat.subcategories[i],
            None => {
                cat.subcategories.push(SubcategoryCoverage { name: &f.subcategory, tally: Tally::default(), features: Vec::new() });
                let last = cat.subcategories.len() - 1;
                &mut cat.subcategories[last]
            }
        };
        sub.tally.add(f.status);
        sub.features.push(f);
    }
    coverage
}
