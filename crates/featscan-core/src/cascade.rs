//! 规则级联：有序的 (谓词, 结论) 表，自上而下求值，先命中者胜
//!
//! 每个类别的匹配逻辑都先“构建”一张规则表，再统一求值，
//! 这样每条规则可以单独断言，顺序也一目了然。
use crate::types::{Feature, Status};

/// 谓词（带标签的变体），只做子串判断
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Predicate<'a> {
    /// `needle` 是 `haystack` 的子串
    Contains { haystack: &'a str, needle: String },
    All(Vec<Predicate<'a>>),
    Any(Vec<Predicate<'a>>),
    Always,
    Never,
}

impl<'a> Predicate<'a> {
    pub(crate) fn contains(haystack: &'a str, needle: impl Into<String>) -> Self {
        Predicate::Contains { haystack, needle: needle.into() }
    }

    pub(crate) fn from_bool(b: bool) -> Self {
        if b { Predicate::Always } else { Predicate::Never }
    }

    pub(crate) fn holds(&self) -> bool {
        match self {
            Predicate::Contains { haystack, needle } => haystack.contains(needle.as_str()),
            Predicate::All(ps) => ps.iter().all(Predicate::holds),
            // 空 Any 视为不成立
            Predicate::Any(ps) => ps.iter().any(Predicate::holds),
            Predicate::Always => true,
            Predicate::Never => false,
        }
    }
}

/// 规则命中后写回条目的结论
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Outcome {
    pub(crate) status: Status,
    pub(crate) location: Option<String>,
    pub(crate) symbol: Option<String>,
    pub(crate) note: Option<String>,
}

impl Outcome {
    pub(crate) fn implemented() -> Self {
        Self { status: Status::Implemented, ..Self::default() }
    }

    pub(crate) fn stubbed() -> Self {
        Self { status: Status::Stubbed, ..Self::default() }
    }

    pub(crate) fn missing() -> Self {
        Self::default()
    }

    pub(crate) fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub(crate) fn symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub(crate) fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// 唯一的写入点：状态与证据字段一次性写入
    pub(crate) fn apply(self, feature: &mut Feature) {
        feature.status = self.status;
        feature.evidence_location = self.location;
        feature.evidence_symbol = self.symbol;
        feature.note = self.note;
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Rule<'a> {
    pub(crate) label: String,
    pub(crate) when: Predicate<'a>,
    pub(crate) then: Outcome,
}

/// 有序规则表 + 兜底结论
#[derive(Debug, Clone)]
pub(crate) struct Cascade<'a> {
    pub(crate) rules: Vec<Rule<'a>>,
    pub(crate) otherwise: Outcome,
}

impl<'a> Cascade<'a> {
    pub(crate) fn new(otherwise: Outcome) -> Self {
        Self { rules: Vec::new(), otherwise }
    }

    pub(crate) fn rule(mut self, label: impl Into<String>, when: Predicate<'a>, then: Outcome) -> Self {
        self.rules.push(Rule { label: label.into(), when, then });
        self
    }

    pub(crate) fn push(&mut self, label: impl Into<String>, when: Predicate<'a>, then: Outcome) {
        self.rules.push(Rule { label: label.into(), when, then });
    }

    /// 返回命中规则的标签（兜底时为 None）与结论
    pub(crate) fn evaluate(self) -> (Option<String>, Outcome) {
        for rule in self.rules {
            if rule.when.holds() {
                return (Some(rule.label), rule.then);
            }
        }
        (None, self.otherwise)
    }

    /// 第一条成立的规则下标
    #[cfg(test)]
    pub(crate) fn first_hit(&self) -> Option<usize> {
        self.rules.iter().position(|r| r.when.holds())
    }
}
