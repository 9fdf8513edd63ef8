//! 匹配调度：按类别选择级联，逐条求值并一次性写回
//!
//! 条目之间互不依赖；多线程只是把同一个纯函数分给不同线程，结果与串行一致。
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::cascade::Cascade;
use crate::endpoint::endpoint_cascade;
use crate::error::Result;
use crate::rules::{
    cli_cascade, core_cascade, event_cascade, infra_cascade, model_cascade, service_cascade, settings_cascade,
    ui_cascade,
};
use crate::scan::SourceIndex;
use crate::tables::{MatcherKind, Tables};
use crate::types::Feature;

/// 匹配阶段的只读上下文
pub struct MatchContext<'a> {
    pub(crate) tables: &'a Tables,
    pub(crate) index: &'a SourceIndex,
    /// 模块全文的小写副本（基础设施整名回退用）
    lowered: BTreeMap<&'a str, String>,
}

impl<'a> MatchContext<'a> {
    pub fn new(tables: &'a Tables, index: &'a SourceIndex) -> Self {
        let lowered = index.texts.iter().map(|(k, v)| (k.as_str(), v.to_lowercase())).collect();
        Self { tables, index, lowered }
    }

    pub(crate) fn lowered(&self, module: &str) -> &str {
        self.lowered.get(module).map(String::as_str).unwrap_or("")
    }

    /// 为条目构建级联；未登记类别或名称格式错误时返回 None（条目保持默认）
    pub(crate) fn cascade_for(&self, feature: &Feature) -> Option<Cascade<'_>> {
        let Some(kind) = self.tables.kind_of(&feature.category) else {
            debug!(category = %feature.category, name = %feature.name, "no matcher for category");
            return None;
        };
        let cascade = match kind {
            MatcherKind::Api => endpoint_cascade(feature, self),
            MatcherKind::Event => Some(event_cascade(feature, self)),
            MatcherKind::Model => Some(model_cascade(feature, self)),
            MatcherKind::Infra => Some(infra_cascade(feature, self)),
            MatcherKind::Service => Some(service_cascade(feature, self)),
            MatcherKind::Cli => cli_cascade(feature, self),
            MatcherKind::Core => Some(core_cascade(feature, self)),
            MatcherKind::Settings => Some(settings_cascade(feature, self)),
            MatcherKind::Ui => Some(ui_cascade(self)),
        };
        if cascade.is_none() {
            debug!(category = %feature.category, name = %feature.name, "malformed entry name, skipped");
        }
        cascade
    }

    /// 对单个条目求值并写回状态与证据
    pub fn match_feature(&self, feature: &mut Feature) {
        let Some(cascade) = self.cascade_for(feature) else { return };
        let (rule, outcome) = cascade.evaluate();
        debug!(
            name = %feature.name,
            rule = rule.as_deref().unwrap_or("-"),
            status = %outcome.status,
            "classified"
        );
        outcome.apply(feature);
    }
}

/// 匹配全部条目；`threads > 1` 时在 rayon 线程池中并行
pub fn match_features(features: &mut [Feature], index: &SourceIndex, tables: &Tables, threads: usize) -> Result<()> {
    let ctx = MatchContext::new(tables, index);
    if threads > 1 {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
        pool.install(|| features.par_iter_mut().for_each(|f| ctx.match_feature(f)));
    } else {
        features.iter_mut().for_each(|f| ctx.match_feature(f));
    }
    info!(features = features.len(), threads, "matching finished");
    Ok(())
}
