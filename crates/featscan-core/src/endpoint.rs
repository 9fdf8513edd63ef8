//! REST 端点匹配：`METHOD /api/v1/...` → 四级级联
//!
//! 1. 翻译后的路由（`:guid` → `{guid}`）或带引号的原路由出现在 API 模块文本中
//! 2. 至少两个非参数段，且最后两段都出现
//! 3. 路由片段 → 函数名表
//! 4. 特例配对（路由片段 + 函数片段，可附加方法与子类别限定）
//!
//! 规则 2 与 4 可能误报（通用词在无关代码里出现）。
use crate::cascade::{Cascade, Outcome, Predicate};
use crate::matcher::MatchContext;
use crate::tables::render;
use crate::types::Feature;

/// 解析 `METHOD path`；缺少空格分隔视为格式错误
pub(crate) fn parse_endpoint(name: &str) -> Option<(&str, &str)> {
    name.split_once(' ')
}

/// `:param` → `{param}`
pub(crate) fn translate_route(route: &str) -> String {
    let mut out = String::with_capacity(route.len() + 4);
    let mut chars = route.chars().peekable();
    while let Some(ch) = chars.next() {
        let starts_param = ch == ':' && chars.peek().is_some_and(|c| is_word(*c));
        if !starts_param {
            out.push(ch);
            continue;
        }
        out.push('{');
        while let Some(c) = chars.peek().copied().filter(|c| is_word(*c)) {
            out.push(c);
            chars.next();
        }
        out.push('}');
    }
    out
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// 非空且不以 `:` 开头的路由段
pub(crate) fn significant_segments(route: &str) -> Vec<&str> {
    route.split('/').filter(|s| !s.is_empty() && !s.starts_with(':')).collect()
}

/// 为单个端点条目构建级联；名称格式错误时返回 None
pub(crate) fn endpoint_cascade<'c>(feature: &Feature, ctx: &'c MatchContext<'_>) -> Option<Cascade<'c>> {
    let (method, path) = parse_endpoint(&feature.name)?;
    let api = &ctx.tables.api;
    let text = ctx.index.text(&ctx.tables.modules.api);

    let route = path.replace(api.prefix.as_str(), "");
    let translated = translate_route(&route);
    let evidence = render(&api.evidence, &[("subcategory", feature.subcategory.to_lowercase().as_str())]);

    let mut cascade = Cascade::new(Outcome::missing());

    cascade.push(
        "route literal",
        Predicate::Any(vec![
            Predicate::contains(text, translated),
            Predicate::contains(text, format!("\"{route}\"")),
        ]),
        Outcome::implemented().at(evidence.clone()),
    );

    let significant = significant_segments(&route);
    let tail_segments = match significant.as_slice() {
        [.., a, b] => Predicate::All(vec![Predicate::contains(text, *a), Predicate::contains(text, *b)]),
        _ => Predicate::Never,
    };
    cascade.push("tail segments", tail_segments, Outcome::implemented().at(evidence.clone()));

    for rk in &api.route_keywords {
        cascade.push(
            format!("route keyword {}", rk.route),
            Predicate::All(vec![
                Predicate::from_bool(route.contains(rk.route.as_str())),
                Predicate::contains(text, rk.function.as_str()),
            ]),
            Outcome::implemented().at(evidence.clone()),
        );
    }

    for sc in &api.special_cases {
        let gate = sc.route.iter().all(|frag| route.contains(frag.as_str()))
            && sc.method.as_deref().map_or(true, |m| m == method)
            && sc.subcategory.as_deref().map_or(true, |s| s == feature.subcategory);
        cascade.push(
            format!("special case {}", sc.function),
            Predicate::All(vec![Predicate::from_bool(gate), Predicate::contains(text, sc.function.as_str())]),
            Outcome::implemented().at(sc.evidence.clone()),
        );
    }

    Some(cascade)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::SourceIndex;
    use crate::tables::Tables;
    use crate::types::Status;

    fn classify(sub: &str, name: &str, api_text: &str) -> (Option<String>, Outcome) {
        let tables = Tables::builtin().unwrap();
        let index = SourceIndex::from_sources(&tables, [("bb-api/src/lib.rs", api_text)]).unwrap();
        let ctx = MatchContext::new(&tables, &index);
        let f = Feature::new("API Endpoints", sub, name);
        endpoint_cascade(&f, &ctx).unwrap().evaluate()
    }

    #[test]
    fn translate_route_braces_params() {
        assert_eq!(translate_route("/chat/:guid/read"), "/chat/{guid}/read");
        assert_eq!(translate_route("/chat/:guid/:messageGuid"), "/chat/{guid}/{messageGuid}");
        assert_eq!(translate_route("/a:/b"), "/a:/b");
    }

    #[test]
    fn significant_segments_drop_params() {
        assert_eq!(significant_segments("/chat/:guid/participant/add"), vec!["chat", "participant", "add"]);
        assert!(significant_segments("/").is_empty());
    }

    #[test]
    fn ping_route_literal_is_implemented() {
        let (label, out) = classify("Server", "GET /api/v1/ping", r#"self.get("/ping").await"#);
        assert_eq!(label.as_deref(), Some("route literal"));
        assert_eq!(out.status, Status::Implemented);
        assert_eq!(out.location.as_deref(), Some("bb-api/src/endpoints/server.rs"));
    }

    #[test]
    fn translated_param_route_matches_format_string() {
        let (label, out) = classify("Chat", "POST /api/v1/chat/:guid/read", r#"format!("/chat/{guid}/read")"#);
        assert_eq!(label.as_deref(), Some("route literal"));
        assert_eq!(out.status, Status::Implemented);
    }

    #[test]
    fn tail_segments_rule_needs_two_segments() {
        let (label, _) = classify("Server", "GET /api/v1/server/statistics/totals", "statistics ... totals");
        assert_eq!(label.as_deref(), Some("tail segments"));
    }

    #[test]
    fn route_keyword_table_is_consulted() {
        let (label, out) = classify("FCM", "POST /api/v1/fcm/device", "pub async fn register_fcm(token: &str)");
        assert_eq!(label.as_deref(), Some("route keyword fcm/device"));
        assert_eq!(out.location.as_deref(), Some("bb-api/src/endpoints/fcm.rs"));
    }

    #[test]
    fn special_case_respects_method_and_subcategory() {
        let text = "pub async fn get_attachment(&self)";
        let (label, out) = classify("Attachment", "GET /api/v1/attachment/:guid", text);
        assert_eq!(label.as_deref(), Some("special case get_attachment"));
        assert_eq!(out.location.as_deref(), Some("bb-api/src/endpoints/attachments.rs"));

        let (label, out) = classify("Handle", "GET /api/v1/handle/:guid", text);
        assert!(label.is_none());
        assert_eq!(out.status, Status::Missing);
    }

    #[test]
    fn unmatched_route_stays_missing() {
        let (label, out) = classify("Mac", "POST /api/v1/mac/lock", "nothing relevant");
        assert!(label.is_none());
        assert_eq!(out, Outcome::missing());
    }

    #[test]
    fn malformed_endpoint_name_is_skipped() {
        let tables = Tables::builtin().unwrap();
        let index = SourceIndex::default();
        let ctx = MatchContext::new(&tables, &index);
        let f = Feature::new("API Endpoints", "Server", "PING");
        assert!(endpoint_cascade(&f, &ctx).is_none());
    }
}
