//! 各类别的级联构建（端点类别见 endpoint.rs）
//!
//! 只有模型、服务、CLI 三类有“两段式”检查，因此只有它们会产出 Stubbed。
use crate::cascade::{Cascade, Outcome, Predicate};
use crate::matcher::MatchContext;
use crate::tables::{file_for, render};
use crate::types::Feature;

/// `Outer.inner` → (Outer, inner)；没有点号时外层取子类别
fn split_member<'f>(feature: &'f Feature) -> (&'f str, &'f str) {
    feature
        .name
        .split_once('.')
        .unwrap_or((feature.subcategory.as_str(), feature.name.as_str()))
}

/// Socket 事件：带引号的事件名出现在事件模块文本中
pub(crate) fn event_cascade<'c>(feature: &Feature, ctx: &'c MatchContext<'_>) -> Cascade<'c> {
    let events = &ctx.tables.events;
    let text = ctx.index.text(&ctx.tables.modules.events);
    let name = feature.name.as_str();

    let variant = events
        .variants
        .iter()
        .find(|v| v.event == name)
        .map_or(name, |v| v.variant.as_str());

    let otherwise = if events.noted.iter().any(|n| n == name) {
        Outcome::missing().note(events.note.clone())
    } else {
        Outcome::missing()
    };

    Cascade::new(otherwise).rule(
        "quoted event name",
        Predicate::contains(text, format!("\"{name}\"")),
        Outcome::implemented()
            .at(events.evidence.clone())
            .symbol(format!("{}::{}", events.enum_name, variant)),
    )
}

/// 数据模型字段/方法：类型存在 → 成员存在 → Implemented；仅类型 → Stubbed
pub(crate) fn model_cascade<'c>(feature: &Feature, ctx: &'c MatchContext<'_>) -> Cascade<'c> {
    let models = &ctx.tables.models;
    let text = ctx.index.text(&ctx.tables.modules.models);
    let (ty, member) = split_member(feature);

    let type_known = Predicate::Any(vec![
        Predicate::from_bool(ctx.index.declared_types.contains(ty)),
        Predicate::contains(text, ty),
    ]);
    let evidence = render(&models.evidence, &[("file", file_for(&models.files, ty).as_str())]);

    Cascade::new(Outcome::missing())
        .rule(
            "type and member",
            Predicate::All(vec![type_known.clone(), Predicate::contains(text, member)]),
            Outcome::implemented().at(evidence).symbol(format!("{ty}::{member}")),
        )
        .rule(
            "type only",
            type_known,
            Outcome::stubbed().note(render(&models.stub_note, &[("member", member)])),
        )
}

/// 数据库基础设施：第一个出现在条目名（小写）中的关键字决定检查；否则整名回退
pub(crate) fn infra_cascade<'c>(feature: &Feature, ctx: &'c MatchContext<'_>) -> Cascade<'c> {
    let infra = &ctx.tables.infra;
    let module = ctx.tables.modules.models.as_str();
    let text = ctx.index.text(module);
    let name = feature.name.to_lowercase();

    let Some(check) = infra.checks.iter().find(|c| name.contains(c.keyword.as_str())) else {
        return Cascade::new(Outcome::missing()).rule(
            "whole name",
            Predicate::contains(ctx.lowered(module), name),
            Outcome::implemented(),
        );
    };

    let mut required: Vec<Predicate<'c>> = check.all.iter().map(|s| Predicate::contains(text, s.as_str())).collect();
    if !check.any.is_empty() {
        required.push(Predicate::Any(check.any.iter().map(|s| Predicate::contains(text, s.as_str())).collect()));
    }

    Cascade::new(Outcome::missing()).rule(
        format!("infra {}", check.keyword),
        Predicate::All(required),
        Outcome::implemented().at(infra.evidence.clone()),
    )
}

/// 服务方法：保留的“未移植”子类别恒为 Missing
pub(crate) fn service_cascade<'c>(feature: &Feature, ctx: &'c MatchContext<'_>) -> Cascade<'c> {
    let services = &ctx.tables.services;
    if feature.subcategory == services.unported_subcategory {
        return Cascade::new(Outcome::missing().note(services.unported_note.clone()));
    }

    let text = ctx.index.text(&ctx.tables.modules.services);
    let (svc, method) = split_member(feature);
    let evidence = render(&services.evidence, &[("file", file_for(&services.files, svc).as_str())]);

    Cascade::new(Outcome::missing())
        .rule(
            "service and method",
            Predicate::All(vec![Predicate::contains(text, svc), Predicate::contains(text, method)]),
            Outcome::implemented().at(evidence).symbol(format!("{svc}::{method}")),
        )
        .rule(
            "service only",
            Predicate::contains(text, svc),
            Outcome::stubbed().note(render(&services.stub_note, &[("method", method)])),
        )
}

/// `set-address` → `Set-Address`：非字母之后的字母大写，其余小写
pub(crate) fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
        } else {
            out.push(ch);
        }
        prev_alpha = ch.is_alphabetic();
    }
    out
}

/// 首字母大写，其余小写
pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// 子命令在源码里可能出现的三种写法
pub(crate) fn command_variants(cmd: &str) -> [String; 3] {
    [cmd.replace('-', "_"), capitalize(&cmd.replace('-', "")), title_case(cmd)]
}

/// CLI 命令：`prefix group cmd`；两段式名称只看命令组；少于两段视为格式错误
pub(crate) fn cli_cascade<'c>(feature: &Feature, ctx: &'c MatchContext<'_>) -> Option<Cascade<'c>> {
    let cli = &ctx.tables.cli;
    let text = ctx.index.text(&ctx.tables.modules.cli);
    let parts: Vec<&str> = feature.name.split(' ').collect();

    match parts.as_slice() {
        [_, group, cmd, ..] => {
            let evidence = render(&cli.evidence, &[("group", *group)]);
            let variants = command_variants(cmd).into_iter().map(|v| Predicate::contains(text, v)).collect();
            Some(
                Cascade::new(Outcome::missing())
                    .rule(
                        "group and command",
                        Predicate::All(vec![Predicate::contains(text, *group), Predicate::Any(variants)]),
                        Outcome::implemented().at(evidence),
                    )
                    .rule(
                        "group only",
                        Predicate::contains(text, *group),
                        Outcome::stubbed().note(render(&cli.stub_note, &[("command", *cmd)])),
                    ),
            )
        }
        [_, group] => Some(Cascade::new(Outcome::missing()).rule(
            "group",
            Predicate::contains(text, *group),
            Outcome::implemented().at(render(&cli.evidence, &[("group", *group)])),
        )),
        _ => None,
    }
}

/// 核心基础设施：条目名中第一个出现的关键字决定检索词与模块
pub(crate) fn core_cascade<'c>(feature: &Feature, ctx: &'c MatchContext<'_>) -> Cascade<'c> {
    let Some(kw) = ctx.tables.core.iter().find(|k| feature.name.contains(k.keyword.as_str())) else {
        return Cascade::new(Outcome::missing());
    };
    Cascade::new(Outcome::missing()).rule(
        format!("keyword {}", kw.keyword),
        Predicate::contains(ctx.index.text(&kw.module), kw.search.as_str()),
        Outcome::implemented().at(kw.evidence.clone()).symbol(kw.search.clone()),
    )
}

/// `lastIncrementalSyncRowId` → `last_incremental_sync_row_id`
pub(crate) fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch.is_ascii_uppercase() && prev_lower {
            out.push('_');
        }
        prev_lower = ch.is_ascii_lowercase();
        out.push(ch);
    }
    out.to_lowercase()
}

/// 设置项：蛇形写法或原样写法出现在配置模块文本中
pub(crate) fn settings_cascade<'c>(feature: &Feature, ctx: &'c MatchContext<'_>) -> Cascade<'c> {
    let settings = &ctx.tables.settings;
    let text = ctx.index.text(&ctx.tables.modules.config);
    Cascade::new(Outcome::missing().note(settings.note.clone())).rule(
        "snake or literal",
        Predicate::Any(vec![
            Predicate::contains(text, snake_case(&feature.name)),
            Predicate::contains(text, feature.name.as_str()),
        ]),
        Outcome::implemented().at(settings.evidence.clone()),
    )
}

/// 界面条目：没有可扫描的展示层，恒为 Missing
pub(crate) fn ui_cascade<'c>(ctx: &'c MatchContext<'_>) -> Cascade<'c> {
    Cascade::new(Outcome::missing().note(ctx.tables.ui.note.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::SourceIndex;
    use crate::tables::Tables;
    use crate::types::Status;

    fn index(sources: &[(&str, &str)]) -> (Tables, SourceIndex) {
        let tables = Tables::builtin().unwrap();
        let idx = SourceIndex::from_sources(&tables, sources.iter().copied()).unwrap();
        (tables, idx)
    }

    #[test]
    fn casing_helpers() {
        assert_eq!(snake_case("userName"), "user_name");
        assert_eq!(snake_case("use24HrFormat"), "use24hr_format");
        assert_eq!(snake_case("guidAuthKey"), "guid_auth_key");
        assert_eq!(title_case("set-address"), "Set-Address");
        assert_eq!(title_case("list"), "List");
        assert_eq!(capitalize("restarthard"), "Restarthard");
        assert_eq!(command_variants("check-update"), ["check_update".to_string(), "Checkupdate".into(), "Check-Update".into()]);
    }

    #[test]
    fn event_found_carries_variant_symbol() {
        let (t, idx) = index(&[("bb-socket/src/events.rs", r#"NewMessage => "new-message","#)]);
        let ctx = MatchContext::new(&t, &idx);
        let (_, out) = event_cascade(&Feature::new("Socket Events", "Events", "new-message"), &ctx).evaluate();
        assert_eq!(out.status, Status::Implemented);
        assert_eq!(out.symbol.as_deref(), Some("SocketEventType::NewMessage"));
        assert_eq!(out.location.as_deref(), Some("bb-socket/src/events.rs"));
    }

    #[test]
    fn noted_event_keeps_note_when_missing() {
        let (t, idx) = index(&[("bb-socket/src/events.rs", "")]);
        let ctx = MatchContext::new(&t, &idx);
        let (_, out) = event_cascade(&Feature::new("Socket Events", "Events", "ft-call-status-changed"), &ctx).evaluate();
        assert_eq!(out.status, Status::Missing);
        assert_eq!(out.note.as_deref(), Some("Not in event enum yet"));
        let (_, out) = event_cascade(&Feature::new("Socket Events", "Events", "server-update"), &ctx).evaluate();
        assert!(out.note.is_none());
    }

    #[test]
    fn model_member_absent_is_stubbed() {
        let (t, idx) = index(&[("bb-models/src/models/chat.rs", "pub struct Chat { pub id: i64 }")]);
        let ctx = MatchContext::new(&t, &idx);
        let (label, out) = model_cascade(&Feature::new("DB Models", "Chat", "Chat.guid"), &ctx).evaluate();
        assert_eq!(label.as_deref(), Some("type only"));
        assert_eq!(out.status, Status::Stubbed);
        assert!(out.note.unwrap().contains("guid"));
    }

    #[test]
    fn model_special_file_name_is_used() {
        let (t, idx) = index(&[("bb-models/src/models/theme.rs", "pub struct ThemeStruct { pub gradient_bg: bool }")]);
        let ctx = MatchContext::new(&t, &idx);
        let (_, out) = model_cascade(&Feature::new("DB Models", "ThemeStruct", "ThemeStruct.gradient_bg"), &ctx).evaluate();
        assert_eq!(out.status, Status::Implemented);
        assert_eq!(out.location.as_deref(), Some("bb-models/src/models/theme.rs"));
        assert_eq!(out.symbol.as_deref(), Some("ThemeStruct::gradient_bg"));
    }

    #[test]
    fn model_unknown_type_is_missing() {
        let (t, idx) = index(&[("bb-models/src/lib.rs", "pub struct Chat { pub id: i64 }")]);
        let ctx = MatchContext::new(&t, &idx);
        let (_, out) = model_cascade(&Feature::new("DB Models", "FcmData", "FcmData.id"), &ctx).evaluate();
        assert_eq!(out, Outcome::missing());
    }

    #[test]
    fn infra_pooling_requires_both_tokens() {
        let (t, idx) = index(&[("bb-models/src/db.rs", "type DbPool = Pool<SqliteConnectionManager>;")]);
        let ctx = MatchContext::new(&t, &idx);
        let f = Feature::new("DB Infrastructure", "Core", "Connection pooling (r2d2)");
        assert_eq!(infra_cascade(&f, &ctx).evaluate().1.status, Status::Missing);

        let (t, idx) = index(&[("bb-models/src/db.rs", "use r2d2::Pool;")]);
        let ctx = MatchContext::new(&t, &idx);
        let (label, out) = infra_cascade(&f, &ctx).evaluate();
        assert_eq!(label.as_deref(), Some("infra connection pooling"));
        assert_eq!(out.location.as_deref(), Some("bb-models/src/db.rs"));
    }

    #[test]
    fn infra_any_and_fallback() {
        let (t, idx) = index(&[("bb-models/src/db.rs", "conn.pragma_update(None, \"journal_mode\", \"WAL\"); // Foreign Keys")]);
        let ctx = MatchContext::new(&t, &idx);
        let wal = Feature::new("DB Infrastructure", "Core", "WAL mode");
        assert_eq!(infra_cascade(&wal, &ctx).evaluate().1.status, Status::Implemented);

        let fk = Feature::new("DB Infrastructure", "Core", "Foreign keys");
        let (label, out) = infra_cascade(&fk, &ctx).evaluate();
        assert_eq!(label.as_deref(), Some("whole name"));
        assert_eq!(out.status, Status::Implemented);
        assert!(out.location.is_none());
    }

    #[test]
    fn unported_service_is_always_missing() {
        let (t, idx) = index(&[("bb-services/src/lib.rs", "LifecycleService FCMService")]);
        let ctx = MatchContext::new(&t, &idx);
        let (_, out) = service_cascade(&Feature::new("Services", "Flutter-only", "FCMService"), &ctx).evaluate();
        assert_eq!(out.status, Status::Missing);
        assert_eq!(out.note.as_deref(), Some("Flutter-specific service, not ported"));
    }

    #[test]
    fn service_two_stage_check() {
        let (t, idx) = index(&[("bb-services/src/queue.rs", "pub struct QueueService; fn enqueue() {}")]);
        let ctx = MatchContext::new(&t, &idx);
        let (_, out) = service_cascade(&Feature::new("Services", "QueueService", "QueueService.enqueue"), &ctx).evaluate();
        assert_eq!(out.status, Status::Implemented);
        assert_eq!(out.location.as_deref(), Some("bb-services/src/queue.rs"));

        let (_, out) = service_cascade(&Feature::new("Services", "QueueService", "QueueService.clear"), &ctx).evaluate();
        assert_eq!(out.status, Status::Stubbed);
        assert_eq!(out.note.as_deref(), Some("Service exists but clear not found"));

        let (_, out) = service_cascade(&Feature::new("Services", "SyncService", "SyncService.full_sync"), &ctx).evaluate();
        assert_eq!(out.status, Status::Missing);
    }

    #[test]
    fn cli_group_and_command() {
        let (t, idx) = index(&[("bb-cli/src/commands/chats.rs", "mod chats; ChatsCommand::List")]);
        let ctx = MatchContext::new(&t, &idx);
        let f = Feature::new("CLI Commands", "chats", "bb chats list");
        let (_, out) = cli_cascade(&f, &ctx).unwrap().evaluate();
        assert_eq!(out.status, Status::Implemented);
        assert_eq!(out.location.as_deref(), Some("bb-cli/src/commands/chats.rs"));

        let (t, idx) = index(&[("bb-cli/src/commands/chats.rs", "mod chats;")]);
        let ctx = MatchContext::new(&t, &idx);
        let (_, out) = cli_cascade(&f, &ctx).unwrap().evaluate();
        assert_eq!(out.status, Status::Stubbed);
        assert_eq!(out.note.as_deref(), Some("Module exists, checking for list"));
    }

    #[test]
    fn cli_hyphenated_command_matches_title_case() {
        let (t, idx) = index(&[("bb-cli/src/main.rs", "settings: SetAddress / Set-Address")]);
        let ctx = MatchContext::new(&t, &idx);
        let f = Feature::new("CLI Commands", "settings", "bb settings set-address");
        assert_eq!(cli_cascade(&f, &ctx).unwrap().evaluate().1.status, Status::Implemented);
    }

    #[test]
    fn cli_two_tokens_and_malformed() {
        let (t, idx) = index(&[("bb-cli/src/main.rs", "status")]);
        let ctx = MatchContext::new(&t, &idx);
        let f = Feature::new("CLI Commands", "status", "bb status");
        let (label, out) = cli_cascade(&f, &ctx).unwrap().evaluate();
        assert_eq!(label.as_deref(), Some("group"));
        assert_eq!(out.status, Status::Implemented);
        assert!(cli_cascade(&Feature::new("CLI Commands", "x", "bb"), &ctx).is_none());
    }

    #[test]
    fn core_keyword_uses_named_module() {
        let (t, idx) = index(&[
            ("bb-socket/src/crypto.rs", "pub struct AesCrypto;"),
            ("bb-core/src/config.rs", "pub struct AppConfig;"),
        ]);
        let ctx = MatchContext::new(&t, &idx);
        let (_, out) = core_cascade(&Feature::new("Core Infrastructure", "Core", "AES-256-CBC crypto (CryptoJS compatible)"), &ctx).evaluate();
        assert_eq!(out.status, Status::Implemented);
        assert_eq!(out.location.as_deref(), Some("bb-socket/src/crypto.rs"));
        assert_eq!(out.symbol.as_deref(), Some("AesCrypto"));

        let (_, out) = core_cascade(&Feature::new("Core Infrastructure", "Core", "ServiceState lifecycle"), &ctx).evaluate();
        assert_eq!(out.status, Status::Missing);
        let (label, _) = core_cascade(&Feature::new("Core Infrastructure", "Core", "Something else"), &ctx).evaluate();
        assert!(label.is_none());
    }

    #[test]
    fn settings_snake_literal_and_note() {
        let (t, idx) = index(&[("bb-core/src/config.rs", "pub user_name: String,\n serverAddress")]);
        let ctx = MatchContext::new(&t, &idx);
        let hit = settings_cascade(&Feature::new("Settings", "Display", "userName"), &ctx).evaluate().1;
        assert_eq!(hit.status, Status::Implemented);
        let literal = settings_cascade(&Feature::new("Settings", "Connection", "serverAddress"), &ctx).evaluate().1;
        assert_eq!(literal.status, Status::Implemented);
        let miss = settings_cascade(&Feature::new("Settings", "Theme", "monetTheming"), &ctx).evaluate().1;
        assert_eq!(miss.status, Status::Missing);
        assert_eq!(miss.note.as_deref(), Some("Not in TOML config yet"));
    }

    #[test]
    fn ui_is_missing_even_with_matching_text() {
        let (t, idx) = index(&[("bb-tauri/src/main.rs", "ConversationList ConversationList")]);
        let ctx = MatchContext::new(&t, &idx);
        let out = ui_cascade(&ctx).evaluate().1;
        assert_eq!(out.status, Status::Missing);
        assert_eq!(out.note.as_deref(), Some("Tauri UI not yet started"));
    }
}
