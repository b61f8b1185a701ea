
use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::cache::{CacheEntry, CacheMiss, EntityCache};
use crate::fetch::{self, FetchError, FileListSource, HttpListSource, HttpSourceConfig, ListSource};
use crate::nav::{self, NavEntry, NavError, NavRules, VisibilityFlag};
use crate::runner::{Options, Runner, RunnerError};
use crate::session::{CurrentUser, SessionError, StaticSession};

fn entry(id: &str, name: &str) -> CacheEntry {
    CacheEntry::from_raw(json!({"id": id, "name": name}), "id").unwrap()
}

fn session_with(caps: &[&str]) -> StaticSession {
    StaticSession::authenticated(
        CurrentUser {
            name: "Sam".to_string(),
            role: "manager".to_string(),
            is_super_admin: false,
            capabilities: caps.iter().map(|c| c.to_string()).collect(),
        },
        "/login",
    )
}

fn ids(entries: &[&NavEntry]) -> Vec<String> {
    entries.iter().map(|e| e.id.clone()).collect()
}

/// Hands out queued responses in order.
struct ScriptedSource {
    responses: Mutex<VecDeque<Result<Vec<Value>, FetchError>>>,
}

impl ScriptedSource {
    fn new(responses: Vec<Result<Vec<Value>, FetchError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
        }
    }
}

#[async_trait]
impl ListSource for ScriptedSource {
    fn describe(&self) -> String {
        "scripted".to_string()
    }

    async fn list(&self) -> Result<Vec<Value>, FetchError> {
        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| {
            Err(FetchError::Rejected {
                message: "no scripted response left".to_string(),
            })
        })
    }
}

#[test]
fn lookup_returns_each_entity_after_replace_all() {
    let entities = vec![entry("a", "Ann"), entry("b", "Ben"), entry("c", "Cy")];
    let mut cache = EntityCache::new();
    cache.replace_all(entities.clone());
    for e in entities.iter() {
        assert_eq!(cache.lookup(&e.id), Some(e));
    }
    assert_eq!(cache.len(), 3);
}

#[test]
fn lookup_of_absent_id_is_not_found() {
    let mut cache = EntityCache::new();
    cache.replace_all(vec![entry("a", "Ann")]);
    assert_eq!(cache.lookup("zzz"), None);
    assert_eq!(
        cache.try_lookup("zzz"),
        Err(CacheMiss::NotFound {
            id: "zzz".to_string()
        })
    );
}

#[test]
fn second_replace_all_leaves_no_residue() {
    let mut cache = EntityCache::new();
    cache.replace_all(vec![entry("a", "Old A"), entry("b", "Old B")]);
    cache.replace_all(vec![entry("b", "New B"), entry("c", "New C")]);

    assert!(cache.lookup("a").is_none());
    assert_eq!(cache.lookup("b").unwrap().display_name(), "New B");
    assert_eq!(cache.lookup("c").unwrap().display_name(), "New C");
    assert_eq!(cache.len(), 2);
}

#[test]
fn duplicate_ids_keep_the_later_entry() {
    let mut cache = EntityCache::new();
    cache.replace_all(vec![entry("a", "first"), entry("b", "B"), entry("a", "second")]);
    assert_eq!(cache.len(), 2);
    assert_eq!(cache.lookup("a").unwrap().display_name(), "second");
}

#[test]
fn never_populated_is_distinct_from_not_found() {
    let mut cache = EntityCache::new();
    assert!(!cache.is_loaded());
    assert!(cache.loaded_at().is_none());
    let miss = cache.try_lookup("u1").unwrap_err();
    assert!(matches!(miss, CacheMiss::NotLoaded { .. }));
    assert_eq!(miss.id(), "u1");

    cache.replace_all(Vec::new());
    assert!(cache.is_loaded());
    assert!(cache.is_empty());
    let miss = cache.try_lookup("u2").unwrap_err();
    assert!(matches!(miss, CacheMiss::NotFound { .. }));
    assert_eq!(miss.id(), "u2");
}

#[test]
fn loaded_at_moves_forward_on_each_rebuild() {
    let mut cache = EntityCache::new();
    cache.replace_all(vec![entry("a", "Ann")]);
    let first = cache.loaded_at().unwrap();
    cache.replace_all(vec![entry("b", "Ben")]);
    assert!(cache.loaded_at().unwrap() >= first);
}

#[test]
fn ids_differing_only_by_whitespace_stay_separate() {
    let raw = vec![
        json!({"id": "A", "name": "first"}),
        json!({"id": "A ", "name": "second"}),
    ];
    let mut cache = EntityCache::new();
    cache.replace_all(fetch::map_entries(raw, "id").unwrap());
    assert_eq!(cache.len(), 2);
    assert_eq!(cache.lookup("A").unwrap().display_name(), "first");
    assert_eq!(cache.lookup("A ").unwrap().display_name(), "second");
}

#[test]
fn entries_are_listed_by_id() {
    let mut cache = EntityCache::new();
    cache.replace_all(vec![entry("u2", "Bob"), entry("u1", "Alice")]);
    let listed: Vec<&str> = cache.entries().iter().map(|e| e.id.as_str()).collect();
    assert_eq!(listed, vec!["u1", "u2"]);
}

#[test]
fn scenario_bulk_list_then_detail_lookup() {
    let raw = vec![
        json!({"id": "u1", "name": "Alice", "balance": 100}),
        json!({"id": "u2", "name": "Bob", "balance": 0}),
    ];
    let mut cache = EntityCache::new();
    cache.replace_all(fetch::map_entries(raw, "id").unwrap());

    let alice = cache.lookup("u1").unwrap();
    assert_eq!(alice.get("name"), Some(&json!("Alice")));
    assert_eq!(alice.get("balance"), Some(&json!(100)));
    assert!(cache.lookup("u3").is_none());
}

#[test]
fn scenario_empty_bulk_list_is_a_valid_state() {
    let mut cache = EntityCache::new();
    cache.replace_all(fetch::map_entries(Vec::new(), "id").unwrap());
    assert!(cache.lookup("u1").is_none());
    assert!(cache.lookup("").is_none());
    assert!(cache.is_loaded());
}

#[test]
fn scenario_capability_filters_navigation() {
    let all = vec![
        NavEntry::new("dashboard"),
        NavEntry::new("orders").with_capability("orders.view"),
    ];
    let session = session_with(&["orders.view"]);
    let visible = nav::compute_visible_entries(&all, &session, &NavRules::default());
    assert_eq!(ids(&visible), vec!["orders"]);
}

#[test]
fn visible_entries_are_deterministic_and_ordered() {
    let all = vec![
        NavEntry::new("users").with_capability("users.view"),
        NavEntry::new("orders").with_capability("orders.view"),
        NavEntry::new("autopay").with_capability("autopay.view"),
        NavEntry::new("reports").with_capability("reports.view"),
    ];
    let session = session_with(&["reports.view", "users.view", "autopay.view"]);
    let rules = NavRules::default();
    let first = ids(&nav::compute_visible_entries(&all, &session, &rules));
    let second = ids(&nav::compute_visible_entries(&all, &session, &rules));
    assert_eq!(first, vec!["users", "autopay", "reports"]);
    assert_eq!(first, second);
    assert_eq!(all.len(), 4);
}

#[test]
fn entries_without_capability_are_never_visible() {
    let all = vec![
        NavEntry::new("welcome").with_target("/welcome.html"),
        NavEntry::new("profile").with_target("/profile.html"),
    ];
    let super_admin = StaticSession::authenticated(
        CurrentUser {
            name: "Root".to_string(),
            role: "owner".to_string(),
            is_super_admin: true,
            ..CurrentUser::default()
        },
        "/login",
    );
    assert!(nav::compute_visible_entries(&all, &super_admin, &NavRules::default()).is_empty());
}

#[test]
fn flag_exclusion_wins_over_capability_grant() {
    let all = vec![
        NavEntry::new("home")
            .with_capability("home.view")
            .with_flag(VisibilityFlag::DashboardEntry),
        NavEntry::new("admins")
            .with_capability("admins.manage")
            .with_flag(VisibilityFlag::SuperAdminOnly),
        NavEntry::new("retired")
            .with_capability("home.view")
            .with_flag(VisibilityFlag::Hidden),
    ];
    let session = StaticSession::authenticated(
        CurrentUser {
            name: "Kim".to_string(),
            role: "collector".to_string(),
            is_super_admin: false,
            capabilities: ["home.view", "admins.manage"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
        },
        "/login",
    );
    let visible = nav::compute_visible_entries(&all, &session, &NavRules::new(["collector"]));
    assert!(visible.is_empty());
}

#[test]
fn resolving_entry_without_target_is_a_configuration_error() {
    let entry = NavEntry::new("orders").with_capability("orders.view");
    assert_eq!(
        nav::resolve(&entry),
        Err(NavError::MissingTarget {
            id: "orders".to_string()
        })
    );
    let entry = entry.with_target("/orders.html");
    assert_eq!(nav::resolve(&entry), Ok("/orders.html"));
}

#[tokio::test]
async fn failed_load_keeps_previous_snapshot() {
    let source = ScriptedSource::new(vec![
        Ok(vec![json!({"id": "u1", "name": "Alice"})]),
        Err(FetchError::Status {
            url: "http://backend/users".to_string(),
            status: 502,
        }),
        Ok(vec![json!({"id": "u2", "name": "Bob"}), json!({"name": "no id"})]),
    ]);
    let mut cache = EntityCache::new();

    assert_eq!(fetch::load_into(&source, &mut cache, "id").await.unwrap(), 1);
    assert!(matches!(
        fetch::load_into(&source, &mut cache, "id").await,
        Err(FetchError::Status { status: 502, .. })
    ));
    assert!(matches!(
        fetch::load_into(&source, &mut cache, "id").await,
        Err(FetchError::InvalidEntry { index: 1, .. })
    ));

    assert_eq!(cache.len(), 1);
    assert!(cache.lookup("u1").is_some());
    assert!(cache.lookup("u2").is_none());
}

#[tokio::test]
async fn runner_isolates_failures_per_resource() {
    let mut runner = Runner::new(Options::default()).unwrap();
    runner
        .add_source(
            "users",
            "id",
            Box::new(ScriptedSource::new(vec![Ok(vec![
                json!({"id": "u1", "name": "Alice"}),
                json!({"id": "u2", "name": "Bob"}),
            ])])),
        )
        .unwrap();
    runner
        .add_source(
            "autopay",
            "user_id",
            Box::new(ScriptedSource::new(vec![Err(FetchError::Rejected {
                message: "forbidden".to_string(),
            })])),
        )
        .unwrap();

    let report = runner.load(&session_with(&[])).await.unwrap();
    assert_eq!(report.loaded.get("users"), Some(&2));
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].resource, "autopay");
    assert!(!report.is_complete());

    assert_eq!(runner.show("users", "u1").unwrap().display_name(), "Alice");
    assert!(matches!(
        runner.show("users", "u9"),
        Err(RunnerError::Miss(CacheMiss::NotFound { .. }))
    ));
    assert!(matches!(
        runner.show("autopay", "u1"),
        Err(RunnerError::Miss(CacheMiss::NotLoaded { .. }))
    ));
    assert!(matches!(
        runner.show("orders", "o1"),
        Err(RunnerError::UnknownResource { .. })
    ));
}

#[tokio::test]
async fn runner_keeps_snapshot_when_a_later_load_fails() {
    let mut runner = Runner::new(Options::default()).unwrap();
    runner
        .add_source(
            "users",
            "id",
            Box::new(ScriptedSource::new(vec![
                Ok(vec![json!({"id": "u1", "name": "Alice"})]),
                Err(FetchError::Status {
                    url: "http://backend/users".to_string(),
                    status: 503,
                }),
            ])),
        )
        .unwrap();
    let session = session_with(&[]);

    let first = runner.load(&session).await.unwrap();
    assert!(first.is_complete());
    let second = runner.load(&session).await.unwrap();
    assert!(second.loaded.is_empty());
    assert!(matches!(
        second.failures[0].error,
        FetchError::Status { status: 503, .. }
    ));

    assert_eq!(runner.show("users", "u1").unwrap().display_name(), "Alice");
    assert_eq!(runner.cache("users").unwrap().len(), 1);
}

#[tokio::test]
async fn runner_refuses_to_load_for_anonymous_session() {
    let mut runner = Runner::new(Options::default()).unwrap();
    runner
        .add_source(
            "users",
            "id",
            Box::new(ScriptedSource::new(vec![Ok(vec![json!({"id": "u1"})])])),
        )
        .unwrap();

    let result = runner.load(&StaticSession::anonymous("/login.html")).await;
    assert!(matches!(
        result,
        Err(RunnerError::Session(SessionError::Unauthenticated { ref redirect }))
            if redirect == "/login.html"
    ));
    assert!(!runner.cache("users").unwrap().is_loaded());
}

#[tokio::test]
async fn runner_reload_replaces_one_resource() {
    let mut runner = Runner::new(Options::default()).unwrap();
    runner
        .add_source(
            "users",
            "id",
            Box::new(ScriptedSource::new(vec![
                Ok(vec![json!({"id": "u1"})]),
                Ok(vec![json!({"id": "u2"}), json!({"id": "u3"})]),
            ])),
        )
        .unwrap();
    let session = session_with(&[]);
    runner.load(&session).await.unwrap();
    assert_eq!(runner.reload("users", &session).await.unwrap(), 2);
    let cache = runner.cache("users").unwrap();
    assert!(!cache.contains("u1"));
    assert!(cache.contains("u3"));
}

#[tokio::test]
async fn http_source_sends_token_and_unwraps_envelope() {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/users"))
        .and(header("authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [
                {"id": 1, "name": "Alice", "settings": {"autopay": {"enabled": true}}},
                {"id": 2, "name": "Bob"}
            ]
        })))
        .mount(&server)
        .await;

    let mut config = HttpSourceConfig::new(format!("{}/api/admin/users", server.uri()));
    config.token = Some("s3cret".to_string());
    let source = HttpListSource::new(config).unwrap();

    let mut cache = EntityCache::new();
    assert_eq!(fetch::load_into(&source, &mut cache, "id").await.unwrap(), 2);
    let alice = cache.lookup("1").unwrap();
    assert_eq!(alice.field("settings.autopay.enabled"), Some(&json!(true)));
}

#[tokio::test]
async fn http_source_reports_status_and_rejections() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/denied"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": false, "message": "permission denied"})),
        )
        .mount(&server)
        .await;

    let broken =
        HttpListSource::new(HttpSourceConfig::new(format!("{}/broken", server.uri()))).unwrap();
    assert!(matches!(
        broken.list().await,
        Err(FetchError::Status { status: 500, .. })
    ));

    let denied =
        HttpListSource::new(HttpSourceConfig::new(format!("{}/denied", server.uri()))).unwrap();
    assert!(matches!(
        denied.list().await,
        Err(FetchError::Rejected { ref message }) if message == "permission denied"
    ));
}

#[tokio::test]
async fn file_source_reads_saved_response() {
    let path = std::env::temp_dir().join(format!("adminview-autopay-{}.json", std::process::id()));
    tokio::fs::write(
        &path,
        r#"{"success": true, "users": [{"user_id": 42, "full_name": "Maria Lopez"}]}"#,
    )
    .await
    .unwrap();

    let source = FileListSource::new(path.to_string_lossy().to_string()).list_key("users");
    let mut cache = EntityCache::new();
    let loaded = fetch::load_into(&source, &mut cache, "user_id").await;
    let _ = tokio::fs::remove_file(&path).await;

    assert_eq!(loaded.unwrap(), 1);
    assert_eq!(cache.lookup("42").unwrap().display_name(), "Maria Lopez");
}

#[tokio::test]
async fn file_source_missing_file_is_a_read_error() {
    let source = FileListSource::new("/definitely/not/here/users.json");
    assert!(matches!(source.list().await, Err(FetchError::Read { .. })));
}

#[test]
fn display_name_falls_back_through_known_fields() {
    let payload = json!({"first_name": "Ada", "last_name": "King", "email": "ada@x.io"});
    let map = payload.as_object().unwrap();
    assert_eq!(crate::utils::display_name(map), Some("Ada King".to_string()));

    let payload = json!({"email": "ops@x.io"});
    assert_eq!(
        crate::utils::display_name(payload.as_object().unwrap()),
        Some("ops@x.io".to_string())
    );

    let e = CacheEntry::from_raw(json!({"id": "u5"}), "id").unwrap();
    assert_eq!(e.display_name(), "u5");
}

#[test]
fn lookup_path_walks_nested_objects_only() {
    let payload = json!({"settings": {"autopay": {"day": 5}}, "tags": ["a"]});
    let map = payload.as_object().unwrap();
    assert_eq!(crate::utils::lookup_path(map, "settings.autopay.day"), Some(&json!(5)));
    assert_eq!(crate::utils::lookup_path(map, "settings.missing"), None);
    assert_eq!(crate::utils::lookup_path(map, "tags.0"), None);
    assert_eq!(crate::utils::lookup_path(map, "settings..day"), None);
}

#[test]
fn capability_csv_dedups_and_rejects_spaces() {
    let caps =
        crate::utils::parse_capabilities_csv("orders.view, users.view,orders.view,").unwrap();
    assert_eq!(caps.len(), 2);
    assert!(crate::utils::parse_capabilities_csv("orders view").is_err());
    assert!(crate::utils::parse_capabilities_csv("").unwrap().is_empty());
}
