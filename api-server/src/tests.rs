use std::sync::Arc;

use actix_web::{http::StatusCode, test as awtest, web, App};
use chrono::TimeDelta;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::config::AppState;
use crate::handlers::{escape_html, format_thousands, routes, share_url};
use crate::store::{MemoryStore, SqliteStore, Store};

fn test_state(store: Arc<dyn Store>) -> AppState {
    AppState {
        store,
        public_base_url: "https://labpanic.test".to_string(),
        session_ttl: TimeDelta::hours(2),
        app_env: "test".to_string(),
    }
}

fn memory_state() -> AppState {
    test_state(Arc::new(MemoryStore::new()))
}

macro_rules! test_app {
    ($state:expr) => {
        awtest::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .configure(routes),
        )
        .await
    };
}

fn assert_error(body: &Value, code: &str) {
    assert_eq!(body["error"]["code"], Value::String(code.to_string()));
    assert!(body["error"]["message"].as_str().is_some_and(|m| !m.is_empty()));
}

#[actix_web::test]
async fn health_reports_counts_and_environment() {
    let app = test_app!(memory_state());
    let req = awtest::TestRequest::get().uri("/api/health").to_request();
    let resp = awtest::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = awtest::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["sessions"], 0);
    assert_eq!(body["scores"], 0);
    assert_eq!(body["environment"], "test");
}

#[actix_web::test]
async fn version_is_crate_version() {
    let app = test_app!(memory_state());
    let req = awtest::TestRequest::get().uri("/api/version").to_request();
    let body: Value = awtest::call_and_read_body_json(&app, req).await;
    assert_eq!(body["version"], "1.0.0");
}

#[actix_web::test]
async fn start_session_validates_platform() {
    let app = test_app!(memory_state());

    let req = awtest::TestRequest::post()
        .uri("/api/sessions/start")
        .set_json(json!({ "platform": "console" }))
        .to_request();
    let resp = awtest::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = awtest::read_body_json(resp).await;
    assert_error(&body, "INVALID_PLATFORM");

    // No body at all behaves like a missing platform.
    let req = awtest::TestRequest::post().uri("/api/sessions/start").to_request();
    let resp = awtest::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = awtest::TestRequest::post()
        .uri("/api/sessions/start")
        .set_json(json!({ "platform": "mobile" }))
        .to_request();
    let resp = awtest::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = awtest::read_body_json(resp).await;
    assert!(body["session_id"].as_str().is_some());
    assert!(body["start_token"].as_str().is_some());
    assert!(body["started_at"].as_str().is_some_and(|t| t.ends_with('Z')));
    assert!(body["expires_at"].as_str().is_some());
}

macro_rules! start_session {
    ($app:expr) => {{
        let req = awtest::TestRequest::post()
            .uri("/api/sessions/start")
            .set_json(json!({ "platform": "desktop" }))
            .to_request();
        let session: Value = awtest::call_and_read_body_json($app, req).await;
        session
    }};
}

fn score_body(session: &Value, name: &str, score: Value) -> Value {
    json!({
        "session_id": session["session_id"],
        "start_token": session["start_token"],
        "player_name": name,
        "score": score,
        "platform": "desktop",
    })
}

#[actix_web::test]
async fn full_submit_flow_and_replay_rejection() {
    let app = test_app!(memory_state());
    let session = start_session!(&app);

    let req = awtest::TestRequest::post()
        .uri("/api/scores")
        .set_json(score_body(&session, "Ann_Lee-01", json!(1234)))
        .to_request();
    let resp = awtest::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = awtest::read_body_json(resp).await;
    assert_eq!(body["player_name"], "Ann_Lee-01");
    assert_eq!(body["score"], 1234);
    assert_eq!(body["weekly_rank"], 1);
    assert_eq!(body["alltime_rank"], 1);
    assert!(body["score_id"].as_str().is_some());
    assert!(body["weekly_key"].as_str().is_some_and(|k| k.contains("-W")));
    let share = body["share_url"].as_str().unwrap_or_default().to_string();
    assert!(share.starts_with("https://labpanic.test/share/"));

    let req = awtest::TestRequest::post()
        .uri("/api/scores")
        .set_json(score_body(&session, "Ann_Lee-01", json!(1234)))
        .to_request();
    let resp = awtest::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = awtest::read_body_json(resp).await;
    assert_error(&body, "INVALID_SESSION");

    let share_path = share.trim_start_matches("https://labpanic.test");
    let req = awtest::TestRequest::get().uri(share_path).to_request();
    let resp = awtest::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = String::from_utf8(awtest::read_body(resp).await.to_vec()).unwrap();
    assert!(html.contains("Ann_Lee-01"));
    assert!(html.contains("1,234 points"));
}

#[actix_web::test]
async fn submit_error_codes_and_statuses() {
    let app = test_app!(memory_state());
    let session = start_session!(&app);

    let cases = [
        (json!({}), StatusCode::BAD_REQUEST, "MISSING_FIELDS"),
        (
            json!({ "session_id": session["session_id"], "player_name": "Ann", "score": 1 }),
            StatusCode::BAD_REQUEST,
            "MISSING_FIELDS",
        ),
        (
            score_body(&json!({ "session_id": "x", "start_token": "y" }), "Ann", json!(1)),
            StatusCode::UNAUTHORIZED,
            "INVALID_SESSION",
        ),
        (
            score_body(&session, "Bad!Name", json!(1)),
            StatusCode::BAD_REQUEST,
            "INVALID_NAME",
        ),
        (
            score_body(&session, "Ann", json!(-1)),
            StatusCode::BAD_REQUEST,
            "INVALID_SCORE",
        ),
        (
            score_body(&session, "Ann", json!(1_000_000_001u64)),
            StatusCode::BAD_REQUEST,
            "INVALID_SCORE",
        ),
    ];

    for (body, status, code) in cases {
        let req = awtest::TestRequest::post()
            .uri("/api/scores")
            .set_json(&body)
            .to_request();
        let resp = awtest::call_service(&app, req).await;
        assert_eq!(resp.status(), status, "{body}");
        let json: Value = awtest::read_body_json(resp).await;
        assert_error(&json, code);
    }

    // None of the rejected attempts used up the session.
    let req = awtest::TestRequest::post()
        .uri("/api/scores")
        .set_json(score_body(&session, "Ann", json!(0)))
        .to_request();
    assert_eq!(awtest::call_service(&app, req).await.status(), StatusCode::CREATED);
}

#[actix_web::test]
async fn leaderboard_lists_best_scores() {
    let app = test_app!(memory_state());
    for (name, score) in [("Alice", 100), ("Bob", 150), ("Alice", 200)] {
        let session = start_session!(&app);
        let req = awtest::TestRequest::post()
            .uri("/api/scores")
            .set_json(score_body(&session, name, json!(score)))
            .to_request();
        assert_eq!(awtest::call_service(&app, req).await.status(), StatusCode::CREATED);
    }

    let req = awtest::TestRequest::get()
        .uri("/api/leaderboard?scope=alltime")
        .to_request();
    let body: Value = awtest::call_and_read_body_json(&app, req).await;
    assert_eq!(body["scope"], "alltime");
    assert_eq!(body["weekly_key"], Value::Null);
    assert!(body["updated_at"].as_str().is_some());
    let entries = body["entries"].as_array().cloned().unwrap_or_default();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["rank"], 1);
    assert_eq!(entries[0]["player_name"], "Alice");
    assert_eq!(entries[0]["score"], 200);
    assert_eq!(entries[1]["rank"], 2);
    assert_eq!(entries[1]["player_name"], "Bob");

    let req = awtest::TestRequest::get()
        .uri("/api/leaderboard?scope=weekly&limit=1")
        .to_request();
    let body: Value = awtest::call_and_read_body_json(&app, req).await;
    assert!(body["weekly_key"].as_str().is_some());
    assert_eq!(body["entries"].as_array().map(Vec::len), Some(1));

    let req = awtest::TestRequest::get()
        .uri("/api/leaderboard/weeks")
        .to_request();
    let body: Value = awtest::call_and_read_body_json(&app, req).await;
    assert_eq!(body["weeks"].as_array().map(Vec::len), Some(1));
}

#[actix_web::test]
async fn leaderboard_rejects_bad_scope() {
    let app = test_app!(memory_state());
    for uri in ["/api/leaderboard", "/api/leaderboard?scope=monthly"] {
        let req = awtest::TestRequest::get().uri(uri).to_request();
        let resp = awtest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = awtest::read_body_json(resp).await;
        assert_error(&body, "INVALID_SCOPE");
    }
}

#[actix_web::test]
async fn unknown_share_id_is_not_found() {
    let app = test_app!(memory_state());
    let req = awtest::TestRequest::get().uri("/share/nothing-here").to_request();
    let resp = awtest::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(awtest::read_body(resp).await, "Score not found");
}

#[actix_web::test]
async fn sqlite_backed_app_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = SqliteStore::open(dir.path()).unwrap();
    let app = test_app!(test_state(Arc::new(store)));

    let session = start_session!(&app);
    let req = awtest::TestRequest::post()
        .uri("/api/scores")
        .set_json(score_body(&session, "Dee", json!(42)))
        .to_request();
    assert_eq!(awtest::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = awtest::TestRequest::get().uri("/api/health").to_request();
    let body: Value = awtest::call_and_read_body_json(&app, req).await;
    assert_eq!(body["sessions"], 1);
    assert_eq!(body["scores"], 1);
}

#[test]
fn share_page_helpers() {
    assert_eq!(
        escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
        "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
    );
    assert_eq!(format_thousands(0), "0");
    assert_eq!(format_thousands(999), "999");
    assert_eq!(format_thousands(1_000), "1,000");
    assert_eq!(format_thousands(1_000_000_000), "1,000,000,000");
    assert_eq!(share_url("http://localhost:8787/", "abc"), "http://localhost:8787/share/abc");
}
