mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Duration;
use quiz_backend::middleware::auth::issue_token;
use quiz_backend::models::question::QuestionType;
use quiz_backend::models::template::TestTemplate;
use quiz_backend::AppState;
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;
use uuid::Uuid;

use common::*;

const SECRET: &str = "test_secret_key";

fn app(store: &quiz_backend::repository::InMemoryStore) -> Router {
    let state = AppState::with_services(session_service(store), analytics_service(store), SECRET);
    quiz_backend::create_router(state)
}

fn bearer(user: &str) -> String {
    let role = match user {
        "admin" => Some("admin"),
        "teacher" => Some("teacher"),
        _ => None,
    };
    format!(
        "Bearer {}",
        issue_token(SECRET, user, role, Duration::hours(1)).expect("token")
    )
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    user: Option<&str>,
    body: Option<JsonValue>,
) -> (StatusCode, JsonValue) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(header::AUTHORIZATION, bearer(user));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null)
    };
    (status, json)
}

#[tokio::test]
async fn health_is_public() {
    let t = template(1, false);
    let app = app(&seeded_store(&t, &[]));
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn api_requires_a_valid_token() {
    let t = template(1, false);
    let app = app(&seeded_store(&t, &[]));
    let uri = format!("/api/templates/{}/sessions", t.id);

    let (status, body) = send(&app, "POST", &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing_authorization");

    let request = Request::builder()
        .method("POST")
        .uri(&uri)
        .header(header::AUTHORIZATION, "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn start_save_check_over_http() {
    let q = question("2+2?", QuestionType::SingleChoice, &[("3", false), ("4", true)]);
    let t = template(1, false);
    let store = seeded_store(&t, &[q.clone()]);
    let app = app(&store);

    let (status, started) = send(
        &app,
        "POST",
        &format!("/api/templates/{}/sessions", t.id),
        Some("u1"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(started["degraded"], false);
    let session = &started["session"];
    assert!(!session.to_string().contains("is_correct"));
    let session_id = session["id"].as_str().unwrap().to_string();
    let sq_id = session["questions"][0]["id"].as_str().unwrap().to_string();

    let (status, saved) = send(
        &app,
        "PUT",
        &format!("/api/sessions/{}/answers", session_id),
        Some("u1"),
        Some(json!({
            "answers": [{
                "session_question_id": sq_id,
                "selected_option_ids": [option_id(&q, "4")]
            }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        saved["questions"][0]["selected_option_ids"][0],
        json!(option_id(&q, "4"))
    );

    let (status, graded) = send(
        &app,
        "GET",
        &format!("/api/sessions/{}/check", session_id),
        Some("u1"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(graded["correct_count"], 1);
    assert_eq!(graded["questions"][0]["correct_answers"], json!(["4"]));

    let (status, analytics) = send(
        &app,
        "GET",
        &format!("/api/templates/{}/analytics?history=true", t.id),
        Some("admin"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(analytics["total_attempts"], 1);
    assert_eq!(analytics["history"][0]["passed"], true);
}

#[tokio::test]
async fn error_kinds_map_to_distinct_statuses() {
    let q = question("Q", QuestionType::Survey, &[]);
    let t = template(1, false);
    let store = seeded_store(&t, &[q]);
    let app = app(&store);

    let (_, started) = send(
        &app,
        "POST",
        &format!("/api/templates/{}/sessions", t.id),
        Some("owner"),
        None,
    )
    .await;
    let session_id = started["session"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/sessions/{}/check", session_id),
        Some("someone-else"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/sessions/{}", Uuid::new_v4()),
        Some("owner"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let bad = template(0, false);
    store.insert_template(bad.clone()).unwrap();
    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/templates/{}/sessions", bad.id),
        Some("owner"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("at least one question"));
}

#[tokio::test]
async fn analytics_history_is_hidden_from_test_takers() {
    let q = question("Ready?", QuestionType::SingleChoice, &[("yes", true), ("no", false)]);
    let t = template(1, false);
    let store = seeded_store(&t, &[q.clone()]);
    let app = app(&store);

    let (_, started) = send(
        &app,
        "POST",
        &format!("/api/templates/{}/sessions", t.id),
        Some("alice"),
        None,
    )
    .await;
    let session_id = started["session"]["id"].as_str().unwrap().to_string();
    let sq_id = started["session"]["questions"][0]["id"].as_str().unwrap().to_string();
    send(
        &app,
        "PUT",
        &format!("/api/sessions/{}/answers", session_id),
        Some("alice"),
        Some(json!({
            "answers": [{
                "session_question_id": sq_id,
                "selected_option_ids": [option_id(&q, "no")]
            }]
        })),
    )
    .await;

    let uri = format!("/api/templates/{}/analytics?history=true", t.id);
    let (status, body) = send(&app, "GET", &uri, Some("mallory"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
    assert!(!body.to_string().contains("alice"));

    let (status, body) = send(&app, "GET", &uri, Some("teacher"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["history"][0]["user_id"], "alice");
    assert_eq!(body["history"][0]["questions"][0]["selected_answers"], json!(["no"]));
}

#[tokio::test]
async fn private_template_analytics_are_admin_only() {
    let t = TestTemplate {
        is_private: true,
        ..template(1, false)
    };
    let app = app(&seeded_store(&t, &[]));
    let uri = format!("/api/templates/{}/analytics", t.id);

    let (status, _) = send(&app, "GET", &uri, Some("teacher"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "GET", &uri, Some("admin"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_attempts"], 0);
}
