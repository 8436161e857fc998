// crates/registry-server/tests/http_api.rs
// ============================================================================
// Module: HTTP API Integration Tests
// Description: Drives the full axum router in-process over an in-memory store.
// Purpose: Exercise auth, package CRUD, and the ACL guards end to end.
// ============================================================================

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::http::StatusCode;
use axum::Router;
use registry_auth::JwtTokenCodec;
use registry_server::AppState;
use registry_store_sqlite::SqliteStore;
use serde_json::json;
use serde_json::Value;
use tower::ServiceExt;

fn test_app() -> Router {
    test_app_with_store().0
}

fn test_app_with_store() -> (Router, Arc<SqliteStore>) {
    let store = Arc::new(SqliteStore::open_in_memory().expect("open in-memory store"));
    let token_codec = JwtTokenCodec::new("test-secret");

    let state = AppState {
        store: Arc::clone(&store),
        token_codec: Arc::new(token_codec),
        token_expiry_seconds: 7_200,
        default_namespace_owner_role: "owner".to_string(),
    };

    (registry_server::router(state), store)
}

async fn json_request(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }

    let request = if let Some(body) = body {
        builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("serialize body")))
            .expect("build request")
    } else {
        builder.body(Body::empty()).expect("build request")
    };

    let response = app.clone().oneshot(request).await.expect("dispatch request");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("read body");

    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).expect("parse json body") };

    (status, value)
}

async fn register(app: &Router, username: &str, email: &str, password: &str) -> (StatusCode, Value) {
    json_request(
        app,
        "POST",
        "/user",
        None,
        Some(json!({ "username": username, "email": email, "password": password })),
    )
    .await
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let request = Request::builder()
        .method("POST")
        .uri("/login")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(format!("username={username}&password={password}")))
        .expect("build login request");

    let response = app.clone().oneshot(request).await.expect("dispatch login");
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("read login body");
    let body: Value = serde_json::from_slice(&bytes).expect("parse login body");
    body["access_token"].as_str().expect("access_token present").to_string()
}

#[tokio::test]
async fn register_login_and_whoami_round_trip() {
    let app = test_app();

    let (status, body) = register(&app, "alex", "alex@example.com", "hunter2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alex");
    assert_eq!(body["role"], "regular");

    let token = login(&app, "alex", "hunter2").await;

    let (status, body) = json_request(&app, "GET", "/user/alex", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "alex@example.com");
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let app = test_app();
    register(&app, "alex", "alex@example.com", "hunter2").await;

    let request = Request::builder()
        .method("POST")
        .uri("/login")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from("username=alex&password=wrong"))
        .expect("build request");

    let response = app.clone().oneshot(request).await.expect("dispatch request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_username_and_email_are_rejected() {
    let app = test_app();
    register(&app, "alex", "alex@example.com", "hunter2").await;

    let (status, _) = register(&app, "alex", "other@example.com", "hunter2").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = register(&app, "someone-else", "alex@example.com", "hunter2").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn whoami_requires_bearer_token() {
    let app = test_app();
    register(&app, "alex", "alex@example.com", "hunter2").await;

    let (status, _) = json_request(&app, "GET", "/user/alex", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn whoami_forbids_viewing_another_users_profile() {
    let app = test_app();
    register(&app, "alex", "alex@example.com", "hunter2").await;
    register(&app, "sam", "sam@example.com", "hunter2").await;
    let token = login(&app, "alex", "hunter2").await;

    let (status, _) = json_request(&app, "GET", "/user/sam", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn regular_user_cannot_create_a_namespace() {
    let app = test_app();
    register(&app, "alex", "alex@example.com", "hunter2").await;
    let token = login(&app, "alex", "hunter2").await;

    let (status, _) = json_request(
        &app,
        "POST",
        "/namespace",
        Some(&token),
        Some(json!({ "name": "widgets", "description": "widget packages" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unauthenticated_namespace_create_is_rejected_before_acl() {
    let app = test_app();

    let (status, _) = json_request(&app, "POST", "/namespace", None, Some(json!({ "name": "widgets" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn package_without_namespace_lifecycle() {
    let app = test_app();
    register(&app, "alex", "alex@example.com", "hunter2").await;
    let token = login(&app, "alex", "hunter2").await;

    let (status, body) = json_request(
        &app,
        "POST",
        "/package",
        Some(&token),
        Some(json!({
            "name": "left-pad",
            "summary": "pads a string",
            "owners": [],
            "versions": [{
                "version": "1.0.0",
                "description": "initial release",
            }],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["owners"], json!(["alex"]));
    assert_eq!(body["versions"][0]["version"], "1.0.0");

    let (status, body) = json_request(&app, "GET", "/package/left-pad", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "left-pad");

    let (status, _) = json_request(
        &app,
        "POST",
        "/package/left-pad/version",
        Some(&token),
        Some(json!({ "version": "1.1.0", "description": "second release" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = json_request(
        &app,
        "POST",
        "/package/left-pad/tag/latest",
        Some(&token),
        Some(json!({ "version": "1.1.0" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], "1.1.0");

    // Retargeting the same tag to the older version is still a 200, not a conflict.
    let (status, body) = json_request(
        &app,
        "POST",
        "/package/left-pad/tag/latest",
        Some(&token),
        Some(json!({ "version": "1.0.0" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], "1.0.0");

    let (status, _) = json_request(&app, "DELETE", "/package/left-pad/version/1.0.0", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "version is still tagged");

    let (status, _) = json_request(&app, "DELETE", "/package/left-pad/tag/latest", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = json_request(&app, "DELETE", "/package/left-pad/version/1.0.0", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = json_request(&app, "DELETE", "/package/left-pad", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = json_request(&app, "GET", "/package/left-pad", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn package_edit_rejects_empty_owner_list_and_unknown_owners() {
    let app = test_app();
    register(&app, "alex", "alex@example.com", "hunter2").await;
    let token = login(&app, "alex", "hunter2").await;

    json_request(
        &app,
        "POST",
        "/package",
        Some(&token),
        Some(json!({ "name": "left-pad", "owners": [] })),
    )
    .await;

    let (status, _) = json_request(
        &app,
        "POST",
        "/package/left-pad",
        Some(&token),
        Some(json!({ "name": "left-pad", "owners": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = json_request(
        &app,
        "POST",
        "/package/left-pad",
        Some(&token),
        Some(json!({ "name": "left-pad", "owners": ["ghost"] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["usernames"], json!(["ghost"]));
}

#[tokio::test]
async fn only_owners_may_edit_a_package() {
    let app = test_app();
    register(&app, "alex", "alex@example.com", "hunter2").await;
    register(&app, "sam", "sam@example.com", "hunter2").await;
    let alex_token = login(&app, "alex", "hunter2").await;
    let sam_token = login(&app, "sam", "hunter2").await;

    json_request(
        &app,
        "POST",
        "/package",
        Some(&alex_token),
        Some(json!({ "name": "left-pad", "owners": [] })),
    )
    .await;

    let (status, _) = json_request(
        &app,
        "POST",
        "/package/left-pad",
        Some(&sam_token),
        Some(json!({ "name": "left-pad", "owners": ["alex"] })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn version_create_rejects_unknown_dependency() {
    let app = test_app();
    register(&app, "alex", "alex@example.com", "hunter2").await;
    let token = login(&app, "alex", "hunter2").await;

    let (status, body) = json_request(
        &app,
        "POST",
        "/package",
        Some(&token),
        Some(json!({
            "name": "leftmost",
            "owners": [],
            "versions": [{
                "version": "1.0.0",
                "dependencies": [{ "package": "does-not-exist", "spec": "^1" }],
            }],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["packages"], json!(["does-not-exist"]));
}

#[tokio::test]
async fn delete_package_rejects_when_another_package_depends_on_it() {
    let app = test_app();
    register(&app, "alex", "alex@example.com", "hunter2").await;
    let token = login(&app, "alex", "hunter2").await;

    json_request(
        &app,
        "POST",
        "/package",
        Some(&token),
        Some(json!({ "name": "base", "owners": [], "versions": [{ "version": "1.0.0" }] })),
    )
    .await;

    json_request(
        &app,
        "POST",
        "/package",
        Some(&token),
        Some(json!({
            "name": "derived",
            "owners": [],
            "versions": [{
                "version": "1.0.0",
                "dependencies": [{ "package": "base", "spec": "^1" }],
            }],
        })),
    )
    .await;

    let (status, _) = json_request(&app, "DELETE", "/package/base", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn banned_owner_cannot_edit_their_own_package() {
    let (app, store) = test_app_with_store();
    register(&app, "alex", "alex@example.com", "hunter2").await;
    let token = login(&app, "alex", "hunter2").await;

    json_request(
        &app,
        "POST",
        "/package",
        Some(&token),
        Some(json!({ "name": "left-pad", "owners": [], "versions": [{ "version": "1.0.0" }] })),
    )
    .await;

    store.set_user_role("alex", registry_core::model::UserRole::Banned).expect("ban alex");

    let (status, _) = json_request(
        &app,
        "POST",
        "/package/left-pad",
        Some(&token),
        Some(json!({ "name": "left-pad", "owners": ["alex"] })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = json_request(
        &app,
        "POST",
        "/package/left-pad/version",
        Some(&token),
        Some(json!({ "version": "1.1.0" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn publishing_an_existing_version_conflicts_and_edit_retries_in_place() {
    let app = test_app();
    register(&app, "alex", "alex@example.com", "hunter2").await;
    let token = login(&app, "alex", "hunter2").await;

    json_request(
        &app,
        "POST",
        "/package",
        Some(&token),
        Some(json!({ "name": "left-pad", "owners": [], "versions": [{ "version": "1.0.0", "description": "first" }] })),
    )
    .await;

    let (status, body) = json_request(
        &app,
        "POST",
        "/package/left-pad/version",
        Some(&token),
        Some(json!({ "version": "1.0.0", "description": "duplicate" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["what"], "Version");

    let (status, body) = json_request(
        &app,
        "POST",
        "/package/left-pad/version/1.0.0",
        Some(&token),
        Some(json!({ "version": "1.0.0", "description": "replaced in place" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["description"], "replaced in place");
}

#[tokio::test]
async fn permission_catalog_lists_every_code() {
    let app = test_app();

    let (status, body) = json_request(&app, "GET", "/permission", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let codes: Vec<&str> = body.as_array().expect("array body").iter().map(|entry| entry["code"].as_str().unwrap()).collect();
    assert_eq!(codes, vec!["namespace_owner", "namespace_admin", "namespace_edit", "package_create", "package_edit"]);
}
