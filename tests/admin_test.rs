//! Admin API: authentication, module listing, template dry runs.

use axum::http::StatusCode;
use espresso_front::http::HttpServer;
use serde_json::Value;

mod common;

use common::ADMIN_KEY;

#[tokio::test]
async fn test_admin_requires_bearer_token() {
    let fixture = common::fixture();
    let router = HttpServer::new(fixture.config.clone()).router();

    let (response, _) = common::get(&router, "/admin/status", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let (response, _) = common::get(&router, "/admin/status", Some("wrong")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let (response, body) = common::get(&router, "/admin/status", Some(ADMIN_KEY)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let status: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(status["status"], "operational");
    assert_eq!(status["modules"], 4);
    assert_eq!(status["matched_modules"], 0);
}

#[tokio::test]
async fn test_modules_reflect_matches() {
    let fixture = common::fixture();
    let router = HttpServer::new(fixture.config.clone()).router();

    common::get(&router, "/events/summer-gala", None).await;
    let (response, body) = common::get(&router, "/admin/modules", Some(ADMIN_KEY)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let listing: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(listing["matched"], serde_json::json!(["event_list", "event_single"]));
    let registered = listing["registered"].as_array().unwrap();
    assert_eq!(registered.len(), 4);
    assert_eq!(registered[0]["name"], "event_list");
    assert_eq!(registered[0]["matched"], true);
    assert_eq!(registered[2]["name"], "flaky");
    assert_eq!(registered[2]["matched"], false);
}

#[tokio::test]
async fn test_template_dry_run() {
    let fixture = common::fixture();
    let router = HttpServer::new(fixture.config.clone()).router();

    let (_, body) = common::get(
        &router,
        "/admin/templates?view=single-espresso_events.html",
        Some(ADMIN_KEY),
    )
    .await;
    let selection: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(selection["found"], true);
    let expected = fixture.dir.path().join("theme/single-espresso_events.html");
    assert_eq!(selection["resolved_path"], expected.to_str().unwrap());

    let (_, body) = common::get(
        &router,
        "/admin/templates?view=..%2F..%2Fetc%2Fpasswd",
        Some(ADMIN_KEY),
    )
    .await;
    let selection: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(selection["found"], false);
    let default = fixture.dir.path().join("index.html");
    assert_eq!(selection["resolved_path"], default.to_str().unwrap());
}

#[tokio::test]
async fn test_admin_disabled_is_just_a_page() {
    let mut fixture = common::fixture();
    fixture.config.admin.enabled = false;
    let router = HttpServer::new(fixture.config.clone()).router();

    let (response, _) = common::get(&router, "/admin/status", Some(ADMIN_KEY)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
