mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{TestApp, PASSWORD, USERNAME};

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::spawn().await;
    let (status, body) = app.send(Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("OK"));
}

#[tokio::test]
async fn login_returns_token_and_username() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .send(Method::POST, "/api/login", Some(json!({ "username": USERNAME, "password": PASSWORD })), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], USERNAME);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn bad_credentials_are_401() {
    let app = TestApp::spawn().await;

    for (username, password) in [(USERNAME, "wrong"), ("ghost", PASSWORD)] {
        let (status, body) = app
            .send(Method::POST, "/api/login", Some(json!({ "username": username, "password": password })), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid username or password");
    }
}

#[tokio::test]
async fn protected_routes_need_a_valid_bearer() {
    let app = TestApp::spawn().await;

    let (status, _) = app.send(Method::GET, "/api/clients", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send(Method::GET, "/api/invoices", None, Some("not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send(Method::GET, "/api/invoices", None, Some(app.token())).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn me_reports_the_token_owner() {
    let app = TestApp::spawn().await;
    let (status, body) = app.get("/api/me").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "username": USERNAME }));
}

#[tokio::test]
async fn unknown_api_route_is_a_json_404() {
    let app = TestApp::spawn().await;
    let (status, body) = app.get("/api/nothing-here").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Route not found" }));
}
