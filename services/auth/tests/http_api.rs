//! Router-level tests for the auth service HTTP surface.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use test_utils::SampleAccount;
use tower::ServiceExt;

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::post(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_reports_service() {
    let app = common::app();
    let (status, body) = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "auth-service");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_register_login_verify_scenario() {
    let app = common::app();
    let alice = SampleAccount::alice();

    let (status, registered) = send(&app, post_json("/auth/register", &alice.register_body())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(registered["message"], "User registered successfully");
    assert_eq!(registered["user"]["username"], "alice");
    assert_eq!(registered["user"]["role"], "user");
    assert!(registered["user"].get("password_hash").is_none());

    let duplicate = SampleAccount::new("someone", "alice@x.com", "other1");
    let (status, body) = send(&app, post_json("/auth/register", &duplicate.register_body())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body,
        json!({ "error": "User with this email or username already exists" })
    );

    let (status, logged_in) = send(&app, post_json("/auth/login", &alice.login_body())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(logged_in["message"], "Login successful");
    let access = logged_in["accessToken"].as_str().unwrap();
    assert!(logged_in["refreshToken"].is_string());

    let verify = Request::get("/auth/verify")
        .header(header::AUTHORIZATION, format!("Bearer {access}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, verify).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
    assert_eq!(body["user"]["id"], registered["user"]["id"]);
}

#[tokio::test]
async fn test_register_without_body_is_bad_request() {
    let app = common::app();
    let (status, body) = send(&app, post_empty("/auth/register")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Username, email, and password are required" }));
}

#[tokio::test]
async fn test_login_missing_password_is_bad_request() {
    let app = common::app();
    let (status, body) = send(&app, post_json("/auth/login", &json!({ "email": "a@x.com" }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Email and password are required" }));
}

#[tokio::test]
async fn test_refresh_over_http_rotates_once() {
    let app = common::app();
    let (_, registered) = send(
        &app,
        post_json("/auth/register", &SampleAccount::alice().register_body()),
    )
    .await;
    let token = registered["refreshToken"].clone();

    let (status, rotated) = send(&app, post_json("/auth/refresh", &json!({ "refreshToken": token }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(rotated["refreshToken"], token);
    assert!(rotated["accessToken"].is_string());

    let (status, body) = send(&app, post_json("/auth/refresh", &json!({ "refreshToken": token }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "Invalid refresh token" }));
}

#[tokio::test]
async fn test_refresh_without_token_is_bad_request() {
    let app = common::app();
    let (status, body) = send(&app, post_json("/auth/refresh", &json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Refresh token is required" }));
}

#[tokio::test]
async fn test_verify_without_header() {
    let app = common::app();
    let (status, body) = send(&app, Request::get("/auth/verify").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "valid": false, "error": "No token provided" }));
}

#[tokio::test]
async fn test_verify_with_forged_token() {
    let app = common::app();
    let request = Request::get("/auth/verify")
        .header(header::AUTHORIZATION, "Bearer forged")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "valid": false, "error": "Invalid token" }));
}

#[tokio::test]
async fn test_logout_always_succeeds() {
    let app = common::app();
    let expected = json!({ "message": "Logged out successfully" });

    let (status, body) = send(&app, post_empty("/auth/logout")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, expected);

    let (status, body) = send(&app, post_json("/auth/logout", &json!({ "refreshToken": "garbage" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, expected);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = common::app();
    let (status, body) = send(&app, Request::get("/nope").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Not found" }));
}

#[tokio::test]
async fn test_responses_carry_hardening_headers() {
    let app = common::app();
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert_eq!(response.headers()["referrer-policy"], "no-referrer");
    assert!(response.headers().contains_key("x-request-id"));
}
