mod common;

use axum::http::StatusCode;
use common::{JWT_SECRET, TestApp, get, request};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::json;
use sso_gateway::db::Role;
use std::time::{SystemTime, UNIX_EPOCH};

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new().await;

    let response = tower::ServiceExt::oneshot(app.app.clone(), get("/health", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"OK");
}

#[tokio::test]
async fn test_token_check_endpoint() {
    let app = TestApp::new().await;
    let (_, token) = app.token_for("v@x.com", Role::Client).await;

    let (status, body) = app.send(get("/v", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "message": "token is valid"}));

    let (status, body) = app.send(get("/v", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "authorization header is missing");
}

#[tokio::test]
async fn test_wrong_scheme_rejected() {
    let app = TestApp::new().await;
    let (_, token) = app.token_for("w@x.com", Role::Manager).await;

    let request = axum::http::Request::builder()
        .uri("/manager/order")
        .header("authorization", format!("Token {token}"))
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, _) = app.send(request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(app.manager.calls().is_empty());
}

#[tokio::test]
async fn test_garbage_and_forged_tokens_rejected() {
    let app = TestApp::new().await;

    let (status, body) = app.send(get("/manager/order", Some("not-a-jwt"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "invalid token");
    assert_eq!(body["details"], "token is malformed");

    let forged = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &json!({"sub": "1", "role": "manager", "typ": "access", "jti": "x", "iat": now(), "exp": now() + 60}),
        &EncodingKey::from_secret(b"somebody-elses-secret-0123456789"),
    )
    .unwrap();
    let (status, body) = app.send(get("/manager/order", Some(&forged))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["details"], "token signature is invalid");

    assert!(app.manager.calls().is_empty());
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let app = TestApp::new().await;
    let (id, _) = app.token_for("x@x.com", Role::Manager).await;

    let expired = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &json!({"sub": id.to_string(), "role": "manager", "typ": "access", "jti": "x", "iat": now() - 120, "exp": now() - 60}),
        &EncodingKey::from_secret(JWT_SECRET),
    )
    .unwrap();

    let (status, body) = app.send(get("/manager/order", Some(&expired))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["details"], "token has expired");
    assert!(app.manager.calls().is_empty());
}

#[tokio::test]
async fn test_refresh_token_is_not_a_bearer_token() {
    let app = TestApp::new().await;
    let (id, _) = app.token_for("y@x.com", Role::Client).await;
    let pair = app.tokens.issue(id, Role::Client).unwrap();

    let (status, _) = app.send(get("/client/order", Some(&pair.refresh_token))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(app.customer.calls().is_empty());
}

#[tokio::test]
async fn test_role_groups() {
    let app = TestApp::new().await;
    let (_, client) = app.token_for("client@x.com", Role::Client).await;
    let (_, manager) = app.token_for("manager@x.com", Role::Manager).await;
    let (_, admin) = app.token_for("admin@x.com", Role::Admin).await;

    let cases = [
        ("/admin/product", &client, StatusCode::FORBIDDEN),
        ("/admin/product", &manager, StatusCode::FORBIDDEN),
        ("/admin/product", &admin, StatusCode::OK),
        ("/manager/order", &client, StatusCode::FORBIDDEN),
        ("/manager/order", &admin, StatusCode::FORBIDDEN),
        ("/manager/order", &manager, StatusCode::OK),
        ("/client/order", &manager, StatusCode::FORBIDDEN),
        ("/client/order", &admin, StatusCode::FORBIDDEN),
        ("/client/order", &client, StatusCode::OK),
    ];

    for (uri, token, expected) in cases {
        let (status, body) = app.send(get(uri, Some(token.as_str()))).await;
        assert_eq!(status, expected, "{uri}");
        if expected == StatusCode::FORBIDDEN {
            assert_eq!(body["message"], "access denied");
        }
    }

    assert_eq!(app.admin.calls().len(), 1);
    assert_eq!(app.manager.calls().len(), 1);
    assert_eq!(app.customer.calls().len(), 1);
}

#[tokio::test]
async fn test_preflight_skips_gate() {
    let app = TestApp::new().await;

    let (status, _) = app
        .send(request("OPTIONS", "/admin/product", None, None))
        .await;

    assert_ne!(status, StatusCode::UNAUTHORIZED);
    assert!(app.admin.calls().is_empty());
}
