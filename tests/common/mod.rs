#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::Value;
use sso_gateway::db::{Database, Role};
use sso_gateway::jwt::TokenCodec;
use sso_gateway::rpc::{CallContext, RpcChannel, RpcError, RpcResult};
use sso_gateway::session::{NotifyError, ResetMailer};
use sso_gateway::{Backends, ServerConfig, create_app};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use url::Url;

pub const JWT_SECRET: &[u8] = b"integration-test-secret-0123456789";
pub const ACCESS_TOKEN_DURATION: u64 = 60 * 60;

/// How a fake backend answers.
#[derive(Clone)]
pub enum Behavior {
    Reply(Value),
    Status(u16, String),
    Down,
}

/// A backend call as seen by the fake.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub user_id: Option<i64>,
    pub method: String,
    pub body: Value,
}

pub struct FakeBackend {
    behavior: Mutex<Behavior>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            behavior: Mutex::new(Behavior::Reply(serde_json::json!({}))),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set(&self, behavior: Behavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_call(&self) -> RecordedCall {
        self.calls().pop().expect("no backend call recorded")
    }
}

#[async_trait]
impl RpcChannel for FakeBackend {
    async fn unary(&self, ctx: &CallContext, method: &str, payload: Vec<u8>) -> RpcResult<Vec<u8>> {
        self.calls.lock().unwrap().push(RecordedCall {
            user_id: ctx.user_id,
            method: method.to_string(),
            body: serde_json::from_slice(&payload).unwrap(),
        });

        match self.behavior.lock().unwrap().clone() {
            Behavior::Reply(value) => Ok(serde_json::to_vec(&value).unwrap()),
            Behavior::Status(code, message) => Err(RpcError::Status { code, message }),
            Behavior::Down => Err(RpcError::Unavailable("connection refused".into())),
        }
    }
}

#[derive(Default)]
pub struct FakeMailer {
    pub sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl ResetMailer for FakeMailer {
    async fn send_reset_link(&self, login: &str, link: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((login.to_string(), link.to_string()));
        Ok(())
    }
}

pub struct TestApp {
    pub app: Router,
    pub db: Database,
    pub tokens: TokenCodec,
    pub admin: Arc<FakeBackend>,
    pub customer: Arc<FakeBackend>,
    pub manager: Arc<FakeBackend>,
    pub mailer: Arc<FakeMailer>,
}

impl TestApp {
    pub async fn new() -> Self {
        let db = Database::open(":memory:")
            .await
            .expect("Failed to open test database");
        let admin = Arc::new(FakeBackend::new());
        let customer = Arc::new(FakeBackend::new());
        let manager = Arc::new(FakeBackend::new());
        let mailer = Arc::new(FakeMailer::default());

        let config = ServerConfig {
            db: db.clone(),
            jwt_secret: JWT_SECRET.to_vec(),
            access_token_duration: ACCESS_TOKEN_DURATION,
            backends: Backends {
                admin: admin.clone(),
                customer: customer.clone(),
                manager: manager.clone(),
            },
            mailer: mailer.clone(),
            reset_link_base: Url::parse("http://front.test/reset-password").unwrap(),
        };

        Self {
            app: create_app(&config),
            db,
            tokens: TokenCodec::new(JWT_SECRET, ACCESS_TOKEN_DURATION),
            admin,
            customer,
            manager,
            mailer,
        }
    }

    /// Send a request and decode the JSON body (Null when the body is not JSON).
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    /// Access token for a fresh identity with the given role.
    pub async fn token_for(&self, login: &str, role: Role) -> (i64, String) {
        let id = self.db.users().create(login, "unused", role).await.unwrap();
        let pair = self.tokens.issue(id, role).unwrap();
        (id, pair.access_token)
    }
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    request("GET", uri, token, None)
}

pub fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    request("POST", uri, token, Some(body))
}

pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}
