//! Session endpoints. None of these sit behind the request gate.
//!
//! - POST `/logIn`, `/signUp` - `{login, password}` -> tokens
//! - POST `/refresh` - `Authorization: Bearer <refresh token>` -> tokens
//! - POST `/forgotPassword` - `{login}` -> reset link mailed
//! - POST `/resetPassword` - `{login, password}`, login optionally base64

use axum::{
    Router,
    extract::State,
    http::HeaderMap,
    routing::post,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use std::sync::Arc;

use super::envelope::{ApiError, ApiResult, JsonBody, ResultExt, done, ok};
use crate::auth::{GateError, bearer_token};
use crate::session::{AuthOutcome, SessionService};

#[derive(Clone)]
pub struct AuthState {
    pub sessions: Arc<SessionService>,
}

pub fn router(state: AuthState) -> Router {
    Router::new()
        .route("/logIn", post(log_in))
        .route("/signUp", post(sign_up))
        .route("/refresh", post(refresh))
        .route("/forgotPassword", post(forgot_password))
        .route("/resetPassword", post(reset_password))
        .with_state(state)
}

#[derive(Deserialize)]
struct Credentials {
    #[serde(default)]
    login: String,
    #[serde(default)]
    password: String,
}

impl Credentials {
    fn validate(&self, password_field: &str) -> Result<(), ApiError> {
        if self.login.is_empty() {
            return Err(ApiError::validation("missing argument", "login is required"));
        }
        if self.password.is_empty() {
            return Err(ApiError::validation(
                "missing argument",
                format!("{password_field} is required"),
            ));
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct ForgotPasswordRequest {
    #[serde(default)]
    login: String,
}

async fn log_in(
    State(state): State<AuthState>,
    JsonBody(body): JsonBody<Credentials>,
) -> ApiResult<AuthOutcome> {
    authenticate(&state, body, false).await
}

async fn sign_up(
    State(state): State<AuthState>,
    JsonBody(body): JsonBody<Credentials>,
) -> ApiResult<AuthOutcome> {
    authenticate(&state, body, true).await
}

async fn authenticate(
    state: &AuthState,
    body: Credentials,
    is_registration: bool,
) -> ApiResult<AuthOutcome> {
    body.validate("password")?;

    let outcome = state
        .sessions
        .authenticate(&body.login, &body.password, is_registration)
        .await
        .or_fail("authorization failed")?;
    ok(outcome)
}

async fn refresh(State(state): State<AuthState>, headers: HeaderMap) -> ApiResult<AuthOutcome> {
    let token = bearer_token(&headers).map_err(|e| match e {
        GateError::MissingToken => {
            ApiError::validation("missing token", "Authorization header is required")
        }
        _ => ApiError::validation("invalid token format", "use: Bearer <token>"),
    })?;

    let outcome = state
        .sessions
        .refresh(token)
        .await
        .or_fail("failed to refresh token")?;
    ok(outcome)
}

async fn forgot_password(
    State(state): State<AuthState>,
    JsonBody(body): JsonBody<ForgotPasswordRequest>,
) -> ApiResult<()> {
    if body.login.is_empty() {
        return Err(ApiError::validation("missing argument", "login is required"));
    }

    state
        .sessions
        .request_password_reset(&body.login)
        .await
        .or_fail("failed to send reset email")?;
    done("password reset email sent")
}

async fn reset_password(
    State(state): State<AuthState>,
    JsonBody(body): JsonBody<Credentials>,
) -> ApiResult<()> {
    body.validate("new password")?;

    let login = decode_login(&body.login);
    state
        .sessions
        .reset_password(&login, &body.password)
        .await
        .or_fail("failed to reset password")?;
    done(format!("password for user {login} changed"))
}

/// Reset links carry the login base64-encoded; accept either form.
fn decode_login(raw: &str) -> String {
    BASE64
        .decode(raw)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| raw.to_string())
}
