//! Gate middleware, installed with `from_fn_with_state`.

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::bearer::bearer_token;
use super::errors::GateError;
use super::types::AuthenticatedUser;
use crate::db::Role;
use crate::jwt::TokenCodec;

const PUBLIC_PATHS: &[&str] = &[
    "/auth/logIn",
    "/auth/signUp",
    "/auth/refresh",
    "/auth/forgotPassword",
    "/auth/resetPassword",
    "/health",
    "/metrics",
];

const PUBLIC_PREFIXES: &[&str] = &["/swagger/"];

/// Routes reachable without an access token.
pub fn is_public_path(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path) || PUBLIC_PREFIXES.iter().any(|p| path.starts_with(p))
}

/// Request gate. Verifies the bearer access token and attaches
/// [`AuthenticatedUser`] to the request. Pre-flight requests and public routes
/// pass through untouched.
pub async fn require_bearer(
    State(tokens): State<Arc<TokenCodec>>,
    mut request: Request,
    next: Next,
) -> Result<Response, GateError> {
    if request.method() == Method::OPTIONS || is_public_path(request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let token = bearer_token(request.headers())?;
    let verified = tokens.verify_access(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        GateError::InvalidToken(e)
    })?;

    request.extensions_mut().insert(AuthenticatedUser {
        user_id: verified.subject,
        role: verified.role,
    });
    Ok(next.run(request).await)
}

/// Role gate. Must run after [`require_bearer`]; fails closed when no
/// identity is attached.
pub async fn require_role(
    State(allowed): State<&'static [Role]>,
    request: Request,
    next: Next,
) -> Result<Response, GateError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or(GateError::NoRole)?;

    if !allowed.contains(&user.role) {
        tracing::debug!(user_id = user.user_id, role = %user.role, "Role not permitted");
        return Err(GateError::InsufficientRole);
    }

    Ok(next.run(request).await)
}
