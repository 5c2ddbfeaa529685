//! `Authorization: Bearer <token>` parsing.

use axum::http::{HeaderMap, header::AUTHORIZATION};

use super::errors::GateError;

const SCHEME: &str = "Bearer";

/// Extract the token from the `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, GateError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(GateError::MissingToken)?
        .to_str()
        .map_err(|_| GateError::BadScheme)?;

    match value.split_once(' ') {
        Some((SCHEME, token)) if !token.is_empty() && !token.contains(' ') => Ok(token),
        _ => Err(GateError::BadScheme),
    }
}
