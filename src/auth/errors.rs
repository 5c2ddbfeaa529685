//! Gate rejections.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::api::Envelope;
use crate::jwt::TokenError;

#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("authorization header is missing")]
    MissingToken,
    #[error("authorization header must be `Bearer <token>`")]
    BadScheme,
    #[error("invalid token")]
    InvalidToken(#[source] TokenError),
    /// No identity on the request: the role gate ran without the request gate.
    #[error("role is not set")]
    NoRole,
    #[error("access denied")]
    InsufficientRole,
}

impl GateError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GateError::MissingToken | GateError::BadScheme | GateError::InvalidToken(_) => {
                StatusCode::UNAUTHORIZED
            }
            GateError::NoRole | GateError::InsufficientRole => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let details = match &self {
            GateError::InvalidToken(e) => Some(e.to_string()),
            _ => None,
        };
        let body = Envelope::<()>::failure(self.to_string(), details);
        (self.status_code(), Json(body)).into_response()
    }
}
