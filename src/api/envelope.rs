//! Response envelope and API error type.
//!
//! Every response body is `{success, message?, data?, details?}`. Failures of
//! the caller's request (bad input, domain errors from the session service or
//! a backend) use HTTP 200 with `success = false`; only gateway faults and
//! unreachable backends change the transport status.

use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::rpc::{Reply, RpcError};
use crate::session::SessionError;

#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T = Reply> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl<T> Envelope<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            details: None,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
            details: None,
        }
    }

    pub fn failure(message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
            details,
        }
    }
}

pub type ApiResult<T = Reply> = Result<Json<Envelope<T>>, ApiError>;

pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(Envelope::data(data)))
}

pub fn done(message: impl Into<String>) -> ApiResult<()> {
    Ok(Json(Envelope::message(message)))
}

#[derive(Debug)]
pub enum ApiError {
    /// Request could not be bound or a required field is missing.
    Validation {
        message: &'static str,
        details: String,
    },
    /// The operation was refused by the session service or a backend.
    Domain {
        message: &'static str,
        details: String,
    },
    Internal,
    Unavailable(String),
}

impl ApiError {
    pub fn validation(message: &'static str, details: impl Into<String>) -> Self {
        Self::Validation {
            message,
            details: details.into(),
        }
    }

    pub fn domain(message: &'static str, details: impl Into<String>) -> Self {
        Self::Domain {
            message,
            details: details.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation("failed to read json", rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::validation("invalid path parameter", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation("invalid query parameter", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation { message, details } | ApiError::Domain { message, details } => {
                (StatusCode::OK, Envelope::<()>::failure(message, Some(details)))
            }
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Envelope::failure("internal error", None),
            ),
            ApiError::Unavailable(details) => (
                StatusCode::BAD_GATEWAY,
                Envelope::failure("backend unavailable", Some(details)),
            ),
        };
        (status, Json(body)).into_response()
    }
}

/// Concise error mapping for handler results. `message` names the failed
/// operation; the underlying error becomes `details`.
pub trait ResultExt<T> {
    fn or_fail(self, message: &'static str) -> Result<T, ApiError>;
}

impl<T> ResultExt<T> for Result<T, RpcError> {
    fn or_fail(self, message: &'static str) -> Result<T, ApiError> {
        self.map_err(|e| match e {
            RpcError::Unavailable(details) => {
                error!(error = %details, "{}", message);
                ApiError::Unavailable(details)
            }
            RpcError::Codec(details) => {
                error!(error = %details, "{}", message);
                ApiError::Internal
            }
            RpcError::Status { message: details, .. } => ApiError::domain(message, details),
        })
    }
}

impl<T> ResultExt<T> for Result<T, SessionError> {
    fn or_fail(self, message: &'static str) -> Result<T, ApiError> {
        self.map_err(|e| {
            if e.is_internal() {
                error!(error = %e, "{}", message);
                ApiError::Internal
            } else {
                warn!(error = %e, "{}", message);
                ApiError::domain(message, e.to_string())
            }
        })
    }
}

/// JSON body whose rejections render as validation failures.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// Path parameters whose rejections render as validation failures.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct PathParams<T>(pub T);

/// Query parameters whose rejections render as validation failures.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);
