//! Request-scoped identity.

use axum::{extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;

use super::errors::GateError;
use crate::db::Role;
use crate::rpc::CallContext;

/// Identity attached by the request gate after the access token verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub role: Role,
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = GateError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .copied()
            .ok_or(GateError::NoRole)
    }
}

/// Outbound call context for the current request; anonymous on ungated routes.
pub struct Caller(pub CallContext);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = parts
            .extensions
            .get::<AuthenticatedUser>()
            .map(|user| CallContext::for_user(user.user_id))
            .unwrap_or_else(CallContext::anonymous);
        Ok(Caller(ctx))
    }
}
