mod admin;
mod auth;
mod client;
mod envelope;
mod manager;

use axum::{Router, middleware};
use std::sync::Arc;

use crate::auth::require_role;
use crate::db::Role;
use crate::rpc::admin::AdminClient;
use crate::rpc::customer::CustomerClient;
use crate::rpc::manager::ManagerClient;
use crate::session::SessionService;

pub use auth::AuthState;
pub use envelope::{ApiError, ApiResult, Envelope, JsonBody, PathParams, QueryParams, ResultExt};

const ADMIN: &[Role] = &[Role::Admin];
const CLIENT: &[Role] = &[Role::Client];
const MANAGER: &[Role] = &[Role::Manager];

/// Create the API router: the ungated session routes plus one role-gated
/// group per backend domain. The request gate is layered on by the caller.
pub fn create_api_router(
    sessions: Arc<SessionService>,
    admin: AdminClient,
    customers: CustomerClient,
    manager: ManagerClient,
) -> Router {
    Router::new()
        .nest("/auth", auth::router(AuthState { sessions }))
        .nest(
            "/admin",
            admin::router(admin).layer(middleware::from_fn_with_state(ADMIN, require_role)),
        )
        .nest(
            "/client",
            client::router(customers).layer(middleware::from_fn_with_state(CLIENT, require_role)),
        )
        .nest(
            "/manager",
            manager::router(manager).layer(middleware::from_fn_with_state(MANAGER, require_role)),
        )
}
