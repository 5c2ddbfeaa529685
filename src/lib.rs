pub mod api;
pub mod auth;
pub mod cli;
pub mod db;
pub mod jwt;
pub mod password;
pub mod rpc;
pub mod session;

use api::{Envelope, create_api_router};
use auth::{AuthenticatedUser, require_bearer};
use axum::{Json, Router, middleware, routing::get};
use db::Database;
use jwt::TokenCodec;
use rpc::SharedChannel;
use rpc::admin::AdminClient;
use rpc::customer::CustomerClient;
use rpc::manager::ManagerClient;
use session::{ResetMailer, SessionService};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use url::Url;

/// Channels to the three backend domains.
#[derive(Clone)]
pub struct Backends {
    pub admin: SharedChannel,
    pub customer: SharedChannel,
    pub manager: SharedChannel,
}

pub struct ServerConfig {
    /// Credential store (cloneable, uses connection pool internally)
    pub db: Database,
    /// Secret for signing session tokens
    pub jwt_secret: Vec<u8>,
    /// Access token lifetime in seconds. Refresh tokens always last 30 days.
    pub access_token_duration: u64,
    pub backends: Backends,
    /// Delivers password-reset links
    pub mailer: Arc<dyn ResetMailer>,
    /// Front-end page that receives the reset token
    pub reset_link_base: Url,
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    let tokens = Arc::new(TokenCodec::new(
        &config.jwt_secret,
        config.access_token_duration,
    ));

    let customers = CustomerClient::new(config.backends.customer.clone());
    let sessions = Arc::new(SessionService::new(
        config.db.clone(),
        tokens.clone(),
        customers.clone(),
        config.mailer.clone(),
        config.reset_link_base.clone(),
    ));

    let api_router = create_api_router(
        sessions,
        AdminClient::new(config.backends.admin.clone()),
        customers,
        ManagerClient::new(config.backends.manager.clone()),
    );

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/v", get(validate_token))
        .merge(api_router)
        .layer(middleware::from_fn_with_state(tokens, require_bearer))
}

/// Quick check that the presented access token is accepted.
async fn validate_token(_user: AuthenticatedUser) -> Json<Envelope<()>> {
    Json(Envelope::message("token is valid"))
}

/// Run the server on the given listener until ctrl-c.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}
