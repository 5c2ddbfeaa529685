//! CLI argument parsing, validation, and startup helpers.

use std::sync::Arc;

use crate::db::{Database, Role};
use crate::password::hash_password;
use crate::rpc::HttpChannel;
use crate::session::HttpResetMailer;
use crate::{Backends, ServerConfig};
use clap::Parser;
use tracing::{error, info};
use url::Url;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MAX_ACCESS_TOKEN_MINUTES: u64 = 24 * 60;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "sso-gateway",
    about = "Authenticating HTTP gateway for the admin, customer and manager services"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "GATEWAY_PORT", default_value = "8080")]
    pub port: u16,

    /// Path to SQLite credential database (":memory:" for a throwaway store)
    #[arg(short, long, env = "GATEWAY_DATABASE", default_value = "gateway.db")]
    pub database: String,

    /// Path to file containing JWT secret. Prefer using JWT_SECRET env var instead
    #[arg(long)]
    pub jwt_secret_file: Option<String>,

    /// Access token lifetime in minutes (at most one day)
    #[arg(long, env = "ACCESS_TOKEN_MINUTES", default_value = "60",
        value_parser = clap::value_parser!(u64).range(1..=MAX_ACCESS_TOKEN_MINUTES))]
    pub access_token_minutes: u64,

    /// Administration backend address
    #[arg(long, env = "ADMIN_SERVICE_URL", default_value = "http://127.0.0.1:50051")]
    pub admin_service: String,

    /// Customer backend address
    #[arg(long, env = "CUSTOMER_SERVICE_URL", default_value = "http://127.0.0.1:50052")]
    pub customer_service: String,

    /// Fulfillment-manager backend address
    #[arg(long, env = "MANAGER_SERVICE_URL", default_value = "http://127.0.0.1:50053")]
    pub manager_service: String,

    /// Mail service base URL; reset mails go to <url>/send-reset-email
    #[arg(long, env = "NOTIFICATION_SERVICE_URL", default_value = "http://127.0.0.1:3001")]
    pub notification_url: String,

    /// Front-end page that receives the password reset token
    #[arg(
        long,
        env = "FRONTEND_RESET_URL",
        default_value = "http://localhost:3000/reset-password"
    )]
    pub reset_link_base: String,

    /// Create an administrator with this login on startup (password from ADMIN_PASSWORD)
    #[arg(long)]
    pub create_admin: Option<String>,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load JWT secret from environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
pub fn load_jwt_secret(jwt_secret_file: Option<&str>) -> Option<String> {
    let secret = if let Ok(secret) = std::env::var("JWT_SECRET") {
        // SAFETY: still single-threaded during startup; nothing else reads this variable.
        unsafe { std::env::remove_var("JWT_SECRET") };
        secret
    } else if let Some(path) = jwt_secret_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read JWT secret file");
                return None;
            }
        }
    } else {
        error!(
            "JWT secret is required. Set JWT_SECRET environment variable (recommended) or use --jwt-secret-file"
        );
        return None;
    };

    validate_jwt_secret(secret)
}

fn validate_jwt_secret(secret: String) -> Option<String> {
    if secret.len() < MIN_JWT_SECRET_LENGTH {
        error!(
            "JWT secret is shorter than {} characters. Use a longer secret",
            MIN_JWT_SECRET_LENGTH
        );
        return None;
    }
    Some(secret)
}

/// Parse an absolute http(s) URL option.
/// Returns None and logs an error if validation fails.
pub fn validate_url(name: &str, value: &str) -> Option<Url> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url),
        Ok(_) => {
            error!(option = name, url = %value, "URL must use http or https");
            None
        }
        Err(e) => {
            error!(option = name, url = %value, error = %e, "Invalid URL");
            None
        }
    }
}

/// Handle --create-admin: create the administrator unless the login exists.
pub async fn handle_create_admin(db: &Database, login: &str) -> Result<(), String> {
    let users = db.users();

    match users.get_by_login(login).await {
        Ok(Some(existing)) => {
            info!(login = %login, role = %existing.role, "Admin login already exists, skipping");
            return Ok(());
        }
        Ok(None) => {}
        Err(e) => return Err(format!("Failed to check for existing admin: {e}")),
    }

    let password = std::env::var("ADMIN_PASSWORD")
        .map_err(|_| "ADMIN_PASSWORD must be set to create an admin".to_string())?;
    if password.is_empty() {
        return Err("ADMIN_PASSWORD must not be empty".to_string());
    }

    let hash = hash_password(&password)?;
    let id = users
        .create(login, &hash, Role::Admin)
        .await
        .map_err(|e| format!("Failed to create admin user: {e}"))?;

    info!(login = %login, user_id = id, "Admin user created");
    Ok(())
}

/// Connect the backend channels and the reset mailer.
/// Returns None and logs an error if an address is invalid.
pub fn connect_backends(args: &Args) -> Option<(Backends, HttpResetMailer)> {
    let channel = |name: &str, addr: &str| match HttpChannel::new(addr) {
        Ok(channel) => {
            info!(backend = name, address = %addr, "Backend configured");
            Some(Arc::new(channel) as crate::rpc::SharedChannel)
        }
        Err(e) => {
            error!(backend = name, address = %addr, error = %e, "Failed to configure backend");
            None
        }
    };

    let backends = Backends {
        admin: channel("admin", &args.admin_service)?,
        customer: channel("customer", &args.customer_service)?,
        manager: channel("manager", &args.manager_service)?,
    };

    let mailer = match HttpResetMailer::new(&args.notification_url) {
        Ok(mailer) => mailer,
        Err(e) => {
            error!(error = %e, "Failed to configure mail service");
            return None;
        }
    };

    Some((backends, mailer))
}

/// Build ServerConfig from validated arguments.
pub fn build_config(
    db: Database,
    jwt_secret: String,
    access_token_minutes: u64,
    backends: Backends,
    mailer: HttpResetMailer,
    reset_link_base: Url,
) -> ServerConfig {
    ServerConfig {
        db,
        jwt_secret: jwt_secret.into_bytes(),
        access_token_duration: access_token_minutes * 60,
        backends,
        mailer: Arc::new(mailer),
        reset_link_base,
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["sso-gateway"]);

        assert_eq!(args.access_token_minutes, 60);
        assert!(args.create_admin.is_none());
        assert_eq!(args.notification_url, "http://127.0.0.1:3001");
    }

    #[test]
    fn test_token_minutes_bounds() {
        assert!(Args::try_parse_from(["sso-gateway", "--access-token-minutes", "0"]).is_err());
        assert!(Args::try_parse_from(["sso-gateway", "--access-token-minutes", "1441"]).is_err());
        assert!(
            Args::try_parse_from(["sso-gateway", "--access-token-minutes", "18446744073709551615"])
                .is_err()
        );

        let args = Args::try_parse_from(["sso-gateway", "--access-token-minutes", "1440"]).unwrap();
        assert_eq!(args.access_token_minutes, MAX_ACCESS_TOKEN_MINUTES);
    }

    #[test]
    fn test_short_secret_rejected() {
        assert!(validate_jwt_secret("short".to_string()).is_none());
        assert!(validate_jwt_secret("x".repeat(MIN_JWT_SECRET_LENGTH)).is_some());
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("reset-link-base", "http://localhost:3000/reset").is_some());
        assert!(validate_url("reset-link-base", "ftp://example.com").is_none());
        assert!(validate_url("reset-link-base", "not a url").is_none());
    }

    #[tokio::test]
    async fn test_create_admin_skips_existing_login() {
        let db = Database::open(":memory:").await.unwrap();
        db.users().create("root@x.com", "hash", Role::Client).await.unwrap();

        handle_create_admin(&db, "root@x.com").await.unwrap();

        let user = db.users().get_by_login("root@x.com").await.unwrap().unwrap();
        assert_eq!(user.role, Role::Client);
    }
}
