use clap::Parser;
use sso_gateway::cli::{
    Args, build_config, connect_backends, handle_create_admin, init_logging, load_jwt_secret,
    open_database, validate_url,
};
use sso_gateway::run_server;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(&args.log_format);

    let Some(jwt_secret) = load_jwt_secret(args.jwt_secret_file.as_deref()) else {
        std::process::exit(1);
    };

    let Some(reset_link_base) = validate_url("reset-link-base", &args.reset_link_base) else {
        std::process::exit(1);
    };

    let Some(db) = open_database(&args.database).await else {
        std::process::exit(1);
    };

    if let Some(login) = args.create_admin.as_deref() {
        if let Err(e) = handle_create_admin(&db, login).await {
            error!(error = %e, "Failed to create admin");
            std::process::exit(1);
        }
    }

    let Some((backends, mailer)) = connect_backends(&args) else {
        std::process::exit(1);
    };

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(address = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        });

    match listener.local_addr() {
        Ok(local_addr) => info!(address = %local_addr, "Listening"),
        Err(e) => error!(error = %e, "Failed to read local address"),
    }

    let config = build_config(
        db,
        jwt_secret,
        args.access_token_minutes,
        backends,
        mailer,
        reset_link_base,
    );

    if let Err(e) = run_server(config, listener).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
