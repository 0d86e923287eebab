//! CareBridge server - access control and attribution for shared care
//! workspaces
//!
//! Runs migrations against the configured database and serves the REST API.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use carebridge_api::{ApiServer, ApiServerConfig};

/// CareBridge - care-coordination workspace server
#[derive(Parser, Debug)]
#[command(name = "carebridge")]
#[command(about = "CareBridge - care-coordination workspace server")]
#[command(version)]
struct Cli {
    /// Database connection URL (sqlite or postgres)
    #[arg(long, env = "CAREBRIDGE_DATABASE_URL", default_value = "sqlite://carebridge.db?mode=rwc")]
    database_url: String,

    /// Address to bind the API server
    #[arg(long, env = "CAREBRIDGE_BIND", default_value = "127.0.0.1:8080")]
    bind: SocketAddr,

    /// Secret for signing session tokens
    #[arg(long, env = "CAREBRIDGE_JWT_SECRET")]
    jwt_secret: String,

    /// Allow self-service registration
    #[arg(long, env = "CAREBRIDGE_ALLOW_SIGNUP")]
    allow_signup: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Setup logging with the specified log level
fn setup_logging(verbose: bool) {
    let log_level = if verbose { "debug" } else { "info" };

    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    info!("CareBridge starting...");

    let db = carebridge_db::connect(&cli.database_url)
        .await
        .context("Failed to connect to database")?;
    carebridge_db::migrate(&db)
        .await
        .context("Failed to run migrations")?;

    let config = ApiServerConfig {
        bind_addr: cli.bind,
        enable_cors: true,
        jwt_secret: cli.jwt_secret,
        allow_signup: cli.allow_signup,
    };

    ApiServer::new(config, db).start().await
}
