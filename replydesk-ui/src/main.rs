//! replydesk-ui - Review reply management panel
//!
//! Serves the login-protected web UI for editing, posting, deleting and
//! exporting AI-generated review replies stored in a JSON file.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use replydesk_common::config::{hash_password, ConfigResolver};
use replydesk_ui::{build_router, AppState};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for replydesk-ui
#[derive(Parser, Debug)]
#[command(name = "replydesk-ui")]
#[command(about = "Review reply management panel")]
#[command(version)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, env = "REPLYDESK_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "REPLYDESK_PORT")]
    port: Option<u16>,

    /// Reply records JSON file (overrides the config file)
    #[arg(short, long, env = "REPLYDESK_DATA_FILE")]
    data_file: Option<PathBuf>,

    /// Print the password_sha256 value for a password and exit
    #[arg(long, value_name = "PASSWORD")]
    hash_password: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(password) = &args.hash_password {
        println!("{}", hash_password(password));
        return Ok(());
    }

    // Config is read before tracing init because it carries the log level
    let (config_path, mut config) = ConfigResolver::new(args.config.clone())
        .load()
        .context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "replydesk_ui={level},replydesk_common={level},tower_http=info",
                    level = config.logging.level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting replydesk-ui v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match &config_path {
        Some(path) => info!("Configuration: {}", path.display()),
        None => warn!("No configuration file found, using compiled defaults"),
    }

    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(data_file) = args.data_file {
        config.data_file = data_file;
    }

    info!("Data file: {}", config.data_file.display());
    if !config.data_file.exists() {
        warn!("Data file does not exist yet; the list will be empty");
    }
    if config.users.is_empty() {
        warn!("No users configured; nobody can log in (see --hash-password)");
    } else {
        info!("{} user(s) configured", config.users.len());
    }
    if config.refresh.commands.is_empty() {
        info!("No refresh commands configured");
    }

    let state = AppState::from_config(&config);
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.bind, config.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.bind, config.port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("replydesk-ui listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
