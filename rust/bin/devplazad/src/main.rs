//! `devplazad`, the DevPlaza server binary.
//!
//! Usage:
//!   devplazad -c <context-name-or-path> [--listen <addr>]
//!
//! The context name resolves to `/etc/devplaza/<name>.toml`.
//! If a path with `/` or `.` is given, it's used directly.

mod bootstrap;
mod config;
mod routes;

use clap::Parser;
use tracing::info;

use config::ServerConfig;

/// DevPlaza server.
#[derive(Parser, Debug)]
#[command(name = "devplazad", about = "DevPlaza community server")]
struct Cli {
    /// Context name or path to config file.
    #[arg(short = 'c', long = "config", required = true)]
    config: String,

    /// Listen address (overrides default 0.0.0.0:8080).
    #[arg(long = "listen", default_value = "0.0.0.0:8080")]
    listen: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    // Load server configuration.
    let config_path = ServerConfig::resolve_path(&cli.config);
    info!("Loading configuration from {}", config_path.display());
    let server_config = ServerConfig::load(&config_path)?;

    // Verify configuration is valid.
    bootstrap::verify_config(&server_config)?;

    // Open storage, seed the role catalogue and build the modules.
    let app = bootstrap::build_app(&server_config)?;

    // Start server.
    let listener = tokio::net::TcpListener::bind(&cli.listen).await?;
    info!("DevPlaza server listening on {}", cli.listen);
    axum::serve(listener, app).await?;

    Ok(())
}
