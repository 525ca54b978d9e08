//! isoview server binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use isoview_core::config::{AppConfig, DatabaseConfig};
use isoview_server::{AppState, create_router};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// isoview - isoform expression data service
#[derive(Parser, Debug)]
#[command(name = "isoviewd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "ISOVIEW_CONFIG",
        default_value = "config/isoview.toml"
    )]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("isoview v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args.config)?;
    config.validate().context("invalid configuration")?;

    isoview_server::metrics::register_metrics();
    tracing::info!("Prometheus metrics registered");

    let store = isoview_store::from_config(&config.database)
        .await
        .context("failed to initialize database")?;

    // Fail before accepting requests if the database is unreachable.
    store
        .health_check()
        .await
        .context("database health check failed")?;
    tracing::info!("Database connectivity verified");

    let state = AppState::new(config.clone(), store)
        .await
        .context("failed to read database schema")?;

    if config.gene_index.load_on_startup {
        state.index.start_background_load();
    } else {
        tracing::info!("Gene index will load on first search");
    }

    let app = create_router(state.clone());

    let addr: SocketAddr = config.server.bind.parse().context("invalid bind address")?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.cleanup().await;
    Ok(())
}

/// Load configuration from the TOML file (optional) and `ISOVIEW_` variables.
///
/// `DATABASE_URL` selects Postgres when neither source configures a database.
fn load_config(path: &str) -> Result<AppConfig> {
    let mut figment = Figment::new();
    if std::path::Path::new(path).exists() {
        tracing::info!(config_path = %path, "Loading configuration from file");
        figment = figment.merge(Toml::file(path));
    } else {
        tracing::debug!("No config file found at {}", path);
    }
    let figment = figment.merge(Env::prefixed("ISOVIEW_").split("__"));

    let mut config: AppConfig = figment
        .extract()
        .context("failed to load configuration")?;

    if figment.find_value("database").is_err() {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            tracing::info!("Using DATABASE_URL for the database connection");
            config.database = DatabaseConfig::postgres_url(url);
        }
    }
    Ok(config)
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
    }
}
