use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ugc_blog::auth::{run_cleanup_worker, CleanupConfig};
use ugc_blog::config::Config;
use ugc_blog::db::Database;
use ugc_blog::web;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing()?;

    info!("Starting ugc-blog");

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!(
        port = config.web_port,
        client_origin = %config.client_origin,
        "Configuration loaded"
    );

    if config.google_client_id.is_none() || config.google_client_secret.is_none() {
        warn!("GOOGLE_CLIENT_ID/GOOGLE_CLIENT_SECRET not set - Google sign-in will fail");
    }
    if !config.hashtag_fallback_enabled {
        info!("Hashtag fallback disabled - search failures are returned as 502");
    }

    if let Some(parent) = config.database_path.parent() {
        tokio::fs::create_dir_all(parent).await.with_context(|| {
            format!("Failed to create database directory: {}", parent.display())
        })?;
    }

    let db = Database::new(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    info!("Database initialized");

    let shutdown = CancellationToken::new();

    let cleanup_config = CleanupConfig {
        interval: config.login_cleanup_interval,
        ..CleanupConfig::default()
    };
    let cleanup_handle = tokio::spawn(run_cleanup_worker(
        db.pool().clone(),
        cleanup_config,
        shutdown.clone(),
    ));

    let web_handle = tokio::spawn(async move {
        if let Err(e) = web::serve(config, db).await {
            error!("Web server error: {e:#}");
        }
    });

    shutdown_signal().await;

    info!("Shutting down...");

    shutdown.cancel();
    web_handle.abort();
    if let Err(e) = cleanup_handle.await {
        warn!("Cleanup worker did not stop cleanly: {e}");
    }

    info!("Shutdown complete");

    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,ugc_blog=debug"));

    // Check if JSON logging is requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    if use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
