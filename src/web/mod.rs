mod auth;
pub mod error;
mod routes;
pub mod templates;

pub use routes::HASHTAG_SOURCE_HEADER;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth::GoogleOAuth;
use crate::config::Config;
use crate::db::Database;
use crate::hashtag::HashtagClient;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<Config>,
    pub hashtag: HashtagClient,
    pub google: GoogleOAuth,
}

impl AppState {
    /// Build the state and its outbound HTTP clients.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn new(config: Config, db: Database) -> Result<Self> {
        let hashtag = HashtagClient::new(&config)?;
        let google = GoogleOAuth::new(&config)?;

        if !hashtag.is_configured() {
            info!("TWITTER_BEARER_TOKEN unset; hashtag search will fail over");
        }

        Ok(Self {
            db,
            config: Arc::new(config),
            hashtag,
            google,
        })
    }
}

/// Start the web server.
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn serve(config: Config, db: Database) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.web_host, config.web_port)
        .parse()
        .context("Invalid web server address")?;

    let state = AppState::new(config, db)?;
    let app = create_app(state)?;

    info!(addr = %addr, "Starting HTTP web server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind web server")?;

    axum::serve(listener, app)
        .await
        .context("Web server error")?;

    Ok(())
}

/// Create the main application router.
///
/// # Errors
///
/// Returns an error if the client origin is not a valid header value.
pub fn create_app(state: AppState) -> Result<Router> {
    let cors = cors_layer(&state.config.client_origin)?;

    Ok(Router::new()
        .merge(routes::router())
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Allow the browser client's origin, with credentials.
fn cors_layer(origin: &str) -> Result<CorsLayer> {
    let origin = HeaderValue::from_str(origin.trim_end_matches('/'))
        .with_context(|| format!("Invalid CLIENT_ORIGIN: {origin}"))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true))
}
