mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::feed::{FeedQuery, PostingPipeline, VoteLedger};
use crate::identity::IdentityClient;
use crate::store::RecordStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub identity: IdentityClient,
    pub ledger: VoteLedger,
    pub feed: FeedQuery,
    pub posting: PostingPipeline,
}

impl AppState {
    /// Build the state and its collaborator clients from configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);
        let store = RecordStore::new(&config);
        let identity = IdentityClient::new(&config);

        Self {
            ledger: VoteLedger::new(store.clone(), identity.clone(), config.clone()),
            feed: FeedQuery::new(store.clone()),
            posting: PostingPipeline::new(store, identity.clone()),
            identity,
            config,
        }
    }
}

/// Start the web server.
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn serve(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.web_host, config.web_port)
        .parse()
        .context("Invalid web server address")?;

    let state = AppState::new(config);
    let app = create_app(state);

    info!(addr = %addr, "Starting web server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind web server")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server error")?;

    Ok(())
}

/// Create the main application router.
///
/// CORS is wide open: the API is consumed by browser frontends on other
/// origins and carries no cookies (session tokens ride in request bodies).
#[must_use]
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(routes::router())
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
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
