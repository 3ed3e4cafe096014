//! HTTP interface for tempseries.
//!
//! Routes are mounted under `/api/temperature-records`, plus `/health`.
//! Responses use a `{ success, data, message?, count? }` envelope; errors
//! use `{ success: false, message, error? }`.

pub mod error;
pub mod handlers;

use std::net::SocketAddr;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::service::RecordService;

pub use self::error::ApiError;

/// Build the API router.
pub fn router(service: RecordService, config: &ServerConfig) -> Router {
    let cors = if config.cors_enabled {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/temperature-records",
            get(handlers::list_records).post(handlers::create_record),
        )
        .route(
            "/api/temperature-records/stats/summary",
            get(handlers::summary),
        )
        .route(
            "/api/temperature-records/{id}",
            get(handlers::get_record)
                .put(handlers::update_record)
                .delete(handlers::delete_record),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(service)
}

/// Serve the API on `addr` until Ctrl-C.
///
/// # Errors
///
/// Returns [`Error::Bind`] if the listener cannot be bound, or an I/O error
/// if the server fails while running.
pub async fn serve(service: RecordService, config: &ServerConfig, addr: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| Error::Bind { addr, source })?;
    let local_addr = listener.local_addr()?;
    info!("Listening on http://{}", local_addr);

    axum::serve(listener, router(service, config))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
