#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the blackout map application.
//!
//! Exposes the outage store over a small JSON API under `/api`: the
//! filtered outage list for a day, a single outage by id, the GeoJSON
//! marker layer, per-category statistics, address detail, address
//! autocomplete and the district list. Every endpoint is a thin view over
//! one shared [`OutageStore`], answering for the day and building named in
//! its own request; the store talks to the upstream outage backend.

mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use blackout_map_gateway::{ConfigError, GatewayConfig, GatewayError, HttpGateway};
use blackout_map_store::{FileDateStore, OutageStore};
use thiserror::Error;

/// Default bind address when `BIND_ADDR` is unset.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";

/// Default port when `PORT` is unset or invalid.
pub const DEFAULT_PORT: u16 = 8080;

/// Errors from starting the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Gateway configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The HTTP client could not be built.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Binding or serving failed.
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared application state.
pub struct AppState {
    /// The outage store every handler reads from.
    pub store: Arc<OutageStore>,
}

/// Builds the production store: HTTP gateway from the environment's
/// configuration, selected date persisted to the state file.
///
/// # Errors
///
/// * If the gateway configuration cannot be loaded
/// * If the HTTP client cannot be built
pub fn store_from_env() -> Result<Arc<OutageStore>, ServerError> {
    let config = GatewayConfig::load()?;
    log::info!("Using outage backend at {}", config.base_url);
    let gateway = HttpGateway::new(config)?;
    let dates = FileDateStore::from_env();
    log::debug!("Persisting selected date to {}", dates.path().display());
    Ok(Arc::new(OutageStore::new(
        Arc::new(gateway),
        Arc::new(dates),
    )))
}

/// Reads `BIND_ADDR` and `PORT`, falling back to `127.0.0.1:8080`.
#[must_use]
pub fn bind_from_env() -> (String, u16) {
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    (bind_addr, port)
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/outages", web::get().to(handlers::outages))
            .route("/outages/{id}", web::get().to(handlers::outage_by_id))
            .route("/map", web::get().to(handlers::map))
            .route("/stats", web::get().to(handlers::stats))
            .route("/address/{building_id}", web::get().to(handlers::address))
            .route("/suggestions", web::get().to(handlers::suggestions))
            .route("/districts", web::get().to(handlers::districts)),
    );
}

/// Serves `store` on `bind_addr:port` until shut down.
///
/// This is a regular async function; the caller provides the runtime
/// (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// * If the HTTP server fails to bind or encounters a runtime error
#[allow(clippy::future_not_send)]
pub async fn run_server(
    store: Arc<OutageStore>,
    bind_addr: String,
    port: u16,
) -> std::io::Result<()> {
    let state = web::Data::new(AppState { store });

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

/// Builds the store and bind address from the environment and serves.
///
/// # Errors
///
/// * If the store cannot be built
/// * If the server fails to bind or run
#[allow(clippy::future_not_send)]
pub async fn serve_from_env() -> Result<(), ServerError> {
    let store = store_from_env()?;
    let (bind_addr, port) = bind_from_env();
    run_server(store, bind_addr, port).await?;
    Ok(())
}
