#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the quake map application.
//!
//! Serves the REST API for regional seismic summaries, rankings, risk
//! outlooks, and raw event listings. All data flows through a shared
//! [`ViewStateMachine`], so concurrent requests for the same feed share a
//! single upstream fetch and its cached analysis.

mod handlers;
pub mod interactive;

use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use quake_map_source::EventSource;
use quake_map_source::usgs::UsgsSource;
use quake_map_view::{DEFAULT_FETCH_TIMEOUT, ViewStateMachine};

/// Shared application state.
pub struct AppState {
    /// Per-dataset fetch/cache state.
    pub views: ViewStateMachine,
}

impl AppState {
    /// Creates state over `source`.
    #[must_use]
    pub fn new(source: Arc<dyn EventSource>, fetch_timeout: Option<Duration>) -> Self {
        Self {
            views: ViewStateMachine::with_timeout(source, fetch_timeout),
        }
    }
}

/// Server settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// `BIND_ADDR`, default `127.0.0.1`.
    pub bind_addr: String,
    /// `PORT`, default `8080`.
    pub port: u16,
    /// `FETCH_TIMEOUT_SECS`, default 30 seconds; `0` disables the timeout.
    pub fetch_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            fetch_timeout: Some(DEFAULT_FETCH_TIMEOUT),
        }
    }
}

impl ServerConfig {
    /// Reads `BIND_ADDR`, `PORT`, and `FETCH_TIMEOUT_SECS`, falling back to
    /// the defaults for anything unset or unparseable.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let bind_addr = lookup("BIND_ADDR").unwrap_or(defaults.bind_addr);
        let port = lookup("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);
        let fetch_timeout = match lookup("FETCH_TIMEOUT_SECS").map(|s| s.parse::<u64>()) {
            None => defaults.fetch_timeout,
            Some(Ok(0)) => None,
            Some(Ok(secs)) => Some(Duration::from_secs(secs)),
            Some(Err(e)) => {
                log::warn!("Ignoring invalid FETCH_TIMEOUT_SECS: {e}");
                defaults.fetch_timeout
            }
        };

        Self {
            bind_addr,
            port,
            fetch_timeout,
        }
    }
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/summary", web::get().to(handlers::summary))
            .route("/regions", web::get().to(handlers::regions))
            .route("/narrative", web::get().to(handlers::narrative))
            .route("/events", web::get().to(handlers::events))
            .route("/earthquakes", web::get().to(handlers::earthquakes))
            .route("/views/{dataset}", web::get().to(handlers::view_state))
            .route(
                "/views/{dataset}/refresh",
                web::post().to(handlers::refresh_view),
            )
            .route("/view", web::post().to(handlers::switch_view)),
    );
}

/// Starts the quake map API server against the USGS feeds.
///
/// Reads [`ServerConfig`] from the environment. This is a regular async
/// function; the caller is responsible for providing the async runtime
/// (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP client cannot be built,
/// or if the HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    let config = ServerConfig::from_env();
    let source = UsgsSource::new().map_err(std::io::Error::other)?;
    serve(Arc::new(source), config).await
}

/// Starts the API server over an arbitrary event source.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn serve(source: Arc<dyn EventSource>, config: ServerConfig) -> std::io::Result<()> {
    log::info!(
        "Serving {} events (fetch timeout: {:?})",
        source.id(),
        config.fetch_timeout
    );
    let state = web::Data::new(AppState::new(source, config.fetch_timeout));

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((config.bind_addr, config.port))?
    .run()
    .await
}
