#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for Paris rent-control insights.
//!
//! Serves `GET /rent-insights`, which answers with the capped, floor and
//! average reference rent for a postal code or coordinate, and
//! `GET /health`. Queries run on Actix's blocking pool, each on its own
//! clone of the shared `DuckDB` connection.

mod config;
mod error;
mod handlers;

use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use rent_insights_database::DbError;
use rent_insights_query::InsightsConfig;

pub use config::{DEFAULT_BIND_ADDR, DEFAULT_PORT, ServerConfig};
pub use error::ApiError;

/// Errors that stop the server from starting or running.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The rent store could not be opened.
    #[error(transparent)]
    Database(#[from] DbError),

    /// Binding or serving failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Shared application state.
pub struct AppState {
    /// Handle every request clones its own connection from.
    /// `duckdb::Connection` is `Send` but not `Sync`, so a `Mutex` is needed.
    db: Mutex<duckdb::Connection>,
    /// Resolution settings, fixed at start-up.
    pub config: InsightsConfig,
}

impl AppState {
    /// Wraps an open store connection.
    #[must_use]
    pub const fn new(db: duckdb::Connection, config: InsightsConfig) -> Self {
        Self {
            db: Mutex::new(db),
            config,
        }
    }

    /// Returns a fresh connection to the shared database.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the handle is poisoned or cloning fails.
    pub fn connection(&self) -> Result<duckdb::Connection, ApiError> {
        let db = self
            .db
            .lock()
            .map_err(|_| ApiError::Internal("The store handle is poisoned.".to_string()))?;
        Ok(db.try_clone()?)
    }
}

/// Registers the API routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health))
        .route("/rent-insights", web::get().to(handlers::rent_insights));
}

/// Opens the store and serves the API until shutdown.
///
/// The caller is responsible for providing the async runtime (e.g. via
/// `#[actix_web::main]`) and for initializing logging.
///
/// # Errors
///
/// Returns [`ServerError`] if the store cannot be opened or the server
/// fails to bind.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    log::info!("Opening rent store at {}...", config.database.display());
    let conn = rent_insights_database::open(&config.database)?;

    log::info!(
        "Coordinate strategy: {}, proximity radius: {} m",
        config.insights.coordinate_strategy,
        config.insights.radius_meters
    );

    let state = web::Data::new(AppState::new(conn, config.insights));

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((config.bind_addr.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}
