pub mod auth;
pub mod config;
pub mod err;
pub mod models;
pub mod service;
pub mod store;
pub mod students;

use std::sync::Arc;

use anyhow::Context;
use axum::handler::Handler;
use axum::http::{header, Method};
use axum::routing::{delete, get, post};
use axum::{Extension, Router};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{Any, CorsLayer};

use crate::auth::{IdentityProvider, PermissiveProvider};
use crate::config::Config;
use crate::service::IdentityService;
use crate::store::PgStore;

/// The admin console is served from its own origin.
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
}

pub fn app(service: Arc<IdentityService>, provider: Arc<dyn IdentityProvider>) -> Router {
    Router::new()
        .route("/api/register", post(students::register_student))
        .route("/api/students", get(students::list_students))
        .route("/api/students/:id", delete(students::delete_student))
        .route("/api/verify/*identifier", get(students::verify_identity))
        .route("/api/departments", get(students::list_departments))
        .route("/api/login", post(auth::login_operator))
        .fallback(err::handler404.into_service())
        .layer(Extension(service))
        .layer(Extension(provider))
        .layer(cors())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("Could not listen for shutdown signal: {}", err);
    }
    log::info!("Shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = Config::from_env()?;

    let pg = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(config.connect_options()?)
        .await
        .context("could not connect to the student identity database")?;

    let service = Arc::new(IdentityService::new(Arc::new(PgStore::new(pg.clone()))));
    let app = app(service, Arc::new(PermissiveProvider));

    log::info!(
        "Starting student identity HTTP Server on http://{}",
        config.bind_addr
    );
    axum::Server::bind(&config.bind_addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pg.close().await;
    Ok(())
}
