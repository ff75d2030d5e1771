//! # Folio Web Server
//!
//! The main entry point for the Actix-web HTTP server.

use actix_web::{App, HttpServer, web};
use anyhow::Context;
use tracing_actix_web::TracingLogger;

use web_server::handlers;
use web_server::observability::RequestIdMiddleware;
use web_server::telemetry::{TelemetryConfig, init_telemetry};
use web_server::{AppConfig, AppState};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();

    tracing::info!("Starting Folio on {}:{}", config.host, config.port);

    let state = AppState::new(&config)
        .await
        .context("failed to build application state")?;

    if let Some(admin) = &config.admin {
        state
            .bootstrap_admin(&admin.email, &admin.password)
            .await
            .context("failed to create admin account")?;
    }

    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(RequestIdMiddleware)
            .configure(handlers::configure_app(state.clone()))
            .default_service(web::to(handlers::not_found))
    })
    .bind((config.host.as_str(), config.port))
    .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?
    .run()
    .await?;

    Ok(())
}
