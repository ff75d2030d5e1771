//! # Folio Web Server
//!
//! Server-rendered post management on Actix-web. Handlers stay thin: they
//! read the request, call the [`PostWorkflow`](folio_core::PostWorkflow) and
//! turn its outcome into a redirect or a page.

pub mod config;
pub mod flash;
pub mod handlers;
pub mod middleware;
pub mod multipart;
pub mod observability;
pub mod state;
pub mod telemetry;
pub mod views;

pub use config::AppConfig;
pub use state::AppState;
