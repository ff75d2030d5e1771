//! HTTP handlers and route configuration.

mod auth;
mod health;
mod posts;

use actix_files::Files;
use actix_web::http::{StatusCode, header};
use actix_web::{HttpResponse, cookie::Cookie, web};
use folio_shared::ErrorResponse;

use crate::middleware::error::error_page;
use crate::observability::RequestId;
use crate::state::AppState;

/// Register the state, the public storage mount and every route.
pub fn configure_app(state: AppState) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        let storage = state.storage.clone();
        cfg.app_data(web::Data::new(state));

        // An absolute STORAGE_URL means files are served by something else.
        if storage.public_url.starts_with('/') {
            cfg.service(Files::new(&storage.public_url, storage.root));
        }

        configure_routes(cfg);
    }
}

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(home))
        .route("/health", web::get().to(health::health_check))
        .route("/login", web::get().to(auth::login_form))
        .route("/login", web::post().to(auth::login))
        .route("/logout", web::post().to(auth::logout))
        .service(
            web::scope("/posts")
                .route("", web::get().to(posts::index))
                .route("", web::post().to(posts::store))
                .route("/create", web::get().to(posts::create))
                .route("/{id}", web::get().to(posts::show))
                .route("/{id}", web::put().to(posts::update))
                .route("/{id}", web::patch().to(posts::update))
                .route("/{id}", web::post().to(posts::update))
                .route("/{id}", web::delete().to(posts::destroy))
                .route("/{id}/edit", web::get().to(posts::edit))
                .route("/{id}/delete", web::post().to(posts::destroy)),
        );
}

/// Fallback for unmatched routes.
pub async fn not_found(request_id: RequestId) -> HttpResponse {
    error_page(
        StatusCode::NOT_FOUND,
        ErrorResponse::not_found("The page you are looking for does not exist.")
            .with_request_id(request_id.as_str()),
    )
}

async fn home() -> HttpResponse {
    see_other("/posts", None)
}

/// `303 See Other` to `location`, optionally setting a cookie.
pub(crate) fn see_other(location: &str, cookie: Option<Cookie<'static>>) -> HttpResponse {
    let mut response = HttpResponse::SeeOther();
    response.insert_header((header::LOCATION, location));
    if let Some(cookie) = cookie {
        response.cookie(cookie);
    }
    response.finish()
}
