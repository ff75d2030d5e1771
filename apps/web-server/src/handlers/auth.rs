//! Login and logout.

use std::collections::BTreeMap;

use actix_web::http::{StatusCode, header};
use actix_web::{HttpRequest, HttpResponse, web};

use folio_core::Notice;
use folio_core::validation::{FieldErrors, required_message};
use folio_shared::dto::LoginRequest;

use crate::flash::Flash;
use crate::middleware::auth::{
    LOGIN_PATH, OptionalIdentity, session_cookie, session_removal_cookie,
};
use crate::middleware::error::AppResult;
use crate::state::AppState;
use crate::views::{LayoutView, LoginTemplate, field_errors, page};

use super::see_other;

const FAILED: &str = "These credentials do not match our records.";

/// GET /login
pub async fn login_form(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: OptionalIdentity,
) -> AppResult<HttpResponse> {
    if identity.0.is_some() {
        return Ok(see_other("/posts", None));
    }

    let flash = state.flash.take(&req).await;
    let template = LoginTemplate::new(LayoutView::new("Log in", None, &flash), &flash);
    page(&req, StatusCode::OK, &template)
}

/// POST /login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Form<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let email = req.email.trim().to_string();

    if email.is_empty() || req.password.is_empty() {
        let field = if email.is_empty() { "email" } else { "password" };
        return back_to_login(&state, field_errors(field, required_message(field)), email).await;
    }

    let user = state.users.find_by_email(&email).await?;
    let verified = match &user {
        Some(user) => state.passwords.verify(&req.password, &user.password_hash)?,
        None => false,
    };

    let Some(user) = user.filter(|_| verified) else {
        tracing::info!("Failed login attempt");
        return back_to_login(&state, field_errors("email", FAILED), email).await;
    };

    let token = state.tokens.generate_token(user.id, &user.email)?;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(see_other(
        "/posts",
        Some(session_cookie(
            token,
            state.tokens.expiration_seconds(),
            state.secure_cookies,
        )),
    ))
}

/// POST /logout
pub async fn logout(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let flash = state
        .flash
        .put(&Flash::notice(Notice::info("You have been logged out.")))
        .await?;

    Ok(HttpResponse::SeeOther()
        .insert_header((header::LOCATION, LOGIN_PATH))
        .cookie(flash)
        .cookie(session_removal_cookie())
        .finish())
}

async fn back_to_login(
    state: &AppState,
    errors: FieldErrors,
    email: String,
) -> AppResult<HttpResponse> {
    let old = BTreeMap::from([("email".to_string(), email)]);
    let cookie = state.flash.put(&Flash::invalid(errors, old)).await?;
    Ok(see_other(LOGIN_PATH, Some(cookie)))
}
