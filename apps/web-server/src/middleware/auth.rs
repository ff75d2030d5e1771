//! Authentication extractors.
//!
//! Browsers carry their session as a JWT in the `folio_session` cookie; API
//! clients may send the same token as a Bearer header instead.

use actix_web::cookie::{Cookie, SameSite, time};
use actix_web::http::{StatusCode, header};
use actix_web::{FromRequest, HttpRequest, HttpResponse, dev::Payload, web};
use std::future::{Ready, ready};

use folio_core::ports::{AuthError, TokenClaims};
use folio_shared::ErrorResponse;

use crate::state::AppState;

pub const SESSION_COOKIE: &str = "folio_session";
pub const LOGIN_PATH: &str = "/login";

/// Authenticated user identity extractor.
///
/// Use this in handlers to require a signed-in user:
/// ```ignore
/// async fn protected_route(identity: Identity) -> impl Responder {
///     format!("Hello, {}!", identity.email)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: uuid::Uuid,
    pub email: String,
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email,
        }
    }
}

/// Error type for authentication failures.
#[derive(Debug)]
pub enum AuthenticationError {
    /// No usable browser session; send the user to the login page.
    LoginRequired,
    /// A Bearer token was presented and rejected.
    Rejected(AuthError),
}

impl std::fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthenticationError::LoginRequired => write!(f, "Login required"),
            AuthenticationError::Rejected(err) => write!(f, "{}", err),
        }
    }
}

impl actix_web::ResponseError for AuthenticationError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthenticationError::LoginRequired => StatusCode::SEE_OTHER,
            AuthenticationError::Rejected(AuthError::HashingError(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AuthenticationError::Rejected(_) => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AuthenticationError::LoginRequired => {
                return HttpResponse::SeeOther()
                    .insert_header((header::LOCATION, LOGIN_PATH))
                    .finish();
            }
            AuthenticationError::Rejected(AuthError::TokenExpired) => {
                ErrorResponse::new(401, "Token Expired")
                    .with_detail("Your session token has expired. Please login again.")
            }
            AuthenticationError::Rejected(AuthError::InvalidToken(msg)) => {
                ErrorResponse::new(401, "Invalid Token").with_detail(msg.clone())
            }
            AuthenticationError::Rejected(AuthError::HashingError(_)) => {
                ErrorResponse::internal_error()
            }
            AuthenticationError::Rejected(_) => ErrorResponse::unauthorized(),
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

fn authenticate(req: &HttpRequest) -> Result<Identity, AuthenticationError> {
    let Some(state) = req.app_data::<web::Data<AppState>>() else {
        tracing::error!("AppState not found in app data");
        return Err(AuthenticationError::Rejected(AuthError::InvalidToken(
            "Server configuration error".to_string(),
        )));
    };

    // Bearer header first: API clients get a 401 instead of a redirect.
    if let Some(value) = req.headers().get(header::AUTHORIZATION) {
        let token = value
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| {
                AuthenticationError::Rejected(AuthError::InvalidToken(
                    "Expected Bearer token".to_string(),
                ))
            })?;

        return state
            .tokens
            .validate_token(token)
            .map(Identity::from)
            .map_err(AuthenticationError::Rejected);
    }

    let cookie = req
        .cookie(SESSION_COOKIE)
        .ok_or(AuthenticationError::LoginRequired)?;

    state
        .tokens
        .validate_token(cookie.value())
        .map(Identity::from)
        .map_err(|err| {
            tracing::debug!(error = %err, "Rejected session cookie");
            AuthenticationError::LoginRequired
        })
}

impl FromRequest for Identity {
    type Error = AuthenticationError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

/// Optional identity extractor - doesn't fail if not authenticated.
pub struct OptionalIdentity(pub Option<Identity>);

impl FromRequest for OptionalIdentity {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(OptionalIdentity(authenticate(req).ok())))
    }
}

/// Session cookie carrying a freshly issued token.
pub fn session_cookie(token: String, max_age_seconds: i64, secure: bool) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age_seconds))
        .finish()
}

/// Cookie that ends the browser session.
pub fn session_removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    cookie.make_removal();
    cookie
}
