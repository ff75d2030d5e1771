//! Signed session tokens.
//!
//! The login handler issues one token per successful sign-in and stores it in
//! the session cookie. Tokens are HS256 JWTs; nothing is kept server-side, so
//! a session ends when the token expires or the cookie is cleared.

use chrono::{TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use folio_core::ports::{AuthError, TokenClaims, TokenService};

const DEFAULT_SECRET: &str = "change-me-in-production";
const DEFAULT_ISSUER: &str = "folio";
const DEFAULT_EXPIRATION_HOURS: i64 = 24;

/// Allowed clock skew when checking `exp`, in seconds.
const LEEWAY_SECS: u64 = 5;

/// Session token settings.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_SECRET.to_string(),
            expiration_hours: DEFAULT_EXPIRATION_HOURS,
            issuer: DEFAULT_ISSUER.to_string(),
        }
    }
}

impl JwtConfig {
    /// Settings from `JWT_SECRET`, `JWT_EXPIRATION_HOURS` and `JWT_ISSUER`.
    ///
    /// Running on the built-in secret is allowed but logged, loudly when
    /// `RUST_ENV` says production.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let secret = match lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None => {
                let env = lookup("RUST_ENV").unwrap_or_default();
                if matches!(env.as_str(), "production" | "prod") {
                    tracing::error!(
                        "SECURITY: JWT_SECRET is not set in production, sessions are signed with the built-in secret"
                    );
                } else {
                    tracing::warn!("JWT_SECRET not set, using the built-in development secret");
                }
                defaults.secret
            }
        };

        Self {
            secret,
            expiration_hours: lookup("JWT_EXPIRATION_HOURS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.expiration_hours),
            issuer: lookup("JWT_ISSUER").unwrap_or(defaults.issuer),
        }
    }
}

/// Wire format of a session token.
#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: Uuid,
    email: String,
    iat: i64,
    exp: i64,
    iss: String,
    /// Unique per sign-in, so two logins in the same second differ.
    jti: Uuid,
}

/// HS256 session token service.
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: TimeDelta,
    issuer: String,
}

impl JwtTokenService {
    pub fn new(config: JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation.leeway = LEEWAY_SECS;

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            lifetime: TimeDelta::hours(config.expiration_hours),
            issuer: config.issuer,
        }
    }
}

impl TokenService for JwtTokenService {
    fn generate_token(&self, user_id: Uuid, email: &str) -> Result<String, AuthError> {
        let issued_at = Utc::now();
        let claims = SessionClaims {
            sub: user_id,
            email: email.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.lifetime).timestamp(),
            iss: self.issuer.clone(),
            jti: Uuid::new_v4(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidIssuer => AuthError::InvalidToken("issuer mismatch".to_string()),
                _ => AuthError::InvalidToken(e.to_string()),
            })?;

        Ok(TokenClaims {
            user_id: data.claims.sub,
            email: data.claims.email,
            exp: data.claims.exp,
        })
    }

    fn expiration_seconds(&self) -> i64 {
        self.lifetime.num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-key".to_string(),
            expiration_hours: 1,
            issuer: "folio-test".to_string(),
        }
    }

    #[test]
    fn test_session_token_carries_user() {
        let service = JwtTokenService::new(config());
        let user_id = Uuid::new_v4();

        let token = service.generate_token(user_id, "editor@example.com").unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.email, "editor@example.com");
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn test_each_login_gets_a_distinct_token() {
        let service = JwtTokenService::new(config());
        let user_id = Uuid::new_v4();

        let first = service.generate_token(user_id, "a@example.com").unwrap();
        let second = service.generate_token(user_id, "a@example.com").unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_rejects_garbage_and_tampered_tokens() {
        let service = JwtTokenService::new(config());
        assert!(matches!(
            service.validate_token("not-a-jwt"),
            Err(AuthError::InvalidToken(_))
        ));

        let other = JwtTokenService::new(JwtConfig {
            secret: "someone-else".to_string(),
            ..config()
        });
        let forged = other.generate_token(Uuid::new_v4(), "x@example.com").unwrap();
        assert!(matches!(
            service.validate_token(&forged),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_rejects_other_issuer() {
        let ours = JwtTokenService::new(config());
        let theirs = JwtTokenService::new(JwtConfig {
            issuer: "elsewhere".to_string(),
            ..config()
        });

        let token = theirs.generate_token(Uuid::new_v4(), "x@example.com").unwrap();

        assert!(ours.validate_token(&token).is_err());
    }

    #[test]
    fn test_expired_token() {
        let service = JwtTokenService::new(JwtConfig {
            expiration_hours: -2,
            ..config()
        });

        let token = service.generate_token(Uuid::new_v4(), "x@example.com").unwrap();

        assert!(matches!(
            service.validate_token(&token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_config_from_lookup() {
        let config = JwtConfig::from_lookup(|key| match key {
            "JWT_SECRET" => Some("s3cret".to_string()),
            "JWT_EXPIRATION_HOURS" => Some("2".to_string()),
            _ => None,
        });

        assert_eq!(config.secret, "s3cret");
        assert_eq!(config.expiration_hours, 2);
        assert_eq!(config.issuer, "folio");
        assert_eq!(JwtTokenService::new(config).expiration_seconds(), 7200);
    }

    #[test]
    fn test_config_defaults_without_env() {
        let config = JwtConfig::from_lookup(|_| None);

        assert_eq!(config.secret, DEFAULT_SECRET);
        assert_eq!(config.expiration_hours, 24);
    }
}
