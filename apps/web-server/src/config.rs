//! Application configuration loaded from environment variables.

use std::path::PathBuf;
use std::str::FromStr;

use folio_infra::{DatabaseConfig, JwtConfig};

/// Where uploaded files live on disk and where they are served from.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub root: PathBuf,
    /// URL prefix the storage root is mounted at, without a trailing slash.
    pub public_url: String,
}

/// Account created at startup when it does not exist yet.
#[derive(Debug, Clone)]
pub struct AdminAccount {
    pub email: String,
    pub password: String,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    pub storage: StorageConfig,
    pub upload_max_kb: usize,
    pub secure_cookies: bool,
    pub admin: Option<AdminAccount>,
    pub jwt: JwtConfig,
    /// Argon2 memory cost for new password hashes.
    pub argon2_memory_kib: u32,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key/value source. Unset or unparsable
    /// values fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let database = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .map(|url| DatabaseConfig {
                url,
                max_connections: parsed(&lookup, "DB_MAX_CONNECTIONS").unwrap_or(10),
                min_connections: parsed(&lookup, "DB_MIN_CONNECTIONS").unwrap_or(1),
            });

        let public_url = lookup("STORAGE_URL").unwrap_or_else(|| "/storage".to_string());
        let storage = StorageConfig {
            root: lookup("STORAGE_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("storage/app/public")),
            public_url: public_url.trim_end_matches('/').to_string(),
        };

        let admin = match (lookup("ADMIN_EMAIL"), lookup("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Some(AdminAccount { email, password })
            }
            _ => None,
        };

        Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parsed(&lookup, "PORT").unwrap_or(8080),
            database,
            storage,
            upload_max_kb: parsed(&lookup, "UPLOAD_MAX_KB").unwrap_or(2048),
            secure_cookies: lookup("SESSION_SECURE_COOKIE")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
                .unwrap_or(false),
            admin,
            jwt: JwtConfig::from_lookup(&lookup),
            argon2_memory_kib: parsed(&lookup, "ARGON2_MEMORY_KIB").unwrap_or(19 * 1024),
        }
    }

    pub fn upload_max_bytes(&self) -> usize {
        self.upload_max_kb.saturating_mul(1024)
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|value| value.trim().parse().ok())
}
