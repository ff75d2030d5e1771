//! Application state - shared across all handlers.

use std::sync::Arc;

use folio_core::PostWorkflow;
use folio_core::domain::User;
use folio_core::error::RepoError;
use folio_core::ports::{
    AuthError, FileStorage, PasswordService, PostRepository, TokenService, UserRepository,
};
use folio_infra::{
    Argon2PasswordService, DatabaseConnections, InMemoryCache, InMemoryPostRepository,
    InMemoryUserRepository, JwtConfig, JwtTokenService, LocalFileStorage,
};

#[cfg(feature = "postgres")]
use folio_infra::{PostgresPostRepository, PostgresUserRepository};

use crate::config::{AppConfig, StorageConfig};
use crate::flash::FlashStore;

/// Failures while assembling the state at startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("storage root unavailable: {0}")]
    Storage(#[from] std::io::Error),

    #[error(transparent)]
    Repository(#[from] RepoError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: PostWorkflow,
    pub users: Arc<dyn UserRepository>,
    pub flash: FlashStore,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub storage: StorageConfig,
    pub secure_cookies: bool,
    pub db: Option<Arc<DatabaseConnections>>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Result<Self, StartupError> {
        let (db, posts, users) = repositories(config).await;
        let passwords = Argon2PasswordService::with_memory_cost(config.argon2_memory_kib)?;

        let state = Self::assemble(
            posts,
            users,
            Arc::new(passwords),
            &config.storage,
            config.jwt.clone(),
            config.upload_max_bytes(),
            config.secure_cookies,
        )?;

        tracing::info!("Application state initialized");
        Ok(Self { db, ..state })
    }

    /// State backed entirely by memory, apart from files under `storage.root`.
    pub fn in_memory(
        storage: &StorageConfig,
        jwt: JwtConfig,
        upload_max_bytes: usize,
    ) -> Result<Self, StartupError> {
        Self::assemble(
            Arc::new(InMemoryPostRepository::new()),
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(Argon2PasswordService::new()),
            storage,
            jwt,
            upload_max_bytes,
            false,
        )
    }

    fn assemble(
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
        passwords: Arc<dyn PasswordService>,
        storage: &StorageConfig,
        jwt: JwtConfig,
        upload_max_bytes: usize,
        secure_cookies: bool,
    ) -> Result<Self, StartupError> {
        let files: Arc<dyn FileStorage> = Arc::new(LocalFileStorage::new(
            storage.root.clone(),
            storage.public_url.clone(),
        )?);

        Ok(Self {
            posts: PostWorkflow::new(posts, files, upload_max_bytes),
            users,
            flash: FlashStore::new(Arc::new(InMemoryCache::new())),
            tokens: Arc::new(JwtTokenService::new(jwt)),
            passwords,
            storage: storage.clone(),
            secure_cookies,
            db: None,
        })
    }

    /// Create the account when no user with this email exists.
    /// Returns whether a user was created.
    pub async fn bootstrap_admin(&self, email: &str, password: &str) -> Result<bool, StartupError> {
        if self.users.find_by_email(email).await?.is_some() {
            tracing::debug!("Admin account already present");
            return Ok(false);
        }

        let hash = self.passwords.hash(password)?;
        let user = self.users.create(User::new(email.to_string(), hash)).await?;
        tracing::info!(user_id = %user.id, "Created admin account");
        Ok(true)
    }
}

type Repositories = (
    Option<Arc<DatabaseConnections>>,
    Arc<dyn PostRepository>,
    Arc<dyn UserRepository>,
);

fn in_memory_repositories() -> Repositories {
    (
        None,
        Arc::new(InMemoryPostRepository::new()),
        Arc::new(InMemoryUserRepository::new()),
    )
}

#[cfg(feature = "postgres")]
async fn repositories(config: &AppConfig) -> Repositories {
    let Some(db_config) = config.database.as_ref() else {
        tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
        return in_memory_repositories();
    };

    match DatabaseConnections::init(db_config).await {
        Ok(connections) => {
            let conn = Arc::new(connections);
            let posts = Arc::new(PostgresPostRepository::new(conn.main.clone()));
            let users = Arc::new(PostgresUserRepository::new(conn.main.clone()));
            (Some(conn), posts, users)
        }
        Err(e) => {
            tracing::error!(
                "Failed to connect to database: {}. Using in-memory fallback.",
                e
            );
            in_memory_repositories()
        }
    }
}

#[cfg(not(feature = "postgres"))]
async fn repositories(_config: &AppConfig) -> Repositories {
    tracing::info!("Running without postgres feature - using in-memory repositories");
    in_memory_repositories()
}
