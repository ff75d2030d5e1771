//! # Folio Infrastructure
//!
//! Concrete implementations of the ports defined in `folio-core`.
//! Database repositories, file storage, caching and authentication.
//!
//! ## Feature Flags
//!
//! - `postgres` (default) - PostgreSQL repositories via SeaORM
//! - `minimal` - No external database, in-memory repositories only

pub mod auth;
pub mod cache;
pub mod database;
pub mod memory;
pub mod storage;

pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
pub use cache::InMemoryCache;
pub use database::{DatabaseConfig, DatabaseConnections};
pub use memory::{InMemoryPostRepository, InMemoryUserRepository};
pub use storage::LocalFileStorage;

#[cfg(feature = "postgres")]
pub use database::{PostgresPostRepository, PostgresUserRepository};
