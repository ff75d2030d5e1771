//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod cache;
mod repository;
mod storage;

pub use auth::{AuthError, PasswordService, TokenClaims, TokenService};
pub use cache::{Cache, CacheError};
pub use repository::{PostRepository, UserRepository};
pub use storage::{FileStorage, StorageError};

#[cfg(test)]
pub use repository::MockPostRepository;
#[cfg(test)]
pub use storage::MockFileStorage;
