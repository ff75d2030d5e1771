use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{NewPost, Post, PostChanges, User};
use crate::error::RepoError;

/// Post repository.
///
/// Absence is reported through the return value (`Option`/`bool`), never as
/// an error; callers decide what a missing post means for them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Find a post by its unique ID.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError>;

    /// All posts, most recently updated first.
    async fn list_recent(&self) -> Result<Vec<Post>, RepoError>;

    /// Insert a new post and return it with its assigned id and timestamps.
    async fn create(&self, post: NewPost) -> Result<Post, RepoError>;

    /// Apply changes to an existing post. `Ok(None)` if it does not exist.
    async fn update_by_id(&self, id: Uuid, changes: PostChanges)
    -> Result<Option<Post>, RepoError>;

    /// Delete a post. `Ok(false)` if nothing was deleted.
    async fn delete_by_id(&self, id: Uuid) -> Result<bool, RepoError>;
}

/// User repository with the lookups login needs.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError>;

    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    async fn create(&self, user: User) -> Result<User, RepoError>;
}
