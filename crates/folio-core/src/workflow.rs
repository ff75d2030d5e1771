//! Post workflow - list, create, show, edit, update and delete posts.
//!
//! Every mutating operation follows the same line: validate, touch storage,
//! touch the repository, report. The result is either an [`Outcome`] (success
//! with a notice, or field errors) or a [`DomainError`] that ends the request.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{NewPost, Post, PostChanges};
use crate::error::DomainError;
use crate::ports::{FileStorage, PostRepository};
use crate::validation::{FieldErrors, ImageFile, PostInput, PostRules};

/// Storage directory for featured images.
pub const FEATURED_IMAGE_DIR: &str = "images/posts/featured-images";

/// A one-time message for the user after a successful operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }
}

/// Result of a mutating operation that got past lookup.
#[derive(Debug)]
pub enum Outcome<T> {
    Done { value: T, notice: Notice },
    Invalid(FieldErrors),
}

/// What the create/edit form is pre-filled with.
#[derive(Debug, Clone, Default)]
pub struct PostForm {
    pub post: Option<Post>,
    pub image_url: Option<String>,
}

/// Orchestrates the post repository and file storage.
#[derive(Clone)]
pub struct PostWorkflow {
    posts: Arc<dyn PostRepository>,
    storage: Arc<dyn FileStorage>,
    max_image_bytes: usize,
}

impl PostWorkflow {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        storage: Arc<dyn FileStorage>,
        max_image_bytes: usize,
    ) -> Self {
        Self {
            posts,
            storage,
            max_image_bytes,
        }
    }

    pub fn max_image_bytes(&self) -> usize {
        self.max_image_bytes
    }

    /// Public URL of a post's featured image.
    pub fn image_url(&self, post: &Post) -> Option<String> {
        post.featured_image
            .as_deref()
            .map(|path| self.storage.url(path))
    }

    /// All posts, most recently updated first.
    pub async fn list(&self) -> Result<Vec<Post>, DomainError> {
        Ok(self.posts.list_recent().await?)
    }

    pub fn create_form(&self) -> PostForm {
        PostForm::default()
    }

    pub async fn show(&self, id: Uuid) -> Result<Post, DomainError> {
        self.find(id).await
    }

    pub async fn edit_form(&self, id: Uuid) -> Result<PostForm, DomainError> {
        let post = self.find(id).await?;
        Ok(PostForm {
            image_url: self.image_url(&post),
            post: Some(post),
        })
    }

    pub async fn store(&self, input: PostInput) -> Result<Outcome<Post>, DomainError> {
        let valid = match input.validate(&PostRules::for_create(self.max_image_bytes)) {
            Ok(valid) => valid,
            Err(errors) => return Ok(Outcome::Invalid(errors)),
        };

        let stored = match valid.featured_image {
            Some(image) => Some(self.put_image(image).await?),
            None => None,
        };

        let created = self
            .posts
            .create(NewPost {
                title: valid.title,
                content: valid.content,
                featured_image: stored.clone(),
            })
            .await;

        match created {
            Ok(post) => {
                tracing::info!(post_id = %post.id, "Post created");
                Ok(Outcome::Done {
                    value: post,
                    notice: Notice::success("Post created successfully!"),
                })
            }
            Err(err) => {
                self.discard(stored.as_deref()).await;
                Err(err.into())
            }
        }
    }

    pub async fn update(&self, id: Uuid, input: PostInput) -> Result<Outcome<Post>, DomainError> {
        let existing = self.find(id).await?;

        let valid = match input.validate(&PostRules::for_update(self.max_image_bytes)) {
            Ok(valid) => valid,
            Err(errors) => return Ok(Outcome::Invalid(errors)),
        };

        let replacement = match valid.featured_image {
            Some(image) => {
                if let Some(old) = existing.featured_image.as_deref() {
                    self.storage.delete(old).await?;
                }
                Some(self.put_image(image).await?)
            }
            None => None,
        };

        let updated = self
            .posts
            .update_by_id(
                id,
                PostChanges {
                    title: valid.title,
                    content: valid.content,
                    featured_image: replacement.clone(),
                },
            )
            .await;

        match updated {
            Ok(Some(post)) => {
                tracing::info!(
                    post_id = %post.id,
                    image_replaced = replacement.is_some(),
                    "Post updated"
                );
                Ok(Outcome::Done {
                    value: post,
                    notice: Notice::success("Post updated successfully!"),
                })
            }
            Ok(None) => {
                self.discard(replacement.as_deref()).await;
                Err(DomainError::post_not_found(id))
            }
            Err(err) => {
                self.discard(replacement.as_deref()).await;
                Err(err.into())
            }
        }
    }

    /// Delete a post and its featured image. Nothing to validate, so the
    /// only success value is the notice.
    pub async fn destroy(&self, id: Uuid) -> Result<Notice, DomainError> {
        let post = self.find(id).await?;

        if let Some(path) = post.featured_image.as_deref() {
            self.storage.delete(path).await?;
        }

        if !self.posts.delete_by_id(id).await? {
            return Err(DomainError::post_not_found(id));
        }

        tracing::info!(post_id = %id, "Post deleted");
        Ok(Notice::success("Post deleted successfully!"))
    }

    async fn find(&self, id: Uuid) -> Result<Post, DomainError> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::post_not_found(id))
    }

    async fn put_image(&self, image: ImageFile) -> Result<String, DomainError> {
        let path = self
            .storage
            .put(FEATURED_IMAGE_DIR, image.kind.extension(), image.bytes)
            .await?;
        Ok(path)
    }

    /// Remove a file written earlier in a request that is now failing.
    async fn discard(&self, path: Option<&str>) {
        let Some(path) = path else { return };
        if let Err(err) = self.storage.delete(path).await {
            tracing::warn!(path, error = %err, "Failed to remove orphaned upload");
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use chrono::Utc;
    use mockall::predicate::eq;

    use super::*;
    use crate::error::RepoError;
    use crate::ports::{MockFileStorage, MockPostRepository};
    use crate::validation::{FEATURED_IMAGE, UploadedFile};

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    fn png() -> UploadedFile {
        UploadedFile {
            file_name: Some("cover.png".to_string()),
            content_type: Some("image/png".to_string()),
            size: PNG.len(),
            bytes: Bytes::from_static(PNG),
        }
    }

    fn input(image: Option<UploadedFile>) -> PostInput {
        PostInput {
            title: Some("A title".to_string()),
            content: Some("Some content".to_string()),
            featured_image: image,
        }
    }

    fn existing(image: Option<&str>) -> Post {
        let now = Utc::now();
        Post {
            id: Uuid::new_v4(),
            title: "Old title".to_string(),
            content: "Old content".to_string(),
            featured_image: image.map(str::to_string),
            created_at: now,
            updated_at: now,
        }
    }

    fn workflow(posts: MockPostRepository, storage: MockFileStorage) -> PostWorkflow {
        PostWorkflow::new(Arc::new(posts), Arc::new(storage), 2048)
    }

    #[tokio::test]
    async fn test_store_persists_image_then_record() {
        let mut storage = MockFileStorage::new();
        storage
            .expect_put()
            .withf(|dir, ext, _| dir == FEATURED_IMAGE_DIR && ext == "png")
            .times(1)
            .returning(|_, _, _| Ok("images/posts/featured-images/new.png".to_string()));

        let mut posts = MockPostRepository::new();
        posts
            .expect_create()
            .withf(|new| {
                new.featured_image.as_deref() == Some("images/posts/featured-images/new.png")
            })
            .times(1)
            .returning(|new| Ok(Post::new(new)));

        let outcome = workflow(posts, storage).store(input(Some(png()))).await.unwrap();

        match outcome {
            Outcome::Done { value, notice } => {
                assert_eq!(value.title, "A title");
                assert_eq!(notice.message, "Post created successfully!");
            }
            Outcome::Invalid(errors) => panic!("unexpected errors: {errors:?}"),
        }
    }

    #[tokio::test]
    async fn test_store_invalid_touches_nothing() {
        let mut storage = MockFileStorage::new();
        storage.expect_put().never();
        let mut posts = MockPostRepository::new();
        posts.expect_create().never();

        let outcome = workflow(posts, storage)
            .store(PostInput::default())
            .await
            .unwrap();

        let Outcome::Invalid(errors) = outcome else {
            panic!("expected validation failure");
        };
        assert!(errors.has("title"));
        assert!(errors.has("content"));
        assert!(errors.has(FEATURED_IMAGE));
    }

    #[tokio::test]
    async fn test_store_repository_failure_removes_written_file() {
        let mut storage = MockFileStorage::new();
        storage
            .expect_put()
            .returning(|_, _, _| Ok("images/posts/featured-images/orphan.png".to_string()));
        storage
            .expect_delete()
            .withf(|path| path == "images/posts/featured-images/orphan.png")
            .times(1)
            .returning(|_| Ok(true));

        let mut posts = MockPostRepository::new();
        posts
            .expect_create()
            .returning(|_| Err(RepoError::Query("insert failed".to_string())));

        let err = workflow(posts, storage)
            .store(input(Some(png())))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Repository(_)));
    }

    #[tokio::test]
    async fn test_update_without_image_keeps_path() {
        let post = existing(Some("images/posts/featured-images/keep.png"));
        let id = post.id;

        let mut posts = MockPostRepository::new();
        let found = post.clone();
        posts
            .expect_find_by_id()
            .with(eq(id))
            .returning(move |_| Ok(Some(found.clone())));
        posts
            .expect_update_by_id()
            .withf(|_, changes| changes.featured_image.is_none() && changes.title == "A title")
            .returning(move |_, changes| {
                let mut updated = post.clone();
                updated.apply(changes);
                Ok(Some(updated))
            });

        let mut storage = MockFileStorage::new();
        storage.expect_delete().never();
        storage.expect_put().never();

        let outcome = workflow(posts, storage).update(id, input(None)).await.unwrap();
        let Outcome::Done { value, .. } = outcome else {
            panic!("expected success");
        };
        assert_eq!(
            value.featured_image.as_deref(),
            Some("images/posts/featured-images/keep.png")
        );
    }

    #[tokio::test]
    async fn test_update_with_image_replaces_old_file() {
        let post = existing(Some("images/posts/featured-images/old.png"));
        let id = post.id;

        let mut posts = MockPostRepository::new();
        let found = post.clone();
        posts
            .expect_find_by_id()
            .returning(move |_| Ok(Some(found.clone())));
        posts.expect_update_by_id().returning(move |_, changes| {
            let mut updated = post.clone();
            updated.apply(changes);
            Ok(Some(updated))
        });

        let mut storage = MockFileStorage::new();
        storage
            .expect_delete()
            .withf(|path| path == "images/posts/featured-images/old.png")
            .times(1)
            .returning(|_| Ok(true));
        storage
            .expect_put()
            .times(1)
            .returning(|_, _, _| Ok("images/posts/featured-images/new.png".to_string()));

        let outcome = workflow(posts, storage)
            .update(id, input(Some(png())))
            .await
            .unwrap();
        let Outcome::Done { value, notice } = outcome else {
            panic!("expected success");
        };
        assert_eq!(
            value.featured_image.as_deref(),
            Some("images/posts/featured-images/new.png")
        );
        assert_eq!(notice.message, "Post updated successfully!");
    }

    #[tokio::test]
    async fn test_update_missing_post_is_not_found_before_validation() {
        let mut posts = MockPostRepository::new();
        posts.expect_find_by_id().returning(|_| Ok(None));
        posts.expect_update_by_id().never();

        let err = workflow(posts, MockFileStorage::new())
            .update(Uuid::new_v4(), PostInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_destroy_removes_file_and_record() {
        let post = existing(Some("images/posts/featured-images/gone.png"));
        let id = post.id;

        let mut posts = MockPostRepository::new();
        posts
            .expect_find_by_id()
            .returning(move |_| Ok(Some(post.clone())));
        posts
            .expect_delete_by_id()
            .with(eq(id))
            .times(1)
            .returning(|_| Ok(true));

        let mut storage = MockFileStorage::new();
        storage
            .expect_delete()
            .withf(|path| path == "images/posts/featured-images/gone.png")
            .times(1)
            .returning(|_| Ok(false));

        let notice = workflow(posts, storage).destroy(id).await.unwrap();
        assert_eq!(notice, Notice::success("Post deleted successfully!"));
    }

    #[tokio::test]
    async fn test_destroy_unknown_post() {
        let mut posts = MockPostRepository::new();
        posts.expect_find_by_id().returning(|_| Ok(None));
        posts.expect_delete_by_id().never();

        let err = workflow(posts, MockFileStorage::new())
            .destroy(Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity_type: "Post", .. }));
    }

    #[tokio::test]
    async fn test_edit_form_resolves_image_url() {
        let post = existing(Some("images/posts/featured-images/a.png"));
        let id = post.id;

        let mut posts = MockPostRepository::new();
        posts
            .expect_find_by_id()
            .returning(move |_| Ok(Some(post.clone())));
        let mut storage = MockFileStorage::new();
        storage
            .expect_url()
            .returning(|path| format!("/storage/{path}"));

        let form = workflow(posts, storage).edit_form(id).await.unwrap();
        assert_eq!(
            form.image_url.as_deref(),
            Some("/storage/images/posts/featured-images/a.png")
        );
        assert_eq!(form.post.map(|p| p.id), Some(id));
    }
}
