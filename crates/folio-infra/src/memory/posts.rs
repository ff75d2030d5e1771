use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use folio_core::domain::{NewPost, Post, PostChanges};
use folio_core::error::RepoError;
use folio_core::ports::PostRepository;

/// Post repository backed by a HashMap. Contents are lost on restart.
#[derive(Default)]
pub struct InMemoryPostRepository {
    posts: RwLock<HashMap<Uuid, Post>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.posts.read().await.get(&id).cloned())
    }

    async fn list_recent(&self) -> Result<Vec<Post>, RepoError> {
        let mut posts: Vec<Post> = self.posts.read().await.values().cloned().collect();
        posts.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(posts)
    }

    async fn create(&self, new: NewPost) -> Result<Post, RepoError> {
        let post = Post::new(new);
        self.posts.write().await.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update_by_id(
        &self,
        id: Uuid,
        changes: PostChanges,
    ) -> Result<Option<Post>, RepoError> {
        let mut posts = self.posts.write().await;
        Ok(posts.get_mut(&id).map(|post| {
            post.apply(changes);
            post.clone()
        }))
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, RepoError> {
        Ok(self.posts.write().await.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn new_post(title: &str) -> NewPost {
        NewPost {
            title: title.to_string(),
            content: "Body".to_string(),
            featured_image: Some(format!("images/posts/featured-images/{title}.png")),
        }
    }

    #[tokio::test]
    async fn test_create_then_find() {
        let repo = InMemoryPostRepository::new();
        let created = repo.create(new_post("first")).await.unwrap();

        let found = repo.find_by_id(created.id).await.unwrap();
        assert_eq!(found, Some(created));
        assert!(repo.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_recent_orders_by_last_update() {
        let repo = InMemoryPostRepository::new();
        let first = repo.create(new_post("first")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        repo.create(new_post("second")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        repo.update_by_id(
            first.id,
            PostChanges {
                title: "first, edited".to_string(),
                content: "Body".to_string(),
                featured_image: None,
            },
        )
        .await
        .unwrap();

        let titles: Vec<String> = repo
            .list_recent()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, ["first, edited", "second"]);
    }

    #[tokio::test]
    async fn test_update_keeps_image_when_none_given() {
        let repo = InMemoryPostRepository::new();
        let created = repo.create(new_post("keep")).await.unwrap();

        let updated = repo
            .update_by_id(
                created.id,
                PostChanges {
                    title: "Renamed".to_string(),
                    content: "New body".to_string(),
                    featured_image: None,
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.featured_image, created.featured_image);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_missing_post_reports_absence() {
        let repo = InMemoryPostRepository::new();
        let id = Uuid::new_v4();

        let changes = PostChanges {
            title: "T".to_string(),
            content: "C".to_string(),
            featured_image: None,
        };
        assert!(repo.update_by_id(id, changes).await.unwrap().is_none());
        assert!(!repo.delete_by_id(id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_removes_post() {
        let repo = InMemoryPostRepository::new();
        let created = repo.create(new_post("gone")).await.unwrap();

        assert!(repo.delete_by_id(created.id).await.unwrap());
        assert!(repo.find_by_id(created.id).await.unwrap().is_none());
        assert!(repo.list_recent().await.unwrap().is_empty());
    }
}
