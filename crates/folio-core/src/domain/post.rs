use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Post entity - a blog post with an optional featured image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    /// Storage path of the featured image, relative to the public storage root.
    pub featured_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub featured_image: Option<String>,
}

/// Fields applied by an update.
///
/// `featured_image` is a replacement: `None` leaves the stored path untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostChanges {
    pub title: String,
    pub content: String,
    pub featured_image: Option<String>,
}

impl Post {
    /// Create a new post with a generated ID and fresh timestamps.
    pub fn new(new: NewPost) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: new.title,
            content: new.content,
            featured_image: new.featured_image,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply an update and touch `updated_at`. The id never changes.
    pub fn apply(&mut self, changes: PostChanges) {
        self.title = changes.title;
        self.content = changes.content;
        if let Some(path) = changes.featured_image {
            self.featured_image = Some(path);
        }
        self.updated_at = Utc::now();
    }
}
