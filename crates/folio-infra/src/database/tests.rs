use chrono::Utc;
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use uuid::Uuid;

use folio_core::domain::{NewPost, PostChanges};
use folio_core::ports::PostRepository;

use folio_core::ports::UserRepository;

use crate::database::entity::{post, user};
use crate::database::postgres_repo::{PostgresPostRepository, PostgresUserRepository, mask_email};

fn row(title: &str, image: Option<&str>) -> post::Model {
    let now = Utc::now();
    post::Model {
        id: Uuid::new_v4(),
        title: title.to_owned(),
        content: "Content".to_owned(),
        featured_image: image.map(str::to_owned),
        created_at: now.into(),
        updated_at: now.into(),
    }
}

#[tokio::test]
async fn test_find_post_by_id() {
    let model = row("Test Post", Some("images/posts/featured-images/a.png"));
    let post_id = model.id;

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![model]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let post = repo.find_by_id(post_id).await.unwrap().unwrap();
    assert_eq!(post.title, "Test Post");
    assert_eq!(post.id, post_id);
    assert_eq!(
        post.featured_image.as_deref(),
        Some("images/posts/featured-images/a.png")
    );
}

#[tokio::test]
async fn test_find_missing_post_is_none() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![Vec::<post::Model>::new()])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    assert!(repo.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_recent_keeps_row_order() {
    let newer = row("Newer", None);
    let older = row("Older", None);

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![newer, older]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let titles: Vec<String> = repo
        .list_recent()
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.title)
        .collect();
    assert_eq!(titles, ["Newer", "Older"]);
}

#[tokio::test]
async fn test_create_returns_inserted_row() {
    let inserted = row("Created", Some("images/posts/featured-images/c.png"));

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![inserted.clone()]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let post = repo
        .create(NewPost {
            title: "Created".to_owned(),
            content: "Content".to_owned(),
            featured_image: Some("images/posts/featured-images/c.png".to_owned()),
        })
        .await
        .unwrap();
    assert_eq!(post.id, inserted.id);
}

#[tokio::test]
async fn test_update_missing_post_is_none() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![Vec::<post::Model>::new()])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let result = repo
        .update_by_id(
            Uuid::new_v4(),
            PostChanges {
                title: "T".to_owned(),
                content: "C".to_owned(),
                featured_image: None,
            },
        )
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_update_returns_updated_row() {
    let existing = row("Before", Some("images/posts/featured-images/keep.png"));
    let mut after = existing.clone();
    after.title = "After".to_owned();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![existing.clone()], vec![after]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let post = repo
        .update_by_id(
            existing.id,
            PostChanges {
                title: "After".to_owned(),
                content: "Content".to_owned(),
                featured_image: None,
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(post.title, "After");
    assert_eq!(
        post.featured_image.as_deref(),
        Some("images/posts/featured-images/keep.png")
    );
}

#[tokio::test]
async fn test_delete_reports_affected_rows() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results(vec![
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            },
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            },
        ])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    assert!(repo.delete_by_id(Uuid::new_v4()).await.unwrap());
    assert!(!repo.delete_by_id(Uuid::new_v4()).await.unwrap());
}

#[tokio::test]
async fn test_find_user_by_non_ascii_email() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![Vec::<user::Model>::new()])
        .into_connection();

    let repo = PostgresUserRepository::new(db);

    assert!(repo.find_by_email("éa@example.com").await.unwrap().is_none());
}

#[test]
fn test_mask_email_keeps_char_boundaries() {
    assert_eq!(mask_email("éa@example.com"), "é***@example.com");
    assert_eq!(mask_email("ü@example.com"), "***@example.com");
    assert_eq!(mask_email("editor@example.com"), "e***@example.com");
    assert_eq!(mask_email("no-at-sign"), "***");
}
