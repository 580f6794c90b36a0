/// Post storage - the thin resource behind the protected data
/// endpoints.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
}

/// Insert a post; the author is the authenticated username.
pub async fn create_post(
    pool: &PgPool,
    title: &str,
    content: &str,
    author: &str,
) -> Result<i64, AppError> {
    let (id,) = sqlx::query_as::<_, (i64,)>(
        r#"
        INSERT INTO posts (title, content, author)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(title)
    .bind(content)
    .bind(author)
    .fetch_one(pool)
    .await?;

    tracing::info!(post_id = id, author = %author, "Post created");

    Ok(id)
}

/// All posts, newest first.
pub async fn list_posts(pool: &PgPool) -> Result<Vec<Post>, AppError> {
    let rows = sqlx::query_as::<_, (i64, String, String, String, DateTime<Utc>)>(
        "SELECT id, title, content, author, created_at FROM posts ORDER BY created_at DESC, id DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, title, content, author, created_at)| Post {
            id,
            title,
            content,
            author,
            created_at,
        })
        .collect())
}
