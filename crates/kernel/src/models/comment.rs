//! Comment model for reader discussion on blog posts.
//!
//! Comments live in their own collection keyed by post; the blog module only
//! lists and counts them.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Comment record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    /// Unique identifier (UUIDv7).
    pub id: Uuid,

    /// Post this comment belongs to.
    pub post_id: Uuid,

    /// Display name of the commenter.
    pub author_name: String,

    /// Commenter email.
    pub email: String,

    /// Comment body (plain text).
    pub content: String,

    /// Publication status (0 = unpublished, 1 = published).
    pub published: i16,

    /// Unix timestamp when created.
    pub created: i64,
}

/// Input for creating a comment.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateComment {
    pub post_id: Uuid,
    pub author_name: String,
    pub email: String,
    pub content: String,
}

impl Comment {
    /// Create a new comment.
    pub async fn create(pool: &PgPool, input: CreateComment) -> Result<Self> {
        let id = Uuid::now_v7();
        let now = chrono::Utc::now().timestamp();

        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comment (id, post_id, author_name, email, content, published, created)
            VALUES ($1, $2, $3, $4, $5, 1, $6)
            RETURNING id, post_id, author_name, email, content, published, created
            "#,
        )
        .bind(id)
        .bind(input.post_id)
        .bind(&input.author_name)
        .bind(&input.email)
        .bind(&input.content)
        .bind(now)
        .fetch_one(pool)
        .await
        .context("failed to create comment")?;

        Ok(comment)
    }

    /// List published comments for a post, oldest first.
    pub async fn list_for_post(pool: &PgPool, post_id: Uuid) -> Result<Vec<Self>> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, post_id, author_name, email, content, published, created
            FROM comment
            WHERE post_id = $1 AND published = 1
            ORDER BY created ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(pool)
        .await
        .context("failed to list comments for post")?;

        Ok(comments)
    }
}

/// Human-readable comment count shown on detail and listing pages.
pub fn comment_count_text(count: i64) -> String {
    match count {
        0 => "No comments yet".to_string(),
        1 => "1 comment".to_string(),
        n => format!("{n} comments"),
    }
}
