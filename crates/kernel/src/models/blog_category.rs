//! Blog category model.
//!
//! Categories classify posts and provide the listing navigation and the
//! breadcrumb trail on detail pages.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Blog category record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BlogCategory {
    /// Machine name identifier.
    pub id: String,

    /// Human-readable title.
    pub title: String,

    /// URL path segment under /blog.
    pub route: String,

    /// Publication status (0 = unpublished, 1 = published).
    pub published: i16,
}

/// Navigation entry: a published category with at least one published post.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CategoryNav {
    pub title: String,
    pub route: String,
}

impl BlogCategory {
    /// Find a category by ID.
    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Self>> {
        let category = sqlx::query_as::<_, Self>(
            "SELECT id, title, route, published FROM blog_category WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch blog category")?;

        Ok(category)
    }

    /// Create a new category.
    pub async fn create(pool: &PgPool, category: &Self) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO blog_category (id, title, route, published)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&category.id)
        .bind(&category.title)
        .bind(&category.route)
        .bind(category.published)
        .execute(pool)
        .await
        .context("failed to create blog category")?;

        Ok(())
    }

    /// Published categories that contain at least one published post,
    /// ordered by title. Used for the listing-page navigation.
    pub async fn with_published_posts(pool: &PgPool) -> Result<Vec<CategoryNav>> {
        let rows = sqlx::query_as::<_, CategoryNav>(
            r#"
            SELECT c.title, c.route
            FROM blog_category c
            WHERE c.published = 1
              AND EXISTS (
                  SELECT 1 FROM blog_post p
                  WHERE p.blog_category = c.id AND p.published = 1
              )
            ORDER BY c.title ASC
            "#,
        )
        .fetch_all(pool)
        .await
        .context("failed to list categories with published posts")?;

        Ok(rows)
    }

    /// Resolve a category title for list headings; falls back to the raw
    /// identifier when no such category exists.
    pub async fn title_or_id(pool: &PgPool, id: &str) -> Result<String> {
        let title: Option<String> =
            sqlx::query_scalar("SELECT title FROM blog_category WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await
                .context("failed to resolve category title")?;

        Ok(title.unwrap_or_else(|| id.to_string()))
    }
}
