//! Blogger (author) model.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Blogger record: an author posts are attributed to.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Blogger {
    /// Machine name identifier.
    pub id: String,

    /// Display name.
    pub full_name: String,

    /// Avatar image path or URL.
    pub avatar: Option<String>,

    /// Short author bio shown on detail pages.
    pub bio: Option<String>,
}

impl Blogger {
    /// Find a blogger by ID.
    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Self>> {
        let blogger = sqlx::query_as::<_, Self>(
            "SELECT id, full_name, avatar, bio FROM blogger WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch blogger")?;

        Ok(blogger)
    }

    /// Create a new blogger.
    pub async fn create(pool: &PgPool, blogger: &Self) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO blogger (id, full_name, avatar, bio)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&blogger.id)
        .bind(&blogger.full_name)
        .bind(&blogger.avatar)
        .bind(&blogger.bio)
        .execute(pool)
        .await
        .context("failed to create blogger")?;

        Ok(())
    }

    /// Resolve a blogger's display name for list headings; falls back to the
    /// raw identifier when no such blogger exists.
    pub async fn full_name_or_id(pool: &PgPool, id: &str) -> Result<String> {
        let name: Option<String> =
            sqlx::query_scalar("SELECT full_name FROM blogger WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await
                .context("failed to resolve blogger name")?;

        Ok(name.unwrap_or_else(|| id.to_string()))
    }
}

/// Normalize an avatar path for use in templates.
///
/// Relative paths gain a leading slash; absolute paths and full URLs are
/// left unchanged. Empty input stays empty.
pub fn normalize_avatar(avatar: &str) -> String {
    if avatar.is_empty()
        || avatar.starts_with('/')
        || avatar.starts_with("http:")
        || avatar.starts_with("https:")
    {
        avatar.to_string()
    } else {
        format!("/{avatar}")
    }
}
