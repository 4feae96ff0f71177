//! Reader feedback model.
//!
//! At most one feedback row per (post, email); the detail page shows the
//! signed-in reader their own submission.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Feedback record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Feedback {
    /// Post this feedback is about.
    pub post_id: Uuid,

    /// Reader email.
    pub email: String,

    /// Free-form feedback text.
    pub feedback: String,

    /// Numeric rating.
    pub rating: f32,
}

impl Feedback {
    /// Find the feedback a reader left on a post, if any.
    pub async fn find_for_user(
        pool: &PgPool,
        post_id: Uuid,
        email: &str,
    ) -> Result<Option<Self>> {
        let feedback = sqlx::query_as::<_, Self>(
            r#"
            SELECT post_id, email, feedback, rating
            FROM feedback
            WHERE post_id = $1 AND email = $2
            "#,
        )
        .bind(post_id)
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("failed to fetch user feedback")?;

        Ok(feedback)
    }

    /// Insert or replace a reader's feedback on a post.
    pub async fn upsert(pool: &PgPool, feedback: &Self) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO feedback (post_id, email, feedback, rating)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (post_id, email) DO UPDATE SET feedback = $3, rating = $4
            "#,
        )
        .bind(feedback.post_id)
        .bind(&feedback.email)
        .bind(&feedback.feedback)
        .bind(feedback.rating)
        .execute(pool)
        .await
        .context("failed to upsert feedback")?;

        Ok(())
    }
}
