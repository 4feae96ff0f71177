//! Site-wide blog settings, stored as a single record.
//!
//! Settings live as one JSON value in the `site_config` key/value table;
//! a missing row yields defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::cache::CacheLayer;
use crate::models::blog_post::clear_blog_cache;

/// Key in `site_config` holding the blog settings record.
const CONFIG_KEY: &str = "blog";

/// Blog settings record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogSettings {
    /// Heading of the blog listing page.
    #[serde(default = "default_blog_title")]
    pub blog_title: String,

    /// Introductory text on the listing page.
    #[serde(default)]
    pub blog_introduction: String,

    /// Show social-share links on detail pages.
    #[serde(default)]
    pub enable_social_sharing: bool,

    /// Show the call-to-action block on detail pages.
    #[serde(default)]
    pub show_cta_in_blog: bool,

    /// CTA heading.
    #[serde(default)]
    pub title: String,

    /// CTA subtitle.
    #[serde(default)]
    pub subtitle: String,

    /// CTA button label.
    #[serde(default)]
    pub cta_label: String,

    /// CTA button target URL.
    #[serde(default)]
    pub cta_url: String,
}

fn default_blog_title() -> String {
    "Blog".to_string()
}

impl Default for BlogSettings {
    fn default() -> Self {
        Self {
            blog_title: default_blog_title(),
            blog_introduction: String::new(),
            enable_social_sharing: false,
            show_cta_in_blog: false,
            title: String::new(),
            subtitle: String::new(),
            cta_label: String::new(),
            cta_url: String::new(),
        }
    }
}

impl BlogSettings {
    /// Load blog settings; defaults when the record is missing or malformed.
    pub async fn load(pool: &PgPool) -> Result<Self> {
        let value = sqlx::query_scalar::<_, serde_json::Value>(
            "SELECT value FROM site_config WHERE key = $1",
        )
        .bind(CONFIG_KEY)
        .fetch_optional(pool)
        .await
        .context("failed to load blog settings")?;

        Ok(value
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default())
    }

    /// Store blog settings and flush every cached blog page.
    ///
    /// Settings feed into every rendered page (headings, CTA, social links),
    /// so a change invalidates the whole cached blog section.
    pub async fn store(&self, pool: &PgPool, cache: &CacheLayer) -> Result<()> {
        let value = serde_json::to_value(self).context("failed to serialize blog settings")?;

        sqlx::query(
            r#"
            INSERT INTO site_config (key, value, updated)
            VALUES ($1, $2, NOW())
            ON CONFLICT (key) DO UPDATE SET value = $2, updated = NOW()
            "#,
        )
        .bind(CONFIG_KEY)
        .bind(value)
        .execute(pool)
        .await
        .context("failed to store blog settings")?;

        clear_blog_cache(cache).await;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = BlogSettings::default();
        assert_eq!(settings.blog_title, "Blog");
        assert!(!settings.enable_social_sharing);
        assert!(!settings.show_cta_in_blog);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: BlogSettings =
            serde_json::from_value(serde_json::json!({"enable_social_sharing": true})).unwrap();
        assert!(settings.enable_social_sharing);
        assert_eq!(settings.blog_title, "Blog");
        assert_eq!(settings.cta_label, "");
    }
}
