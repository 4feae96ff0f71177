//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use redis::Client as RedisClient;
use sqlx::PgPool;
use tracing::info;

use crate::cache::CacheLayer;
use crate::config::Config;
use crate::db;

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// PostgreSQL connection pool.
    db: PgPool,

    /// Two-tier cache layer (Moka L1 + Redis L2).
    cache: CacheLayer,

    /// Tera templates for page rendering.
    tera: tera::Tera,

    /// Public site URL for absolute links.
    site_url: String,
}

impl AppState {
    /// Create new application state with database connections.
    pub async fn new(config: &Config) -> Result<Self> {
        // Create PostgreSQL pool
        let db = db::create_pool(config)
            .await
            .context("failed to create database pool")?;

        // Run migrations
        db::run_migrations(&db)
            .await
            .context("failed to run migrations")?;

        // Create Redis client
        let redis = RedisClient::open(config.redis_url.as_str())
            .context("failed to create Redis client")?;

        // Test Redis connection
        let mut conn = redis
            .get_multiplexed_async_connection()
            .await
            .context("failed to connect to Redis")?;

        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .context("Redis PING failed")?;

        let cache = CacheLayer::new(redis);

        // Load templates
        let glob = format!("{}/**/*.html", config.templates_dir.display());
        let tera = tera::Tera::new(&glob).context("failed to load templates")?;
        info!(
            templates = tera.get_template_names().count(),
            "Templates loaded"
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                db,
                cache,
                tera,
                site_url: config.site_url.trim_end_matches('/').to_string(),
            }),
        })
    }

    /// Database pool.
    pub fn db(&self) -> &PgPool {
        &self.inner.db
    }

    /// Cache layer.
    pub fn cache(&self) -> &CacheLayer {
        &self.inner.cache
    }

    /// Template engine.
    pub fn tera(&self) -> &tera::Tera {
        &self.inner.tera
    }

    /// Public site URL, without trailing slash.
    pub fn site_url(&self) -> &str {
        &self.inner.site_url
    }
}
