//! Blog post model: validation, defaulting, CRUD, and the listing query.
//!
//! Save-time rules mirror the editorial contract: the intro and meta fields
//! are derived and clamped, the publish date is stamped once, featured posts
//! are kept unique across the collection, and the read time is recomputed
//! from the rendered content.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::cache::{BLOG_TAG, CacheLayer};
use crate::content::{
    ContentType, find_first_image, format_publish_date, read_time_minutes, rendered_content,
    slugify, strip_html_tags, truncate_chars,
};
use crate::models::blogger::normalize_avatar;
use crate::models::comment::comment_count_text;

/// Maximum length of the derived intro text.
const INTRO_MAX_CHARS: usize = 200;

/// Maximum length of the meta title.
const META_TITLE_MAX_CHARS: usize = 60;

/// Maximum length of the meta description.
const META_DESCRIPTION_MAX_CHARS: usize = 140;

/// Teaser length on the listing page.
const TEASER_MAX_CHARS: usize = 200;

/// Default listing page length.
pub const DEFAULT_PAGE_LENGTH: i64 = 20;

/// Blog post record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BlogPost {
    /// Unique identifier (UUIDv7).
    pub id: Uuid,

    /// Post title.
    pub title: String,

    /// URL path under /blog: `<category route>/<slug>`.
    pub route: String,

    /// Rich-text content (editor HTML).
    pub content: Option<String>,

    /// Markdown source.
    pub content_md: Option<String>,

    /// Raw HTML content.
    pub content_html: Option<String>,

    /// Which content column is authoritative (`rich_text`, `markdown`, `html`).
    pub content_type: String,

    /// Derived excerpt, at most 200 characters.
    pub blog_intro: Option<String>,

    /// Meta title, at most 60 characters.
    pub meta_title: Option<String>,

    /// Meta description, at most 140 characters.
    pub meta_description: Option<String>,

    /// Cover / meta image path.
    pub meta_image: Option<String>,

    /// Publication status (0 = unpublished, 1 = published).
    pub published: i16,

    /// Date first published.
    pub published_on: Option<NaiveDate>,

    /// Featured flag; at most one post is featured at a time.
    pub featured: i16,

    /// Derived read time in whole minutes.
    pub read_time: i32,

    /// Category machine name.
    pub blog_category: String,

    /// Author machine name.
    pub blogger: String,

    /// Hide the call-to-action block on this post.
    pub hide_cta: i16,

    /// Unix timestamp when created.
    pub created: i64,

    /// Unix timestamp when last changed.
    pub changed: i64,
}

/// Input for creating a blog post.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBlogPost {
    pub title: String,
    pub route: Option<String>,
    pub content: Option<String>,
    pub content_md: Option<String>,
    pub content_html: Option<String>,
    pub content_type: Option<String>,
    pub blog_intro: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub meta_image: Option<String>,
    pub published: Option<i16>,
    pub featured: Option<i16>,
    pub blog_category: String,
    pub blogger: String,
    pub hide_cta: Option<i16>,
}

/// Input for updating a blog post. `None` fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBlogPost {
    pub title: Option<String>,
    pub content: Option<String>,
    pub content_md: Option<String>,
    pub content_html: Option<String>,
    pub content_type: Option<String>,
    pub blog_intro: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub meta_image: Option<String>,
    pub published: Option<i16>,
    pub featured: Option<i16>,
    pub blog_category: Option<String>,
    pub blogger: Option<String>,
    pub hide_cta: Option<i16>,
}

impl BlogPost {
    /// Check if this post is published.
    pub fn is_published(&self) -> bool {
        self.published == 1
    }

    /// Check if this post is featured.
    pub fn is_featured(&self) -> bool {
        self.featured == 1
    }

    /// Render the authoritative content column, sanitized.
    pub fn rendered_content(&self) -> String {
        rendered_content(
            self.content.as_deref(),
            self.content_md.as_deref(),
            self.content_html.as_deref(),
            ContentType::parse(&self.content_type),
        )
    }

    /// Route of the rendered page, relative to the site root.
    pub fn page_route(&self) -> String {
        format!("blog/{}", self.route)
    }

    /// Apply save-time validation and defaulting rules in place.
    ///
    /// Derives the intro from the rendered content when absent, clamps the
    /// intro and meta fields to their bounds, stamps `published_on` the first
    /// time the post is published, requires a cover image on featured posts,
    /// and recomputes the read time.
    pub fn validate(&mut self) -> Result<()> {
        let rendered = self.rendered_content();

        if self.blog_intro.as_deref().is_none_or(|s| s.trim().is_empty()) {
            self.blog_intro = Some(truncate_chars(
                strip_html_tags(&rendered).trim(),
                INTRO_MAX_CHARS,
            ));
        }
        if let Some(intro) = self.blog_intro.take() {
            self.blog_intro = Some(truncate_chars(&intro, INTRO_MAX_CHARS));
        }

        let meta_title = self.meta_title.take().unwrap_or_else(|| self.title.clone());
        self.meta_title = Some(truncate_chars(&meta_title, META_TITLE_MAX_CHARS));

        let meta_description = self
            .meta_description
            .take()
            .filter(|s| !s.is_empty())
            .or_else(|| self.blog_intro.clone())
            .unwrap_or_default();
        self.meta_description = Some(truncate_chars(&meta_description, META_DESCRIPTION_MAX_CHARS));

        if self.published == 1 && self.published_on.is_none() {
            self.published_on = Some(chrono::Utc::now().date_naive());
        }

        if self.featured == 1 && self.meta_image.as_deref().is_none_or(str::is_empty) {
            bail!("a featured post must have a cover image");
        }

        self.read_time = read_time_minutes(&rendered);

        Ok(())
    }

    /// Derive a route from the category's route and a slugified title.
    pub async fn make_route(pool: &PgPool, blog_category: &str, title: &str) -> Result<String> {
        let category_route: Option<String> =
            sqlx::query_scalar("SELECT route FROM blog_category WHERE id = $1")
                .bind(blog_category)
                .fetch_optional(pool)
                .await
                .context("failed to fetch category route")?;

        let Some(category_route) = category_route else {
            bail!("blog category {blog_category} not found");
        };

        Ok(format!("{category_route}/{}", slugify(title)))
    }

    /// Find a post by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let post = sqlx::query_as::<_, Self>(&format!(
            "SELECT {POST_COLUMNS} FROM blog_post WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch blog post by id")?;

        Ok(post)
    }

    /// Find a post by its route.
    pub async fn find_by_route(pool: &PgPool, route: &str) -> Result<Option<Self>> {
        let post = sqlx::query_as::<_, Self>(&format!(
            "SELECT {POST_COLUMNS} FROM blog_post WHERE route = $1"
        ))
        .bind(route)
        .fetch_optional(pool)
        .await
        .context("failed to fetch blog post by route")?;

        Ok(post)
    }

    /// Create a new post.
    ///
    /// Runs validation, derives the route when none was given, clears the
    /// featured flag on every other post when this one is featured, and
    /// invalidates the writers fragment.
    pub async fn create(pool: &PgPool, cache: &CacheLayer, input: CreateBlogPost) -> Result<Self> {
        let now = chrono::Utc::now().timestamp();

        let route = match input.route.filter(|r| !r.is_empty()) {
            Some(route) => route,
            None => Self::make_route(pool, &input.blog_category, &input.title).await?,
        };

        let mut post = Self {
            id: Uuid::now_v7(),
            title: input.title,
            route,
            content: input.content,
            content_md: input.content_md,
            content_html: input.content_html,
            content_type: input
                .content_type
                .unwrap_or_else(|| ContentType::RichText.as_str().to_string()),
            blog_intro: input.blog_intro,
            meta_title: input.meta_title,
            meta_description: input.meta_description,
            meta_image: input.meta_image,
            published: input.published.unwrap_or(0),
            published_on: None,
            featured: input.featured.unwrap_or(0),
            read_time: 0,
            blog_category: input.blog_category,
            blogger: input.blogger,
            hide_cta: input.hide_cta.unwrap_or(0),
            created: now,
            changed: now,
        };

        post.validate()?;

        if post.is_featured() {
            Self::reset_featured_for_other_posts(pool, post.id).await?;
        }

        sqlx::query(
            r#"
            INSERT INTO blog_post (
                id, title, route, content, content_md, content_html, content_type,
                blog_intro, meta_title, meta_description, meta_image,
                published, published_on, featured, read_time,
                blog_category, blogger, hide_cta, created, changed
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            "#,
        )
        .bind(post.id)
        .bind(&post.title)
        .bind(&post.route)
        .bind(&post.content)
        .bind(&post.content_md)
        .bind(&post.content_html)
        .bind(&post.content_type)
        .bind(&post.blog_intro)
        .bind(&post.meta_title)
        .bind(&post.meta_description)
        .bind(&post.meta_image)
        .bind(post.published)
        .bind(post.published_on)
        .bind(post.featured)
        .bind(post.read_time)
        .bind(&post.blog_category)
        .bind(&post.blogger)
        .bind(post.hide_cta)
        .bind(post.created)
        .bind(post.changed)
        .execute(pool)
        .await
        .context("failed to insert blog post")?;

        cache.invalidate_writers().await;

        Ok(post)
    }

    /// Update a post.
    ///
    /// Merges the input over current values, re-runs validation, enforces
    /// featured uniqueness, and invalidates the post's page and the writers
    /// fragment.
    pub async fn update(
        pool: &PgPool,
        cache: &CacheLayer,
        id: Uuid,
        input: UpdateBlogPost,
    ) -> Result<Option<Self>> {
        let Some(current) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        let mut post = Self {
            id: current.id,
            title: input.title.unwrap_or(current.title),
            route: current.route,
            content: input.content.or(current.content),
            content_md: input.content_md.or(current.content_md),
            content_html: input.content_html.or(current.content_html),
            content_type: input.content_type.unwrap_or(current.content_type),
            blog_intro: input.blog_intro.or(current.blog_intro),
            meta_title: input.meta_title.or(current.meta_title),
            meta_description: input.meta_description.or(current.meta_description),
            meta_image: input.meta_image.or(current.meta_image),
            published: input.published.unwrap_or(current.published),
            published_on: current.published_on,
            featured: input.featured.unwrap_or(current.featured),
            read_time: current.read_time,
            blog_category: input.blog_category.unwrap_or(current.blog_category),
            blogger: input.blogger.unwrap_or(current.blogger),
            hide_cta: input.hide_cta.unwrap_or(current.hide_cta),
            created: current.created,
            changed: chrono::Utc::now().timestamp(),
        };

        post.validate()?;

        if post.is_featured() {
            Self::reset_featured_for_other_posts(pool, post.id).await?;
        }

        sqlx::query(
            r#"
            UPDATE blog_post SET
                title = $1, content = $2, content_md = $3, content_html = $4,
                content_type = $5, blog_intro = $6, meta_title = $7,
                meta_description = $8, meta_image = $9, published = $10,
                published_on = $11, featured = $12, read_time = $13,
                blog_category = $14, blogger = $15, hide_cta = $16, changed = $17
            WHERE id = $18
            "#,
        )
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.content_md)
        .bind(&post.content_html)
        .bind(&post.content_type)
        .bind(&post.blog_intro)
        .bind(&post.meta_title)
        .bind(&post.meta_description)
        .bind(&post.meta_image)
        .bind(post.published)
        .bind(post.published_on)
        .bind(post.featured)
        .bind(post.read_time)
        .bind(&post.blog_category)
        .bind(&post.blogger)
        .bind(post.hide_cta)
        .bind(post.changed)
        .bind(post.id)
        .execute(pool)
        .await
        .context("failed to update blog post")?;

        cache.invalidate_route(&post.page_route()).await;
        cache.invalidate_writers().await;

        Ok(Some(post))
    }

    /// Delete a post; comments and feedback cascade.
    pub async fn delete(pool: &PgPool, cache: &CacheLayer, id: Uuid) -> Result<bool> {
        let Some(post) = Self::find_by_id(pool, id).await? else {
            return Ok(false);
        };

        let result = sqlx::query("DELETE FROM blog_post WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .context("failed to delete blog post")?;

        cache.invalidate_route(&post.page_route()).await;
        cache.invalidate_writers().await;

        Ok(result.rows_affected() > 0)
    }

    /// Clear the featured flag on every post except `keep`.
    ///
    /// Not guarded against concurrent writers: two overlapping saves that
    /// both set the flag can leave two featured posts.
    async fn reset_featured_for_other_posts(pool: &PgPool, keep: Uuid) -> Result<()> {
        sqlx::query("UPDATE blog_post SET featured = 0 WHERE featured = 1 AND id <> $1")
            .bind(keep)
            .execute(pool)
            .await
            .context("failed to reset featured flag on other posts")?;

        Ok(())
    }

    /// Query the listing page: published posts joined to their author, with
    /// optional category/blogger/text filters, ordered featured-first then by
    /// publish date descending then title ascending.
    pub async fn list_published(
        pool: &PgPool,
        filters: &BlogListFilters,
        limit_start: i64,
        limit_page_length: i64,
    ) -> Result<Vec<BlogTeaser>> {
        let mut query = format!(
            r#"
            SELECT {LIST_COLUMNS}
            FROM blog_post p
            JOIN blogger b ON p.blogger = b.id
            JOIN blog_category c ON p.blog_category = c.id
            WHERE p.published = 1
            "#
        );
        let mut param_idx = 1;

        if filters.blog_category.is_some() {
            query.push_str(&format!(" AND p.blog_category = ${param_idx}"));
            param_idx += 1;
        }
        if filters.blogger.is_some() {
            query.push_str(&format!(" AND p.blogger = ${param_idx}"));
            param_idx += 1;
        }
        if filters.txt.is_some() {
            query.push_str(&format!(
                " AND (p.title ILIKE ${param_idx} OR p.content ILIKE ${param_idx})"
            ));
            param_idx += 1;
        }

        query.push_str(&format!(
            " ORDER BY p.featured DESC, p.published_on DESC, p.title ASC LIMIT ${} OFFSET ${}",
            param_idx,
            param_idx + 1
        ));

        let mut query_builder = sqlx::query_as::<_, BlogListRow>(&query);

        if let Some(category) = &filters.blog_category {
            query_builder = query_builder.bind(category);
        }
        if let Some(blogger) = &filters.blogger {
            query_builder = query_builder.bind(blogger);
        }
        if let Some(txt) = &filters.txt {
            query_builder = query_builder.bind(format!("%{txt}%"));
        }

        let rows = query_builder
            .bind(limit_page_length)
            .bind(limit_start)
            .fetch_all(pool)
            .await
            .context("failed to query blog listing")?;

        Ok(rows.into_iter().map(teaser_from_row).collect())
    }
}

/// Optional filters for the listing query.
#[derive(Debug, Clone, Default)]
pub struct BlogListFilters {
    pub blog_category: Option<String>,
    pub blogger: Option<String>,
    pub txt: Option<String>,
}

impl BlogListFilters {
    /// Whether any filter is set. Filtered pages bypass the page cache.
    pub fn is_active(&self) -> bool {
        self.blog_category.is_some() || self.blogger.is_some() || self.txt.is_some()
    }
}

/// Column list for single-post queries.
const POST_COLUMNS: &str = "id, title, route, content, content_md, content_html, content_type, \
     blog_intro, meta_title, meta_description, meta_image, published, published_on, featured, \
     read_time, blog_category, blogger, hide_cta, created, changed";

/// Projection for the listing query, including the comment-count subquery.
const LIST_COLUMNS: &str = r#"p.id, p.title, p.route, p.published_on, p.read_time, p.featured,
       p.meta_image, p.content, p.content_md, p.content_html, p.content_type,
       COALESCE(p.blog_intro, '') AS intro,
       p.blog_category, c.title AS category_title, c.route AS category_route,
       p.blogger, b.full_name, b.avatar,
       (SELECT COUNT(*) FROM comment cm
        WHERE cm.post_id = p.id AND cm.published = 1) AS comments"#;

/// Raw row returned by the listing query.
#[derive(Debug, Clone, sqlx::FromRow)]
struct BlogListRow {
    id: Uuid,
    title: String,
    route: String,
    published_on: Option<NaiveDate>,
    read_time: i32,
    featured: i16,
    meta_image: Option<String>,
    content: Option<String>,
    content_md: Option<String>,
    content_html: Option<String>,
    content_type: String,
    intro: String,
    blog_category: String,
    category_title: String,
    category_route: String,
    blogger: String,
    full_name: String,
    avatar: Option<String>,
    comments: i64,
}

/// A post prepared for the listing template.
#[derive(Debug, Clone, Serialize)]
pub struct BlogTeaser {
    pub id: Uuid,
    pub title: String,
    pub route: String,
    pub published: String,
    pub read_time: i32,
    pub featured: bool,
    pub cover_image: Option<String>,
    pub intro: String,
    pub comment_count: i64,
    pub comment_text: String,
    pub blog_category: String,
    pub category_title: String,
    pub category_route: String,
    pub blogger: String,
    pub full_name: String,
    pub avatar: String,
}

/// Post-process a listing row: render and strip the teaser text, fall back
/// to the first in-body image for the cover, format the publish date, and
/// normalize the author avatar.
fn teaser_from_row(row: BlogListRow) -> BlogTeaser {
    let rendered = rendered_content(
        row.content.as_deref(),
        row.content_md.as_deref(),
        row.content_html.as_deref(),
        ContentType::parse(&row.content_type),
    );

    let cover_image = row
        .meta_image
        .filter(|img| !img.is_empty())
        .or_else(|| find_first_image(&rendered));

    let intro = if row.intro.is_empty() {
        truncate_chars(strip_html_tags(&rendered).trim(), TEASER_MAX_CHARS)
    } else {
        row.intro
    };

    BlogTeaser {
        id: row.id,
        title: row.title,
        route: row.route,
        published: row.published_on.map(format_publish_date).unwrap_or_default(),
        read_time: row.read_time,
        featured: row.featured == 1,
        cover_image,
        intro,
        comment_count: row.comments,
        comment_text: comment_count_text(row.comments),
        blog_category: row.blog_category,
        category_title: row.category_title,
        category_route: row.category_route,
        blogger: row.blogger,
        full_name: row.full_name,
        avatar: normalize_avatar(row.avatar.as_deref().unwrap_or_default()),
    }
}

/// Flush every cached blog page plus the writers fragment. Run after
/// settings changes that affect all posts.
///
/// Every cached blog page registers under the blog tag at set time, so the
/// tag flush covers all post detail pages and the listing, and empties the
/// tag set itself.
pub async fn clear_blog_cache(cache: &CacheLayer) {
    cache.invalidate_tag(BLOG_TAG).await;
    cache.invalidate_writers().await;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn draft_post() -> BlogPost {
        BlogPost {
            id: Uuid::now_v7(),
            title: "A Study in Scarlet".to_string(),
            route: "fiction/a-study-in-scarlet".to_string(),
            content: Some("<p>In the year 1878 I took my degree.</p>".to_string()),
            content_md: None,
            content_html: None,
            content_type: "rich_text".to_string(),
            blog_intro: None,
            meta_title: None,
            meta_description: None,
            meta_image: None,
            published: 0,
            published_on: None,
            featured: 0,
            read_time: 0,
            blog_category: "fiction".to_string(),
            blogger: "acd".to_string(),
            hide_cta: 0,
            created: 0,
            changed: 0,
        }
    }

    #[test]
    fn validate_derives_intro_from_content() {
        let mut post = draft_post();
        post.validate().unwrap();
        assert_eq!(
            post.blog_intro.as_deref(),
            Some("In the year 1878 I took my degree.")
        );
    }

    #[test]
    fn validate_clamps_intro_to_200_chars() {
        let mut post = draft_post();
        post.blog_intro = Some("x".repeat(500));
        post.validate().unwrap();
        assert_eq!(post.blog_intro.unwrap().chars().count(), 200);
    }

    #[test]
    fn validate_defaults_and_clamps_meta_fields() {
        let mut post = draft_post();
        post.title = "t".repeat(100);
        post.validate().unwrap();

        assert_eq!(post.meta_title.as_ref().unwrap().chars().count(), 60);
        // meta_description falls back to the intro
        assert_eq!(
            post.meta_description.as_deref(),
            Some("In the year 1878 I took my degree.")
        );

        let mut post = draft_post();
        post.meta_description = Some("d".repeat(300));
        post.validate().unwrap();
        assert_eq!(post.meta_description.unwrap().chars().count(), 140);
    }

    #[test]
    fn validate_stamps_published_on_once() {
        let mut post = draft_post();
        post.published = 1;
        post.validate().unwrap();
        let first = post.published_on.unwrap();

        let earlier = NaiveDate::from_ymd_opt(2020, 6, 1).unwrap();
        post.published_on = Some(earlier);
        post.validate().unwrap();
        assert_eq!(post.published_on, Some(earlier));
        assert!(first >= earlier);
    }

    #[test]
    fn validate_rejects_featured_without_cover() {
        let mut post = draft_post();
        post.featured = 1;
        let err = post.validate().unwrap_err();
        assert!(err.to_string().contains("cover image"));

        post.meta_image = Some("/files/cover.png".to_string());
        post.validate().unwrap();
    }

    #[test]
    fn validate_recomputes_read_time() {
        let mut post = draft_post();
        post.content = Some(format!("<p>{}</p>", "word ".repeat(600)));
        post.validate().unwrap();
        assert_eq!(post.read_time, 3);

        post.content = Some(String::new());
        post.validate().unwrap();
        assert_eq!(post.read_time, 0);
    }

    #[test]
    fn filters_active_detection() {
        assert!(!BlogListFilters::default().is_active());
        assert!(
            BlogListFilters {
                txt: Some("rust".to_string()),
                ..Default::default()
            }
            .is_active()
        );
    }

    fn sample_row() -> BlogListRow {
        BlogListRow {
            id: Uuid::now_v7(),
            title: "Post".to_string(),
            route: "tech/post".to_string(),
            published_on: NaiveDate::from_ymd_opt(2026, 3, 14),
            read_time: 2,
            featured: 0,
            meta_image: None,
            content: Some(
                r#"<p>Body text</p><img src="body-image.png">"#.to_string(),
            ),
            content_md: None,
            content_html: None,
            content_type: "rich_text".to_string(),
            intro: String::new(),
            blog_category: "tech".to_string(),
            category_title: "Tech".to_string(),
            category_route: "tech".to_string(),
            blogger: "jane".to_string(),
            full_name: "Jane Doe".to_string(),
            avatar: Some("files/jane.png".to_string()),
            comments: 1,
        }
    }

    #[test]
    fn teaser_falls_back_to_first_body_image() {
        let teaser = teaser_from_row(sample_row());
        assert_eq!(teaser.cover_image.as_deref(), Some("body-image.png"));
    }

    #[test]
    fn teaser_prefers_explicit_cover_image() {
        let mut row = sample_row();
        row.meta_image = Some("/files/cover.png".to_string());
        let teaser = teaser_from_row(row);
        assert_eq!(teaser.cover_image.as_deref(), Some("/files/cover.png"));
    }

    #[test]
    fn teaser_strips_markup_and_formats_date() {
        let teaser = teaser_from_row(sample_row());
        assert_eq!(teaser.intro, "Body text");
        assert_eq!(teaser.published, "March 14, 2026");
        assert_eq!(teaser.comment_text, "1 comment");
        assert_eq!(teaser.avatar, "/files/jane.png");
    }
}
