//! Blog listing page: filters, headings, navigation, and rendering.

use axum::extract::{Query, State};
use axum::response::Html;
use axum::{Router, routing::get};
use serde::{Deserialize, Serialize};

use crate::cache::{BLOG_TAG, page_key};
use crate::content::strip_html_tags;
use crate::error::{AppError, AppResult};
use crate::models::blog_post::DEFAULT_PAGE_LENGTH;
use crate::models::{BlogCategory, BlogListFilters, BlogPost, BlogSettings, BlogTeaser, Blogger};
use crate::routes::blog::Crumb;
use crate::state::AppState;

/// Create the blog listing router.
pub fn router() -> Router<AppState> {
    Router::new().route("/blog", get(blog_list_page))
}

/// Listing page query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlogListQuery {
    /// Category filter.
    pub blog_category: Option<String>,

    /// Short alias for `blog_category`.
    pub category: Option<String>,

    /// Blogger filter.
    pub blogger: Option<String>,

    /// Free-text search over title and content.
    pub txt: Option<String>,

    /// Pagination offset.
    pub start: Option<i64>,
}

impl BlogListQuery {
    /// Collapse the query into listing filters, preferring the long-form
    /// category parameter over its alias and dropping empty values.
    pub fn into_filters(self) -> BlogListFilters {
        BlogListFilters {
            blog_category: self
                .blog_category
                .or(self.category)
                .filter(|s| !s.is_empty()),
            blogger: self.blogger.filter(|s| !s.is_empty()),
            txt: self.txt.filter(|s| !s.is_empty()),
        }
    }
}

/// Rendering context for the listing page.
#[derive(Debug, Clone, Serialize)]
pub struct ListContext {
    pub title: String,
    pub sub_title: Option<String>,
    pub blog_introduction: String,
    pub posts: Vec<BlogTeaser>,
    pub categories: Vec<crate::models::CategoryNav>,
    pub breadcrumbs: Vec<Crumb>,
}

/// Resolve the listing heading and sub-title from the active filter.
///
/// A category filter replaces the page title with the category's, a blogger
/// filter with the author's name; a text filter keeps the blog title and
/// adds a "Filtered by" sub-title.
pub fn list_heading(
    blog_title: &str,
    category_title: Option<&str>,
    blogger_name: Option<&str>,
    txt: Option<&str>,
) -> (String, Option<String>) {
    if let Some(category) = category_title {
        return (
            category.to_string(),
            Some(format!("Posts filed under {category}")),
        );
    }
    if let Some(blogger) = blogger_name {
        return (blogger.to_string(), Some(format!("Posts by {blogger}")));
    }
    if let Some(txt) = txt {
        let txt = strip_html_tags(txt);
        return (
            blog_title.to_string(),
            Some(format!("Filtered by \"{txt}\"")),
        );
    }
    (blog_title.to_string(), None)
}

/// Build the listing context for the given filters and offset.
pub async fn list_context(
    state: &AppState,
    filters: &BlogListFilters,
    start: i64,
) -> AppResult<ListContext> {
    let db = state.db();
    let settings = BlogSettings::load(db).await?;

    let category_title = match &filters.blog_category {
        Some(id) => Some(BlogCategory::title_or_id(db, id).await?),
        None => None,
    };
    let blogger_name = match &filters.blogger {
        Some(id) => Some(Blogger::full_name_or_id(db, id).await?),
        None => None,
    };

    let (title, sub_title) = list_heading(
        &settings.blog_title,
        category_title.as_deref(),
        blogger_name.as_deref(),
        filters.txt.as_deref(),
    );

    let posts = BlogPost::list_published(db, filters, start, DEFAULT_PAGE_LENGTH).await?;
    let categories = BlogCategory::with_published_posts(db).await?;

    let mut breadcrumbs = vec![Crumb {
        label: "Home".to_string(),
        route: "/".to_string(),
    }];
    if sub_title.is_some() {
        breadcrumbs.push(Crumb {
            label: "Blog".to_string(),
            route: "/blog".to_string(),
        });
    }

    Ok(ListContext {
        title,
        sub_title,
        blog_introduction: settings.blog_introduction,
        posts,
        categories,
        breadcrumbs,
    })
}

/// Listing page handler.
///
/// Unfiltered first pages are served from the page cache; any active filter
/// bypasses it.
async fn blog_list_page(
    State(state): State<AppState>,
    Query(query): Query<BlogListQuery>,
) -> AppResult<Html<String>> {
    let start = query.start.unwrap_or(0).max(0);
    let filters = query.into_filters();

    let cacheable = !filters.is_active() && start == 0;
    let cache_key = page_key("blog");

    if cacheable {
        if let Some(cached) = state.cache().get(&cache_key).await {
            return Ok(Html(cached));
        }
    }

    let context = list_context(&state, &filters, start).await?;
    let tera_context = tera::Context::from_serialize(&context)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;

    let html = state
        .tera()
        .render("blog_list.html", &tera_context)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;

    if cacheable {
        state.cache().set(&cache_key, &html, 0, &[BLOG_TAG]).await;
    }

    Ok(Html(html))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn heading_without_filters_uses_blog_title() {
        let (title, sub) = list_heading("Blog", None, None, None);
        assert_eq!(title, "Blog");
        assert_eq!(sub, None);
    }

    #[test]
    fn heading_for_category_filter() {
        let (title, sub) = list_heading("Blog", Some("Tech"), None, None);
        assert_eq!(title, "Tech");
        assert_eq!(sub.as_deref(), Some("Posts filed under Tech"));
    }

    #[test]
    fn heading_for_blogger_filter() {
        let (title, sub) = list_heading("Blog", None, Some("Jane Doe"), None);
        assert_eq!(title, "Jane Doe");
        assert_eq!(sub.as_deref(), Some("Posts by Jane Doe"));
    }

    #[test]
    fn heading_for_text_filter_strips_markup() {
        let (title, sub) = list_heading("Blog", None, None, Some("<b>rust</b>"));
        assert_eq!(title, "Blog");
        assert_eq!(sub.as_deref(), Some("Filtered by \"rust\""));
    }

    #[test]
    fn category_filter_takes_precedence() {
        let (_, sub) = list_heading("Blog", Some("Tech"), Some("Jane"), Some("rust"));
        assert_eq!(sub.as_deref(), Some("Posts filed under Tech"));
    }

    #[test]
    fn query_alias_and_empty_values() {
        let filters = BlogListQuery {
            category: Some("tech".to_string()),
            txt: Some(String::new()),
            ..Default::default()
        }
        .into_filters();

        assert_eq!(filters.blog_category.as_deref(), Some("tech"));
        assert_eq!(filters.txt, None);
        assert!(filters.is_active());
    }

    #[test]
    fn long_form_category_wins_over_alias() {
        let filters = BlogListQuery {
            blog_category: Some("a".to_string()),
            category: Some("b".to_string()),
            ..Default::default()
        }
        .into_filters();

        assert_eq!(filters.blog_category.as_deref(), Some("a"));
    }
}
