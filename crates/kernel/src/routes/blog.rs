//! Blog detail page: route, context builder, and rendering.

use axum::extract::{Path, State};
use axum::response::Html;
use axum::{Router, routing::get};
use serde::Serialize;
use tower_sessions::Session;

use crate::cache::{BLOG_TAG, page_key};
use crate::content::{find_first_image, format_publish_date, strip_html_tags, truncate_chars};
use crate::error::{AppError, AppResult};
use crate::models::{
    BlogCategory, BlogPost, BlogSettings, Blogger, Comment, Feedback, comment_count_text,
    normalize_avatar,
};
use crate::session::session_email;
use crate::state::AppState;

/// Meta description falls back to the first 140 characters of the content.
const META_DESCRIPTION_MAX_CHARS: usize = 140;

/// Create the blog detail router.
pub fn router() -> Router<AppState> {
    Router::new().route("/blog/{category}/{slug}", get(blog_post_page))
}

/// A social-share link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SocialLink {
    pub icon: String,
    pub link: String,
}

/// The call-to-action block sourced from blog settings.
#[derive(Debug, Clone, Serialize)]
pub struct CtaBlock {
    pub title: String,
    pub subtitle: String,
    pub cta_label: String,
    pub cta_url: String,
}

/// Meta tags for the page head.
#[derive(Debug, Clone, Serialize)]
pub struct MetaTags {
    pub name: String,
    pub description: String,
    pub image: Option<String>,
}

/// One breadcrumb entry.
#[derive(Debug, Clone, Serialize)]
pub struct Crumb {
    pub label: String,
    pub route: String,
}

/// Rendering context for a single blog post page.
#[derive(Debug, Clone, Serialize)]
pub struct PostContext {
    pub title: String,
    pub content: String,
    pub full_name: String,
    pub avatar: String,
    pub published: String,
    pub read_time: i32,
    pub social_links: Vec<SocialLink>,
    pub cta: Option<CtaBlock>,
    pub comment_list: Vec<Comment>,
    pub comment_text: String,
    pub user_feedback: Option<Feedback>,
    pub metatags: MetaTags,
    pub breadcrumbs: Vec<Crumb>,
}

/// Build share links for four networks from the post title and absolute URL.
pub fn social_links(title: &str, url: &str) -> Vec<SocialLink> {
    let title = urlencoding::encode(title);
    let url = urlencoding::encode(url);

    vec![
        SocialLink {
            icon: "twitter".to_string(),
            link: format!("https://twitter.com/intent/tweet?text={title}&url={url}"),
        },
        SocialLink {
            icon: "facebook".to_string(),
            link: format!("https://www.facebook.com/sharer.php?u={url}"),
        },
        SocialLink {
            icon: "linkedin".to_string(),
            link: format!("https://www.linkedin.com/sharing/share-offsite/?url={url}"),
        },
        SocialLink {
            icon: "envelope".to_string(),
            link: format!("mailto:?subject={title}&body={url}"),
        },
    ]
}

/// Meta description fallback chain: explicit field, then the intro, then
/// the first 140 characters of the stripped content.
pub fn meta_description_for(
    meta_description: Option<&str>,
    blog_intro: Option<&str>,
    rendered_content: &str,
) -> String {
    if let Some(description) = meta_description.filter(|s| !s.is_empty()) {
        return description.to_string();
    }
    if let Some(intro) = blog_intro.filter(|s| !s.is_empty()) {
        return intro.to_string();
    }
    truncate_chars(
        strip_html_tags(rendered_content).trim(),
        META_DESCRIPTION_MAX_CHARS,
    )
}

/// Meta image fallback chain: explicit field, then the first image found in
/// the rendered content, then none.
pub fn meta_image_for(meta_image: Option<&str>, rendered_content: &str) -> Option<String> {
    meta_image
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| find_first_image(rendered_content))
}

/// Build the rendering context for a published post.
///
/// Refuses unpublished posts; routing should never send one here, this is a
/// secondary guard.
pub async fn post_context(
    state: &AppState,
    post: &BlogPost,
    session_user: Option<&str>,
) -> AppResult<PostContext> {
    if !post.is_published() {
        tracing::warn!(route = %post.route, "refusing to build context for unpublished post");
        return Err(AppError::NotFound);
    }

    let db = state.db();
    let settings = BlogSettings::load(db).await?;
    let rendered = post.rendered_content();

    let blogger = Blogger::find_by_id(db, &post.blogger).await?;
    let (full_name, avatar) = match &blogger {
        Some(b) => (
            b.full_name.clone(),
            normalize_avatar(b.avatar.as_deref().unwrap_or_default()),
        ),
        None => (post.blogger.clone(), String::new()),
    };

    let links = if settings.enable_social_sharing {
        let url = format!("{}/{}", state.site_url(), post.page_route());
        social_links(&post.title, &url)
    } else {
        Vec::new()
    };

    let cta = if post.hide_cta == 0 && settings.show_cta_in_blog {
        Some(CtaBlock {
            title: settings.title,
            subtitle: settings.subtitle,
            cta_label: settings.cta_label,
            cta_url: settings.cta_url,
        })
    } else {
        None
    };

    let comment_list = Comment::list_for_post(db, post.id).await?;
    let comment_text = comment_count_text(comment_list.len() as i64);

    let user_feedback = match session_user {
        Some(email) => Feedback::find_for_user(db, post.id, email).await?,
        None => None,
    };

    let metatags = MetaTags {
        name: post.meta_title.clone().unwrap_or_else(|| post.title.clone()),
        description: meta_description_for(
            post.meta_description.as_deref(),
            post.blog_intro.as_deref(),
            &rendered,
        ),
        image: meta_image_for(post.meta_image.as_deref(), &rendered),
    };

    let mut breadcrumbs = vec![
        Crumb {
            label: "Home".to_string(),
            route: "/".to_string(),
        },
        Crumb {
            label: "Blog".to_string(),
            route: "/blog".to_string(),
        },
    ];
    if let Some(category) = BlogCategory::find_by_id(db, &post.blog_category).await? {
        breadcrumbs.push(Crumb {
            label: category.title,
            route: format!("/blog/{}", category.route),
        });
    }

    Ok(PostContext {
        title: post.title.clone(),
        content: rendered,
        full_name,
        avatar,
        published: post
            .published_on
            .map(format_publish_date)
            .unwrap_or_default(),
        read_time: post.read_time,
        social_links: links,
        cta,
        comment_list,
        comment_text,
        user_feedback,
        metatags,
        breadcrumbs,
    })
}

/// Detail page handler.
///
/// Anonymous requests are served from the page cache; signed-in readers get
/// a fresh render because the context carries their own feedback.
async fn blog_post_page(
    State(state): State<AppState>,
    Path((category, slug)): Path<(String, String)>,
    session: Session,
) -> AppResult<Html<String>> {
    let route = format!("{category}/{slug}");
    let email = session_email(&session).await;

    let cache_key = page_key(&format!("blog/{route}"));
    if email.is_none() {
        if let Some(cached) = state.cache().get(&cache_key).await {
            return Ok(Html(cached));
        }
    }

    let Some(post) = BlogPost::find_by_route(state.db(), &route).await? else {
        return Err(AppError::NotFound);
    };

    let context = post_context(&state, &post, email.as_deref()).await?;
    let tera_context = tera::Context::from_serialize(&context)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;

    let html = state
        .tera()
        .render("blog_post.html", &tera_context)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;

    if email.is_none() {
        state.cache().set(&cache_key, &html, 0, &[BLOG_TAG]).await;
    }

    Ok(Html(html))
}
