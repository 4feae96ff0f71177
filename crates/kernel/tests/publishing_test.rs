#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Database-backed integration tests for publishing rules, the listing
//! query, and cache flushes.
//!
//! These run against the real Postgres and Redis instances configured in
//! the environment. Each test seeds its own category and author under a
//! unique suffix so parallel tests stay isolated.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use common::{run_test, shared_app};
use taccuino_kernel::cache::{BLOG_TAG, page_key};
use taccuino_kernel::models::{
    BlogCategory, BlogListFilters, BlogPost, BlogSettings, Blogger, CreateBlogPost,
};

/// Short unique suffix so parallel tests never share records.
fn unique() -> String {
    Uuid::now_v7().simple().to_string()[..12].to_string()
}

/// Seed a published category and an author, returning their ids.
async fn seed(db: &PgPool, suffix: &str) -> (String, String) {
    let category = format!("cat-{suffix}");
    BlogCategory::create(
        db,
        &BlogCategory {
            id: category.clone(),
            title: format!("Essays {suffix}"),
            route: format!("essays-{suffix}"),
            published: 1,
        },
    )
    .await
    .unwrap();

    let blogger = format!("author-{suffix}");
    Blogger::create(
        db,
        &Blogger {
            id: blogger.clone(),
            full_name: "John Watson".to_string(),
            avatar: Some("avatars/watson.png".to_string()),
            bio: None,
        },
    )
    .await
    .unwrap();

    (category, blogger)
}

fn post_input(title: &str, category: &str, blogger: &str) -> CreateBlogPost {
    CreateBlogPost {
        title: title.to_string(),
        route: None,
        content: Some("<p>It was in the spring of the year 1894 that all London was interested.</p>".to_string()),
        content_md: None,
        content_html: None,
        content_type: None,
        blog_intro: None,
        meta_title: None,
        meta_description: None,
        meta_image: None,
        published: Some(1),
        featured: None,
        blog_category: category.to_string(),
        blogger: blogger.to_string(),
        hide_cta: None,
    }
}

async fn set_published_on(db: &PgPool, id: Uuid, date: chrono::NaiveDate) {
    sqlx::query("UPDATE blog_post SET published_on = $1 WHERE id = $2")
        .bind(date)
        .bind(id)
        .execute(db)
        .await
        .unwrap();
}

// -------------------------------------------------------------------------
// Featured exclusivity and listing order
// -------------------------------------------------------------------------

#[test]
fn featured_save_unfeatures_other_posts_and_listing_orders_them() {
    run_test(async {
        let app = shared_app().await;
        let s = unique();
        let (category, blogger) = seed(&app.db, &s).await;
        let today = Utc::now().date_naive();

        let mut waterloo = post_input(&format!("Waterloo {s}"), &category, &blogger);
        waterloo.featured = Some(1);
        waterloo.meta_image = Some("/img/waterloo.png".to_string());
        let waterloo = BlogPost::create(&app.db, app.state.cache(), waterloo)
            .await
            .unwrap();
        assert_eq!(waterloo.featured, 1);

        // Saving a second featured post must strip the flag from the first.
        let mut abbey = post_input(&format!("Abbey Grange {s}"), &category, &blogger);
        abbey.featured = Some(1);
        abbey.meta_image = Some("/img/abbey.png".to_string());
        let abbey = BlogPost::create(&app.db, app.state.cache(), abbey)
            .await
            .unwrap();

        let waterloo = BlogPost::find_by_id(&app.db, waterloo.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(waterloo.featured, 0);
        let abbey_check = BlogPost::find_by_id(&app.db, abbey.id).await.unwrap().unwrap();
        assert_eq!(abbey_check.featured, 1);

        let copper = BlogPost::create(
            &app.db,
            app.state.cache(),
            post_input(&format!("Copper Beeches {s}"), &category, &blogger),
        )
        .await
        .unwrap();
        let dancing = BlogPost::create(
            &app.db,
            app.state.cache(),
            post_input(&format!("Dancing Men {s}"), &category, &blogger),
        )
        .await
        .unwrap();

        let mut draft = post_input(&format!("Hidden {s}"), &category, &blogger);
        draft.published = Some(0);
        BlogPost::create(&app.db, app.state.cache(), draft)
            .await
            .unwrap();

        // Spread the publish dates; Copper and Dancing share one so the
        // title decides between them.
        set_published_on(&app.db, waterloo.id, today - Duration::days(1)).await;
        set_published_on(&app.db, copper.id, today - Duration::days(2)).await;
        set_published_on(&app.db, dancing.id, today - Duration::days(2)).await;

        let filters = BlogListFilters {
            blog_category: Some(category.clone()),
            ..Default::default()
        };
        let teasers = BlogPost::list_published(&app.db, &filters, 0, 20)
            .await
            .unwrap();

        // Featured first despite the newest dates elsewhere, then newest
        // to oldest, then title; the draft never appears.
        let titles: Vec<&str> = teasers.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(
            titles,
            [
                format!("Abbey Grange {s}"),
                format!("Waterloo {s}"),
                format!("Copper Beeches {s}"),
                format!("Dancing Men {s}"),
            ]
        );
        assert!(teasers[0].featured);
        assert!(!teasers[1].featured);

        // Row post-processing: avatar gets a leading slash, comment phrase
        // reflects the empty thread.
        assert_eq!(teasers[0].avatar, "/avatars/watson.png");
        assert_eq!(teasers[0].comment_text, "No comments yet");
    });
}

// -------------------------------------------------------------------------
// Text filter
// -------------------------------------------------------------------------

#[test]
fn text_filter_matches_title_or_content() {
    run_test(async {
        let app = shared_app().await;
        let s = unique();
        let (category, blogger) = seed(&app.db, &s).await;
        let marker = format!("norbury{s}");

        BlogPost::create(
            &app.db,
            app.state.cache(),
            post_input(&format!("Adventure of {marker}"), &category, &blogger),
        )
        .await
        .unwrap();

        let mut in_body = post_input(&format!("Silver Blaze {s}"), &category, &blogger);
        in_body.content = Some(format!("<p>Whisper the word {marker} in my ear.</p>"));
        BlogPost::create(&app.db, app.state.cache(), in_body)
            .await
            .unwrap();

        BlogPost::create(
            &app.db,
            app.state.cache(),
            post_input(&format!("Unrelated {s}"), &category, &blogger),
        )
        .await
        .unwrap();

        let filters = BlogListFilters {
            txt: Some(marker.clone()),
            ..Default::default()
        };
        let teasers = BlogPost::list_published(&app.db, &filters, 0, 20)
            .await
            .unwrap();

        let titles: Vec<&str> = teasers.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(
            titles,
            [format!("Adventure of {marker}"), format!("Silver Blaze {s}")]
        );
    });
}

// -------------------------------------------------------------------------
// Cache flush on settings change
// -------------------------------------------------------------------------

#[test]
fn settings_store_flushes_tagged_blog_pages() {
    run_test(async {
        let app = shared_app().await;
        let s = unique();
        let cache = app.state.cache();

        let key = page_key(&format!("blog/essays-{s}/cached-page"));
        cache.set(&key, "<html>stale</html>", 0, &[BLOG_TAG]).await;
        assert!(cache.get(&key).await.is_some());

        BlogSettings::default()
            .store(&app.db, cache)
            .await
            .unwrap();

        assert!(cache.get(&key).await.is_none());
    });
}

// -------------------------------------------------------------------------
// HTTP surface
// -------------------------------------------------------------------------

#[test]
fn listing_page_renders_and_drafts_return_not_found() {
    run_test(async {
        let app = shared_app().await;
        let s = unique();
        let (category, blogger) = seed(&app.db, &s).await;

        let mut draft = post_input(&format!("Unpublished Memoir {s}"), &category, &blogger);
        draft.published = Some(0);
        let draft = BlogPost::create(&app.db, app.state.cache(), draft)
            .await
            .unwrap();

        let response = app
            .request(Request::get("/health").body(Body::empty()).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .request(Request::get("/blog").body(Body::empty()).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let uri = format!("/blog/{}", draft.route);
        let response = app
            .request(Request::get(uri.as_str()).body(Body::empty()).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .request(
                Request::get("/blog/nowhere/no-such-post")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    });
}
