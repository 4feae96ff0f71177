//! Database models for the blog engine.

pub mod blog_category;
pub mod blog_post;
pub mod blog_settings;
pub mod blogger;
pub mod comment;
pub mod feedback;

pub use blog_category::{BlogCategory, CategoryNav};
pub use blog_post::{BlogListFilters, BlogPost, BlogTeaser, CreateBlogPost, UpdateBlogPost};
pub use blog_settings::BlogSettings;
pub use blogger::{Blogger, normalize_avatar};
pub use comment::{Comment, CreateComment, comment_count_text};
pub use feedback::Feedback;
