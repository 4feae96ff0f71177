//! HTTP route handlers.

pub mod blog;
pub mod blog_list;
pub mod health;
