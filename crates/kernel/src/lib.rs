//! Taccuino blog engine kernel library.
//!
//! Exposes the content pipeline, models, and route builders for the
//! `taccuino` binary and for integration testing.

pub mod cache;
pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod session;
pub mod state;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;
