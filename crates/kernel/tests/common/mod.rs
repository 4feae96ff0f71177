#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Shared harness for database-backed integration tests.
//!
//! A single [`TestApp`] wrapping the real `AppState` is shared by every
//! test in the binary. It is initialized on a long-lived multi-thread
//! runtime so pooled Postgres and Redis connections stay valid across
//! individual tests.

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use sqlx::PgPool;
use tower::ServiceExt;

use taccuino_kernel::{AppState, Config, routes, session};

/// Long-lived runtime shared by every test in the binary.
///
/// Connections opened on a per-test runtime become invalid when that
/// runtime shuts down, so all test bodies run here via [`run_test`].
pub static SHARED_RT: std::sync::LazyLock<tokio::runtime::Runtime> =
    std::sync::LazyLock::new(|| {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .expect("failed to build shared test runtime")
    });

/// Global shared test app, initialized once on the shared runtime.
static SHARED_APP: std::sync::OnceLock<TestApp> = std::sync::OnceLock::new();

/// Get the shared [`TestApp`], initializing it on first call.
pub async fn shared_app() -> &'static TestApp {
    SHARED_APP.get_or_init(|| {
        // Initialize on a separate OS thread to avoid nested block_on.
        let handle = SHARED_RT.handle().clone();
        std::thread::spawn(move || handle.block_on(TestApp::new()))
            .join()
            .expect("TestApp init thread panicked")
    })
}

/// Run an async test body on [`SHARED_RT`].
pub fn run_test<F: std::future::Future<Output = ()> + Send>(f: F) {
    SHARED_RT.block_on(f);
}

/// Test application wrapper using the real router and state.
pub struct TestApp {
    router: Router,
    pub db: PgPool,
    pub state: AppState,
}

impl TestApp {
    /// Create a test application with full kernel initialization.
    pub async fn new() -> Self {
        dotenvy::dotenv().ok();

        // Tests run from crates/kernel/; point at its templates directory
        // unless the environment already says otherwise.
        if std::env::var("TEMPLATES_DIR").is_err() {
            let manifest_dir =
                std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
            let templates_dir = std::path::Path::new(&manifest_dir).join("templates");
            // SAFETY: set before any thread reads the environment.
            unsafe { std::env::set_var("TEMPLATES_DIR", templates_dir) };
        }

        let config = Config::from_env().expect("failed to load config");

        let state = AppState::new(&config)
            .await
            .expect("failed to initialize AppState");
        let db = state.db().clone();

        let session_layer = session::create_session_layer(
            &config.redis_url,
            tower_sessions::cookie::SameSite::Strict,
        )
        .await
        .expect("failed to create session layer");

        // Must match the router built in main.rs.
        let router = Router::new()
            .merge(routes::blog_list::router())
            .merge(routes::blog::router())
            .merge(routes::health::router())
            .layer(session_layer)
            .with_state(state.clone());

        Self { router, db, state }
    }

    /// Send a request to the test application.
    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("failed to send request")
    }
}
