//! HTTP server setup and routing

use crate::vote::VoteService;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use sqlx::{Pool, Sqlite};
use tower_http::cors::CorsLayer;

/// Shared application context passed to all handlers
///
/// AppContext implements Clone, which gives us `FromRef<AppContext>`
/// for free via Axum's blanket implementation, so custom extractors
/// (the bearer-token identity) can access it.
#[derive(Clone)]
pub struct AppContext {
    pub db_pool: Pool<Sqlite>,
    pub votes: VoteService,
    /// Token signing secret, loaded once at startup from the settings table
    pub token_secret: i64,
    /// Request body cap, loaded from the `http_max_body_size_bytes` setting
    pub max_body_bytes: usize,
}

impl AppContext {
    pub fn new(db_pool: Pool<Sqlite>, token_secret: i64, max_body_bytes: usize) -> Self {
        let votes = VoteService::new(db_pool.clone());
        Self {
            db_pool,
            votes,
            token_secret,
            max_body_bytes,
        }
    }
}

/// Build the router with all routes
///
/// Vote totals are public; casting requires a bearer token resolved by
/// the identity extractor in the handlers.
pub fn create_router(ctx: AppContext) -> Router {
    let max_body_bytes = ctx.max_body_bytes;
    Router::new()
        // Health endpoint
        .route("/health", get(super::handlers::health))
        // Vote casting (authenticated, self only)
        .route(
            "/vote/thread/:thread_id/:user_id",
            post(super::handlers::cast_thread_vote),
        )
        .route(
            "/vote/comment/:comment_id/:user_id",
            post(super::handlers::cast_comment_vote),
        )
        // Vote totals (public)
        .route("/vote/thread/:thread_id", get(super::handlers::thread_totals))
        .route(
            "/vote/comment/:comment_id",
            get(super::handlers::comment_totals),
        )
        // Attach application context
        .with_state(ctx)
        // Cap request bodies at the configured size
        .layer(DefaultBodyLimit::max(max_body_bytes))
        // Enable CORS for browser frontends
        .layer(CorsLayer::permissive())
}
