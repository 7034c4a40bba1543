use crate::handlers;
use crate::AppState;
use axum::{routing::get, Router};

pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::check))
        // Mount auth routes under /auth prefix
        .nest("/auth", super::auth::auth_router())
        .nest("/documents", super::documents::documents_router())
        .nest("/github", super::github::github_router())
}
