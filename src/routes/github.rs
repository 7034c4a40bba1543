use crate::handlers::github;
use crate::AppState;
use axum::{routing::get, Router};

pub fn github_router() -> Router<AppState> {
    Router::new().route("/repositories", get(github::repositories))
}
