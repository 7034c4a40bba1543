use crate::handlers::documents;
use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn documents_router() -> Router<AppState> {
    Router::new()
        .route("/", get(documents::list))
        .route("/generate", post(documents::generate))
        .route("/:id", get(documents::get))
}
