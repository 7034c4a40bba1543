use axum::{
    routing::{get, post},
    Router,
};
use crate::handlers::auth;
use crate::AppState;

pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/signin/:provider", get(auth::signin))
        .route("/callback/:provider", get(auth::callback))
        .route("/session", get(auth::session))
        .route("/signout", post(auth::signout))
}
