// Routes module
pub mod api;
pub mod auth;
pub mod documents;
pub mod github;
