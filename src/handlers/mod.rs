// Handlers module
pub mod auth;
pub mod documents;
pub mod github;
pub mod health;
