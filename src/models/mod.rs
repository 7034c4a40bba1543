pub mod document;
pub mod repository;
pub mod user;
