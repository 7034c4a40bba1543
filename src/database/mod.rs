use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::document::{Document, DocumentSummary, NewDocument};
use crate::models::user::{NewUser, User};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Persistence backend for users and generated documents
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Insert the user or refresh their profile fields
    async fn upsert_user(&self, user: &NewUser) -> Result<User>;

    /// Remember the repository-hosting access token obtained at sign-in
    async fn save_access_token(&self, user_id: &str, access_token: &str) -> Result<()>;

    async fn access_token(&self, user_id: &str) -> Result<Option<String>>;

    async fn create_document(&self, document: NewDocument) -> Result<Document>;

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>>;

    /// Documents owned by `user_id`, newest first
    async fn list_documents(&self, user_id: &str) -> Result<Vec<DocumentSummary>>;

    async fn health_check(&self) -> Result<()>;
}
