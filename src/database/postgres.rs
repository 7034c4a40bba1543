use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::Store;
use crate::models::document::{Document, DocumentSummary, NewDocument};
use crate::models::user::{NewUser, User};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn upsert_user(&self, user: &NewUser) -> Result<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, provider, name, email, image)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (id) DO UPDATE
             SET name = EXCLUDED.name, email = EXCLUDED.email, image = EXCLUDED.image, updated_at = NOW()
             RETURNING id, provider, name, email, image, created_at, updated_at",
        )
        .bind(&user.id)
        .bind(user.provider.as_str())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.image)
        .fetch_one(&self.pool)
        .await
        .context("Failed to upsert user")
    }

    async fn save_access_token(&self, user_id: &str, access_token: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO provider_credentials (user_id, access_token)
             VALUES ($1, $2)
             ON CONFLICT (user_id) DO UPDATE
             SET access_token = EXCLUDED.access_token, updated_at = NOW()",
        )
        .bind(user_id)
        .bind(access_token)
        .execute(&self.pool)
        .await
        .context("Failed to save access token")?;
        Ok(())
    }

    async fn access_token(&self, user_id: &str) -> Result<Option<String>> {
        sqlx::query_scalar::<_, String>("SELECT access_token FROM provider_credentials WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch access token")
    }

    async fn create_document(&self, document: NewDocument) -> Result<Document> {
        let created = sqlx::query_as::<_, Document>(
            "INSERT INTO documents (id, title, content, user_id)
             VALUES ($1, $2, $3, $4)
             RETURNING id, title, content, user_id, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(&document.title)
        .bind(&document.content)
        .bind(&document.user_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to create document")?;

        tracing::info!("Created document {} for user {}", created.id, created.user_id);
        Ok(created)
    }

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>> {
        sqlx::query_as::<_, Document>(
            "SELECT id, title, content, user_id, created_at, updated_at FROM documents WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch document")
    }

    async fn list_documents(&self, user_id: &str) -> Result<Vec<DocumentSummary>> {
        sqlx::query_as::<_, DocumentSummary>(
            "SELECT id, title, created_at, updated_at
             FROM documents WHERE user_id = $1
             ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list documents")
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database health check failed")?;
        Ok(())
    }
}
