use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::Store;
use crate::models::document::{Document, DocumentSummary, NewDocument};
use crate::models::user::{NewUser, User};

/// Process-local store, used without `DATABASE_URL` and in tests
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, User>>,
    access_tokens: RwLock<HashMap<String, String>>,
    documents: RwLock<Vec<Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn upsert_user(&self, user: &NewUser) -> Result<User> {
        let now = Utc::now();
        let mut users = self.users.write().await;
        let stored = users
            .entry(user.id.clone())
            .and_modify(|existing| {
                existing.name = user.name.clone();
                existing.email = user.email.clone();
                existing.image = user.image.clone();
                existing.updated_at = now;
            })
            .or_insert_with(|| User {
                id: user.id.clone(),
                provider: user.provider.as_str().to_string(),
                name: user.name.clone(),
                email: user.email.clone(),
                image: user.image.clone(),
                created_at: now,
                updated_at: now,
            });
        Ok(stored.clone())
    }

    async fn save_access_token(&self, user_id: &str, access_token: &str) -> Result<()> {
        if !self.users.read().await.contains_key(user_id) {
            bail!("Unknown user '{}'", user_id);
        }
        self.access_tokens
            .write()
            .await
            .insert(user_id.to_string(), access_token.to_string());
        Ok(())
    }

    async fn access_token(&self, user_id: &str) -> Result<Option<String>> {
        Ok(self.access_tokens.read().await.get(user_id).cloned())
    }

    async fn create_document(&self, document: NewDocument) -> Result<Document> {
        if !self.users.read().await.contains_key(&document.user_id) {
            bail!("Unknown document owner '{}'", document.user_id);
        }

        let now = Utc::now();
        let created = Document {
            id: Uuid::new_v4(),
            title: document.title,
            content: document.content,
            user_id: document.user_id,
            created_at: now,
            updated_at: now,
        };
        self.documents.write().await.push(created.clone());
        Ok(created)
    }

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>> {
        Ok(self
            .documents
            .read()
            .await
            .iter()
            .find(|d| d.id == id)
            .cloned())
    }

    async fn list_documents(&self, user_id: &str) -> Result<Vec<DocumentSummary>> {
        // Insertion order is creation order
        Ok(self
            .documents
            .read()
            .await
            .iter()
            .rev()
            .filter(|d| d.user_id == user_id)
            .map(DocumentSummary::from)
            .collect())
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
