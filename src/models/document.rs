use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::pipeline::options::GenerationOptions;

/// Generated documentation owned by a single user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub title: String,
    pub content: String,
    pub user_id: String,
}

/// Document listing entry, without the content body
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Document> for DocumentSummary {
    fn from(document: &Document) -> Self {
        Self {
            id: document.id,
            title: document.title.clone(),
            created_at: document.created_at,
            updated_at: document.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentSummary>,
}

/// Body of `POST /api/documents/generate`
///
/// Exactly one mode is used: `code` + `fileType`, then `repository`, then `prompt`.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    /// `owner/repo`
    pub repository: Option<String>,
    /// Branch to read instead of the repository's default branch
    pub branch: Option<String>,
    pub prompt: Option<String>,
    pub code: Option<String>,
    pub file_type: Option<String>,
    pub file_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub options: GenerationOptions,
}

/// `"options": null` behaves like an absent field
fn null_as_default<'de, D>(deserializer: D) -> Result<GenerationOptions, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<GenerationOptions>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub document: Document,
    pub content: String,
    pub repository: Option<String>,
    pub generated_at: DateTime<Utc>,
    /// True when the static fallback document was substituted
    pub fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_options_fall_back_to_defaults() {
        let request: GenerateRequest =
            serde_json::from_str(r#"{"repository":"octocat/Hello-World","options":null}"#).unwrap();
        assert_eq!(request.options, GenerationOptions::default());

        let request: GenerateRequest =
            serde_json::from_str(r#"{"prompt":"x","options":{"depth":"basic"}}"#).unwrap();
        assert_eq!(request.options.depth.as_deref(), Some("basic"));
    }
}
