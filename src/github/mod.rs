use async_trait::async_trait;

use crate::models::repository::{RepositoryMetadata, RepositoryRef, RepositorySummary};

pub mod client;
pub mod pacer;

pub use client::GitHubClient;
pub use pacer::RequestPacer;

#[derive(Debug, thiserror::Error)]
pub enum GitHubError {
    #[error("Repository '{0}' not found")]
    RepositoryNotFound(String),
    #[error("File '{0}' not found")]
    FileNotFound(String),
    #[error("Access denied. Check repository permissions and access token.")]
    AccessDenied,
    #[error("Unauthorized. Invalid or expired access token.")]
    Unauthorized,
    #[error("GitHub API rate limit exceeded")]
    RateLimited,
    #[error("GitHub request timed out")]
    FetchTimeout,
    #[error("Path '{0}' is not a file")]
    NotAFile(String),
    #[error("Failed to decode GitHub response: {0}")]
    Decode(String),
    #[error("GitHub API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Invalid GitHub API URL: {0}")]
    InvalidUrl(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl GitHubError {
    /// Message suitable for showing to the end user
    pub fn user_message(&self) -> String {
        match self {
            GitHubError::FetchTimeout => "Repository analysis timed out. The repository might be too large or the GitHub API is slow.".to_string(),
            GitHubError::RepositoryNotFound(_) => {
                "Repository not found or you don't have access to it.".to_string()
            }
            GitHubError::RateLimited => {
                "GitHub API rate limit exceeded. Please try again later.".to_string()
            }
            GitHubError::AccessDenied | GitHubError::Unauthorized => self.to_string(),
            other => format!("Failed to analyze repository: {}", other),
        }
    }
}

/// Read access to a repository-hosting service on behalf of an end user
#[async_trait]
pub trait RepositoryHost: Send + Sync + 'static {
    async fn repository_info(
        &self,
        token: &str,
        repo: &RepositoryRef,
    ) -> Result<RepositoryMetadata, GitHubError>;

    /// Blob paths of the recursive tree at `branch`, in API order
    async fn repository_tree(
        &self,
        token: &str,
        repo: &RepositoryRef,
        branch: &str,
    ) -> Result<Vec<String>, GitHubError>;

    /// Decoded text content of a single file
    async fn file_content(
        &self,
        token: &str,
        repo: &RepositoryRef,
        path: &str,
        branch: &str,
    ) -> Result<String, GitHubError>;

    async fn list_repositories(&self, token: &str) -> Result<Vec<RepositorySummary>, GitHubError>;
}
