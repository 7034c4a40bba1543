//! Repository-to-documentation pipeline: context fetch, key-file selection,
//! bounded content fetch, prompt assembly, model call and fallback.

use tracing::{info, warn};

use crate::generation::{generate_document, GenerationError, GenerationParams, TextGenerator};
use crate::github::{GitHubError, RepositoryHost};
use crate::models::repository::RepositoryRef;

pub mod content;
pub mod context;
pub mod fallback;
pub mod options;
pub mod prompt;
pub mod selector;

use content::fetch_key_files;
use context::fetch_repository_context;
use fallback::fallback_document;
use options::GenerationOptions;
use prompt::build_repository_prompt;
use selector::select_key_files;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] GitHubError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

impl PipelineError {
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::Fetch(e) => e.user_message(),
            PipelineError::Generation(e) => format!("Failed to generate documentation: {}", e),
        }
    }
}

/// Outcome of documenting a repository
#[derive(Debug, Clone)]
pub struct RepositoryDocumentation {
    pub content: String,
    /// Set when the fallback document was substituted; explains why
    pub notice: Option<String>,
}

impl RepositoryDocumentation {
    pub fn is_fallback(&self) -> bool {
        self.notice.is_some()
    }
}

/// Run every pipeline stage up to the model call
pub async fn generate_repository_docs(
    host: &dyn RepositoryHost,
    generator: &dyn TextGenerator,
    token: &str,
    repo: &RepositoryRef,
    branch: Option<&str>,
    options: &GenerationOptions,
) -> Result<String, PipelineError> {
    let context = fetch_repository_context(host, token, repo, branch).await?;

    let key_files = select_key_files(&context.tree);
    let files = fetch_key_files(host, token, repo, &context.branch, &key_files).await;
    info!(
        "Fetched {} of {} key files for {}",
        files.len(),
        key_files.len(),
        repo
    );

    let prompt = build_repository_prompt(repo, &context.metadata, &context.tree, &files, options);
    let params = GenerationParams::clamped(options.temperature, options.max_output_tokens);

    info!("Generating documentation for {}", repo);
    Ok(generate_document(generator, &prompt, &params).await?)
}

/// Document a repository, substituting the fallback document on any failure
pub async fn document_repository(
    host: &dyn RepositoryHost,
    generator: &dyn TextGenerator,
    token: &str,
    repo: &RepositoryRef,
    branch: Option<&str>,
    options: &GenerationOptions,
) -> RepositoryDocumentation {
    match generate_repository_docs(host, generator, token, repo, branch, options).await {
        Ok(content) => RepositoryDocumentation {
            content,
            notice: None,
        },
        Err(e) => {
            warn!("Repository documentation failed for {}, using fallback: {}", repo, e);
            RepositoryDocumentation {
                content: fallback_document(repo),
                notice: Some(e.user_message()),
            }
        }
    }
}
