use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use chrono::Utc;
use uuid::Uuid;

use crate::auth::{require_repository_credential, resolve_session, Session};
use crate::error::AppError;
use crate::generation::{generate_document, generate_title, GenerationError, GenerationParams, TextGenerator};
use crate::models::document::{
    Document, DocumentListResponse, GenerateRequest, GenerateResponse, NewDocument,
};
use crate::models::repository::RepositoryRef;
use crate::models::user::NewUser;
use crate::pipeline::document_repository;
use crate::pipeline::prompt::build_code_prompt;
use crate::AppState;

/// Generation mode chosen from the request body
#[derive(Debug)]
enum GenerationMode {
    Code {
        code: String,
        file_type: String,
        file_name: Option<String>,
    },
    Repository(RepositoryRef),
    Prompt(String),
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Pick the mode: code with a file type first, then repository, then prompt
fn select_mode(request: &GenerateRequest) -> Result<GenerationMode, AppError> {
    if let (Some(code), Some(file_type)) = (non_empty(&request.code), non_empty(&request.file_type)) {
        return Ok(GenerationMode::Code {
            code: code.to_string(),
            file_type: file_type.trim().to_string(),
            file_name: non_empty(&request.file_name).map(|n| n.trim().to_string()),
        });
    }

    if let Some(repository) = non_empty(&request.repository) {
        let repo = repository.parse::<RepositoryRef>().map_err(AppError::Validation)?;
        return Ok(GenerationMode::Repository(repo));
    }

    match &request.prompt {
        Some(prompt) if prompt.trim().is_empty() => {
            Err(AppError::Validation("Prompt cannot be empty".to_string()))
        }
        Some(prompt) => Ok(GenerationMode::Prompt(prompt.clone())),
        None => Err(AppError::Validation(
            "Repository, code, or prompt is required".to_string(),
        )),
    }
}

fn require_generator(state: &AppState) -> Result<&dyn TextGenerator, AppError> {
    state
        .generator
        .as_deref()
        .ok_or(AppError::Generation(GenerationError::ModelUnconfigured))
}

async fn persist(state: &AppState, session: &Session, title: String, content: String) -> Result<Document, AppError> {
    // The session may outlive the stored profile, so refresh it first
    state
        .store
        .upsert_user(&NewUser {
            id: session.user_id.clone(),
            provider: session.provider,
            name: session.name.clone(),
            email: session.email.clone(),
            image: None,
        })
        .await?;

    let document = state
        .store
        .create_document(NewDocument {
            title,
            content,
            user_id: session.user_id.clone(),
        })
        .await?;
    Ok(document)
}

/// Generate documentation and store it for the caller
#[utoipa::path(
    post,
    path = "/api/documents/generate",
    tag = "documents",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Documentation generated", body = GenerateResponse),
        (status = 400, description = "Invalid request body"),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Repository mode without a GitHub credential"),
        (status = 429, description = "Rate limit exceeded"),
        (status = 500, description = "Generation unavailable or failed")
    )
)]
pub async fn generate(
    State(state): State<AppState>,
    jar: CookieJar,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, AppError> {
    let session = resolve_session(&jar, bearer.as_ref(), &state.config.auth)?;

    if !state.rate_limiter.allow(&session.user_id) {
        return Err(AppError::RateLimited);
    }

    let Json(request) = body.map_err(|e| {
        tracing::debug!("Rejected generate body: {}", e);
        AppError::Validation("Invalid JSON in request body".to_string())
    })?;

    let mode = select_mode(&request)?;
    let options = &request.options;
    let params = GenerationParams::clamped(options.temperature, options.max_output_tokens);

    let (title, content, repository, notice) = match mode {
        GenerationMode::Code {
            code,
            file_type,
            file_name,
        } => {
            let generator = require_generator(&state)?;
            let prompt = build_code_prompt(&code, &file_type, file_name.as_deref());
            let content = generate_document(generator, &prompt, &params).await?;
            let title = match file_name {
                Some(name) => format!("{} Documentation", name),
                None => format!("{} Code Documentation", file_type),
            };
            (title, content, None, None)
        }
        GenerationMode::Repository(repo) => {
            let token = require_repository_credential(state.store.as_ref(), &session).await?;
            let generator = require_generator(&state)?;
            let branch = non_empty(&request.branch).map(str::trim);
            let outcome =
                document_repository(state.github.as_ref(), generator, &token, &repo, branch, options).await;
            let title = format!("{} Documentation", repo.repo);
            (title, outcome.content, Some(repo.full_name()), outcome.notice)
        }
        GenerationMode::Prompt(prompt) => {
            let generator = require_generator(&state)?;
            let content = generate_document(generator, &prompt, &params).await?;
            let title = generate_title(generator, &content).await;
            (title, content, None, None)
        }
    };

    let document = persist(&state, &session, title, content.clone()).await?;
    tracing::info!(
        "Generated document {} for user {} (fallback: {})",
        document.id,
        session.user_id,
        notice.is_some()
    );

    Ok(Json(GenerateResponse {
        document,
        content,
        repository,
        generated_at: Utc::now(),
        fallback: notice.is_some(),
        notice,
    }))
}

/// List the caller's documents, newest first
#[utoipa::path(
    get,
    path = "/api/documents",
    tag = "documents",
    responses(
        (status = 200, description = "Caller's documents", body = DocumentListResponse),
        (status = 401, description = "No valid session")
    )
)]
pub async fn list(
    State(state): State<AppState>,
    jar: CookieJar,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<Json<DocumentListResponse>, AppError> {
    let session = resolve_session(&jar, bearer.as_ref(), &state.config.auth)?;
    let documents = state.store.list_documents(&session.user_id).await?;

    Ok(Json(DocumentListResponse { documents }))
}

/// Fetch one document owned by the caller
#[utoipa::path(
    get,
    path = "/api/documents/{id}",
    tag = "documents",
    params(("id" = String, Path, description = "Document id")),
    responses(
        (status = 200, description = "Document", body = Document),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Document belongs to another user"),
        (status = 404, description = "Document not found")
    )
)]
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
    jar: CookieJar,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<Json<Document>, AppError> {
    let session = resolve_session(&jar, bearer.as_ref(), &state.config.auth)?;
    let not_found = || AppError::NotFound("Document not found".to_string());

    let id = Uuid::parse_str(&id).map_err(|_| not_found())?;
    let document = state.store.get_document(id).await?.ok_or_else(not_found)?;

    if document.user_id != session.user_id {
        tracing::warn!(
            "User {} attempted to read document {} owned by another user",
            session.user_id,
            id
        );
        return Err(AppError::Forbidden);
    }

    Ok(Json(document))
}
