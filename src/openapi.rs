use utoipa::OpenApi;
use crate::handlers::{auth, documents, github, health};
use crate::models::document::{
    Document, DocumentListResponse, DocumentSummary, GenerateRequest, GenerateResponse,
};
use crate::models::repository::{RepositoryListResponse, RepositorySummary};
use crate::models::user::{IdentityProvider, SessionResponse, SessionUser};
use crate::pipeline::options::GenerationOptions;

/// Generate the OpenAPI documentation for the entire API
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health endpoints
        health::check,

        // Auth endpoints
        auth::signin,
        auth::callback,
        auth::session,
        auth::signout,

        // Document endpoints
        documents::generate,
        documents::list,
        documents::get,

        // GitHub endpoints
        github::repositories,
    ),
    components(
        schemas(
            // Health schemas
            health::HealthResponse,
            health::HealthChecks,

            // Session schemas
            IdentityProvider,
            SessionResponse,
            SessionUser,

            // Document schemas
            Document,
            DocumentSummary,
            DocumentListResponse,
            GenerateRequest,
            GenerateResponse,
            GenerationOptions,

            // Repository schemas
            RepositorySummary,
            RepositoryListResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "OAuth sign-in and session endpoints"),
        (name = "documents", description = "Documentation generation and retrieval"),
        (name = "github", description = "Repository listing for GitHub sessions"),
    )
)]
pub struct ApiDoc;
