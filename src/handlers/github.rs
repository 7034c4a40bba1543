use axum::extract::State;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;

use crate::auth::{require_repository_credential, resolve_session};
use crate::error::AppError;
use crate::models::repository::RepositoryListResponse;
use crate::AppState;

/// Repositories of the signed-in GitHub user, most recently updated first
#[utoipa::path(
    get,
    path = "/api/github/repositories",
    tag = "github",
    responses(
        (status = 200, description = "Repository list", body = RepositoryListResponse),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Session has no GitHub credential"),
        (status = 502, description = "GitHub request failed")
    )
)]
pub async fn repositories(
    State(state): State<AppState>,
    jar: CookieJar,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<Json<RepositoryListResponse>, AppError> {
    let session = resolve_session(&jar, bearer.as_ref(), &state.config.auth)?;
    let token = require_repository_credential(state.store.as_ref(), &session).await?;

    let repositories = state.github.list_repositories(&token).await?;
    tracing::debug!(
        "Listed {} repositories for {}",
        repositories.len(),
        session.user_id
    );

    Ok(Json(RepositoryListResponse { repositories }))
}
