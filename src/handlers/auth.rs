use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::auth::{
    generate_state, issue_session_token, removal_cookie, repository_credential, resolve_session,
    session_cookie, state_cookie, Session, OAUTH_STATE_COOKIE, SESSION_COOKIE,
};
use crate::error::AppError;
use crate::models::user::{IdentityProvider, SessionResponse};
use crate::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Configured provider named by a path segment
fn configured_provider(state: &AppState, name: &str) -> Result<IdentityProvider, AppError> {
    let provider = name
        .parse::<IdentityProvider>()
        .map_err(|_| AppError::NotFound(format!("Unknown sign-in provider '{}'", name)))?;
    if state.oauth.app(provider).is_none() {
        return Err(AppError::NotFound(format!("{} sign-in is not configured", provider)));
    }
    Ok(provider)
}

/// Start an OAuth sign-in
#[utoipa::path(
    get,
    path = "/api/auth/signin/{provider}",
    tag = "auth",
    params(("provider" = String, Path, description = "`github` or `google`")),
    responses(
        (status = 303, description = "Redirect to the provider"),
        (status = 404, description = "Unknown or unconfigured provider")
    )
)]
pub async fn signin(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    let provider = configured_provider(&state, &provider)?;
    let csrf_state = generate_state();
    let url = state.oauth.authorize_url(provider, &csrf_state)?;

    let jar = jar.add(state_cookie(csrf_state, &state.config.auth));
    Ok((jar, Redirect::to(&url)))
}

/// Complete an OAuth sign-in and establish the session
#[utoipa::path(
    get,
    path = "/api/auth/callback/{provider}",
    tag = "auth",
    params(
        ("provider" = String, Path, description = "`github` or `google`"),
        CallbackQuery
    ),
    responses(
        (status = 303, description = "Signed in, redirect to the application"),
        (status = 400, description = "State mismatch or provider error"),
        (status = 404, description = "Unknown or unconfigured provider")
    )
)]
pub async fn callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    let provider = configured_provider(&state, &provider)?;

    if let Some(error) = query.error {
        return Err(AppError::Validation(format!("Sign-in was not completed: {}", error)));
    }

    let expected = jar.get(OAUTH_STATE_COOKIE).map(|c| c.value().to_string());
    match (expected.as_deref(), query.state.as_deref()) {
        (Some(expected), Some(received)) if expected == received => {}
        _ => {
            tracing::warn!("OAuth state mismatch for {} callback", provider);
            return Err(AppError::Validation("Invalid OAuth state".to_string()));
        }
    }

    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::Validation("Missing authorization code".to_string()))?;

    let signed_in = state.oauth.complete_sign_in(provider, &code).await?;
    let user = state.store.upsert_user(&signed_in.user).await?;
    if provider == IdentityProvider::GitHub {
        state
            .store
            .save_access_token(&user.id, &signed_in.access_token)
            .await?;
    }

    let session = Session {
        user_id: user.id,
        name: user.name,
        email: user.email,
        provider,
    };
    let token = issue_session_token(&session, &state.config.auth)?;

    let jar = jar
        .remove(removal_cookie(OAUTH_STATE_COOKIE, "/api/auth"))
        .add(session_cookie(token, &state.config.auth));
    Ok((jar, Redirect::to("/")))
}

/// Current session principal
#[utoipa::path(
    get,
    path = "/api/auth/session",
    tag = "auth",
    responses(
        (status = 200, description = "Active session", body = SessionResponse),
        (status = 401, description = "No valid session")
    )
)]
pub async fn session(
    State(state): State<AppState>,
    jar: CookieJar,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = resolve_session(&jar, bearer.as_ref(), &state.config.auth)?;
    let credential = repository_credential(state.store.as_ref(), &session).await?;
    Ok(Json(session.to_response(credential.is_some())))
}

/// Clear the session cookie
#[utoipa::path(
    post,
    path = "/api/auth/signout",
    tag = "auth",
    responses((status = 204, description = "Signed out"))
)]
pub async fn signout(jar: CookieJar) -> Response {
    let jar = jar.remove(removal_cookie(SESSION_COOKIE, "/"));
    (jar, StatusCode::NO_CONTENT).into_response()
}
