use anyhow::{Context, Result};
use axum::http::{header, HeaderName, HeaderValue};
use axum::Router;
use std::sync::Arc;
use tower_http::set_header::SetResponseHeaderLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod config;
pub mod database;
pub mod db;
pub mod error;
pub mod generation;
pub mod github;
pub mod handlers;
pub mod models;
pub mod oauth;
pub mod openapi;
pub mod pipeline;
pub mod rate_limit;
pub mod routes;

use config::Settings;
use database::Store;
use generation::{GeminiClient, TextGenerator};
use github::{GitHubClient, RepositoryHost};
use oauth::OAuthClient;
use rate_limit::{FixedWindowLimiter, RateLimiter};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub store: Arc<dyn Store>,
    pub github: Arc<dyn RepositoryHost>,
    /// Absent when no model API key is configured
    pub generator: Option<Arc<dyn TextGenerator>>,
    pub rate_limiter: Arc<dyn RateLimiter>,
    pub oauth: Arc<OAuthClient>,
}

impl AppState {
    /// Wire the production clients for `settings` around `store`
    pub fn from_settings(settings: Settings, store: Arc<dyn Store>) -> Result<Self> {
        let github = GitHubClient::new(&settings.github).context("Failed to build GitHub client")?;
        let generator = GeminiClient::from_settings(&settings.gemini)
            .context("Failed to build Gemini client")?
            .map(|client| Arc::new(client) as Arc<dyn TextGenerator>);
        if generator.is_none() {
            tracing::warn!("GEMINI_API_KEY is not set, documentation generation is disabled");
        }
        let rate_limiter = FixedWindowLimiter::from_settings(&settings.rate_limit);
        let oauth = OAuthClient::new(&settings)?;

        Ok(Self {
            config: Arc::new(settings),
            store,
            github: Arc::new(github),
            generator,
            rate_limiter: Arc::new(rate_limiter),
            oauth: Arc::new(oauth),
        })
    }
}

fn content_security_policy(settings: &Settings) -> String {
    format!(
        "default-src 'self'; script-src 'self' 'unsafe-inline'; style-src 'self' 'unsafe-inline'; \
         img-src 'self' data: https:; connect-src 'self' {} {}; frame-ancestors 'none'",
        settings.github.api_url, settings.gemini.api_url
    )
}

/// Create the main Axum application router
pub fn create_app(state: AppState) -> Router {
    let openapi = openapi::ApiDoc::openapi();
    let csp = HeaderValue::from_str(&content_security_policy(&state.config))
        .unwrap_or_else(|_| HeaderValue::from_static("default-src 'self'"));

    Router::new()
        .nest("/api", routes::api::api_router())
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-xss-protection"),
            HeaderValue::from_static("1; mode=block"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            csp,
        ))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}
