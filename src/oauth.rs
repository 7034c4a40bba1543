//! OAuth authorization-code flow for the supported identity providers.

use anyhow::{bail, Context, Result};
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::config::{OAuthAppSettings, Settings};
use crate::models::user::{IdentityProvider, NewUser};

const GITHUB_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const GITHUB_SCOPE: &str = "read:user user:email repo";

const GOOGLE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";
const GOOGLE_SCOPE: &str = "openid email profile";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubProfile {
    id: u64,
    login: String,
    name: Option<String>,
    email: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleProfile {
    sub: String,
    name: Option<String>,
    email: Option<String>,
    picture: Option<String>,
}

/// Result of a completed sign-in
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub user: NewUser,
    pub access_token: String,
}

pub struct OAuthClient {
    http: Client,
    public_url: String,
    github_api_url: String,
    github: Option<OAuthAppSettings>,
    google: Option<OAuthAppSettings>,
}

impl OAuthClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("gitdocify/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build OAuth HTTP client")?;

        Ok(Self {
            http,
            public_url: settings.server.public_url.clone(),
            github_api_url: settings.github.api_url.clone(),
            github: settings.auth.github.clone(),
            google: settings.auth.google.clone(),
        })
    }

    /// App credentials for `provider`, when configured
    pub fn app(&self, provider: IdentityProvider) -> Option<&OAuthAppSettings> {
        match provider {
            IdentityProvider::GitHub => self.github.as_ref(),
            IdentityProvider::Google => self.google.as_ref(),
        }
    }

    pub fn redirect_uri(&self, provider: IdentityProvider) -> String {
        format!("{}/api/auth/callback/{}", self.public_url, provider)
    }

    /// Provider authorization URL carrying `state`
    pub fn authorize_url(&self, provider: IdentityProvider, state: &str) -> Result<String> {
        let app = self
            .app(provider)
            .with_context(|| format!("{} sign-in is not configured", provider))?;
        let redirect_uri = self.redirect_uri(provider);

        let mut url = match provider {
            IdentityProvider::GitHub => Url::parse(GITHUB_AUTHORIZE_URL)?,
            IdentityProvider::Google => Url::parse(GOOGLE_AUTHORIZE_URL)?,
        };
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", &app.client_id)
                .append_pair("redirect_uri", &redirect_uri)
                .append_pair("state", state);
            match provider {
                IdentityProvider::GitHub => {
                    query.append_pair("scope", GITHUB_SCOPE);
                }
                IdentityProvider::Google => {
                    query
                        .append_pair("scope", GOOGLE_SCOPE)
                        .append_pair("response_type", "code")
                        .append_pair("prompt", "consent")
                        .append_pair("access_type", "offline");
                }
            }
        }
        Ok(url.into())
    }

    /// Exchange an authorization code for an access token
    pub async fn exchange_code(&self, provider: IdentityProvider, code: &str) -> Result<String> {
        let app = self
            .app(provider)
            .with_context(|| format!("{} sign-in is not configured", provider))?;
        let redirect_uri = self.redirect_uri(provider);
        let token_url = match provider {
            IdentityProvider::GitHub => GITHUB_TOKEN_URL,
            IdentityProvider::Google => GOOGLE_TOKEN_URL,
        };

        let form = [
            ("client_id", app.client_id.as_str()),
            ("client_secret", app.client_secret.expose_secret().as_str()),
            ("code", code),
            ("redirect_uri", redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response: TokenResponse = self
            .http
            .post(token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&form)
            .send()
            .await
            .context("Token exchange request failed")?
            .json()
            .await
            .context("Invalid token exchange response")?;

        match response.access_token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => bail!(
                "Token exchange rejected: {}",
                response
                    .error_description
                    .or(response.error)
                    .unwrap_or_else(|| "no access token returned".to_string())
            ),
        }
    }

    /// Fetch the provider profile and map it onto a user record
    pub async fn fetch_profile(&self, provider: IdentityProvider, access_token: &str) -> Result<NewUser> {
        match provider {
            IdentityProvider::GitHub => {
                let profile: GitHubProfile = self
                    .http
                    .get(format!("{}/user", self.github_api_url))
                    .bearer_auth(access_token)
                    .header(reqwest::header::ACCEPT, "application/vnd.github+json")
                    .send()
                    .await?
                    .error_for_status()
                    .context("GitHub profile request failed")?
                    .json()
                    .await?;
                Ok(NewUser {
                    id: format!("github:{}", profile.id),
                    provider,
                    name: profile.name.or(Some(profile.login)),
                    email: profile.email,
                    image: profile.avatar_url,
                })
            }
            IdentityProvider::Google => {
                let profile: GoogleProfile = self
                    .http
                    .get(GOOGLE_USERINFO_URL)
                    .bearer_auth(access_token)
                    .send()
                    .await?
                    .error_for_status()
                    .context("Google profile request failed")?
                    .json()
                    .await?;
                Ok(NewUser {
                    id: format!("google:{}", profile.sub),
                    provider,
                    name: profile.name,
                    email: profile.email,
                    image: profile.picture,
                })
            }
        }
    }

    /// Complete the code flow: token exchange, then profile lookup
    pub async fn complete_sign_in(&self, provider: IdentityProvider, code: &str) -> Result<SignedIn> {
        let access_token = self.exchange_code(provider, code).await?;
        let user = self.fetch_profile(provider, &access_token).await?;
        tracing::info!("User {} signed in with {}", user.id, provider);
        Ok(SignedIn { user, access_token })
    }
}
