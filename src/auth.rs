use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};

use crate::config::AuthSettings;
use crate::database::Store;
use crate::error::AppError;
use crate::models::user::{IdentityProvider, SessionResponse, SessionUser};

pub const SESSION_COOKIE: &str = "gitdocify_session";
pub const OAUTH_STATE_COOKIE: &str = "gitdocify_oauth_state";
const STATE_LEN: usize = 32;

/// Session token payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub provider: IdentityProvider,
    pub iat: usize,
    pub exp: usize,
}

/// Authenticated principal of one request.
///
/// Provider access tokens never enter the session; they are kept in the `Store`.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub provider: IdentityProvider,
}

impl From<Claims> for Session {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            name: claims.name,
            email: claims.email,
            provider: claims.provider,
        }
    }
}

impl Session {
    pub fn to_response(&self, has_repository_access: bool) -> SessionResponse {
        SessionResponse {
            user: SessionUser {
                id: self.user_id.clone(),
                name: self.name.clone(),
                email: self.email.clone(),
            },
            provider: self.provider,
            has_repository_access,
        }
    }
}

/// Sign a session token for `session`
pub fn issue_session_token(session: &Session, settings: &AuthSettings) -> anyhow::Result<String> {
    let now = chrono::Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: session.user_id.clone(),
        name: session.name.clone(),
        email: session.email.clone(),
        provider: session.provider,
        iat: now,
        exp: now + settings.session_max_age_seconds as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.secret_bytes()),
    )?;
    Ok(token)
}

pub fn verify_token(token: &str, secret: &[u8]) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(token, &DecodingKey::from_secret(secret), &Validation::default())
        .map_err(|e| {
            tracing::debug!("Session token rejected: {}", e);
            AppError::Unauthenticated
        })?;

    tracing::debug!("Session verified for user ID: {}", token_data.claims.sub);
    Ok(token_data.claims)
}

/// Resolve the caller from the session cookie, then the bearer header
pub fn resolve_session(
    jar: &CookieJar,
    bearer: Option<&TypedHeader<Authorization<Bearer>>>,
    settings: &AuthSettings,
) -> Result<Session, AppError> {
    let token = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .or_else(|| bearer.map(|TypedHeader(auth)| auth.token().to_string()))
        .ok_or(AppError::Unauthenticated)?;

    verify_token(&token, settings.secret_bytes()).map(Session::from)
}

/// Stored GitHub access token for the session's user, if any
pub async fn repository_credential(store: &dyn Store, session: &Session) -> Result<Option<String>, AppError> {
    if session.provider != IdentityProvider::GitHub {
        return Ok(None);
    }
    let token = store.access_token(&session.user_id).await?;
    Ok(token.filter(|t| !t.is_empty()))
}

/// The session's repository-hosting token, or `MissingCredential`
pub async fn require_repository_credential(store: &dyn Store, session: &Session) -> Result<String, AppError> {
    repository_credential(store, session)
        .await?
        .ok_or(AppError::MissingCredential)
}

/// Random CSRF state for an OAuth round trip
pub fn generate_state() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LEN)
        .map(char::from)
        .collect()
}

pub fn session_cookie(token: String, settings: &AuthSettings) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(settings.secure_cookies)
        .same_site(SameSite::Lax)
        .build()
}

pub fn state_cookie(state: String, settings: &AuthSettings) -> Cookie<'static> {
    Cookie::build((OAUTH_STATE_COOKIE, state))
        .path("/api/auth")
        .http_only(true)
        .secure(settings.secure_cookies)
        .same_site(SameSite::Lax)
        .build()
}

/// Cookie removal helper; path must match the one the cookie was set with
pub fn removal_cookie(name: &'static str, path: &'static str) -> Cookie<'static> {
    Cookie::build((name, "")).path(path).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::models::user::NewUser;
    use secrecy::Secret;

    fn settings() -> AuthSettings {
        AuthSettings {
            session_secret: Secret::new("0123456789abcdef0123456789abcdef".to_string()),
            session_max_age_seconds: 3600,
            secure_cookies: false,
            github: None,
            google: None,
        }
    }

    fn github_session() -> Session {
        Session {
            user_id: "github:583231".to_string(),
            name: Some("The Octocat".to_string()),
            email: None,
            provider: IdentityProvider::GitHub,
        }
    }

    #[test]
    fn test_token_round_trip() {
        let settings = settings();
        let token = issue_session_token(&github_session(), &settings).unwrap();
        let claims = verify_token(&token, settings.secret_bytes()).unwrap();
        assert_eq!(claims.sub, "github:583231");
        assert_eq!(claims.provider, IdentityProvider::GitHub);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_wrong_secret_is_unauthenticated() {
        let token = issue_session_token(&github_session(), &settings()).unwrap();
        let err = verify_token(&token, b"another-secret-another-secret-xx").unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));
    }

    #[test]
    fn test_resolve_from_cookie() {
        let settings = settings();
        let token = issue_session_token(&github_session(), &settings).unwrap();
        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, token));
        let session = resolve_session(&jar, None, &settings).unwrap();
        assert_eq!(session.user_id, "github:583231");
    }

    #[test]
    fn test_missing_session() {
        let err = resolve_session(&CookieJar::new(), None, &settings()).unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));
    }

    #[test]
    fn test_token_does_not_carry_provider_credentials() {
        let token = issue_session_token(&github_session(), &settings()).unwrap();
        let payload = token.split('.').nth(1).unwrap();
        let decoded = base64::Engine::decode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, payload).unwrap();
        let claims: serde_json::Value = serde_json::from_slice(&decoded).unwrap();

        assert_eq!(claims["sub"], "github:583231");
        assert!(claims.get("access_token").is_none());
    }

    #[tokio::test]
    async fn test_repository_credential_requires_stored_github_token() {
        let store = MemoryStore::new();
        let session = github_session();
        assert!(matches!(
            require_repository_credential(&store, &session).await,
            Err(AppError::MissingCredential)
        ));

        store
            .upsert_user(&NewUser {
                id: session.user_id.clone(),
                provider: IdentityProvider::GitHub,
                name: None,
                email: None,
                image: None,
            })
            .await
            .unwrap();
        store.save_access_token(&session.user_id, "gho_example").await.unwrap();
        assert_eq!(require_repository_credential(&store, &session).await.unwrap(), "gho_example");

        let google = Session {
            provider: IdentityProvider::Google,
            ..github_session()
        };
        assert!(matches!(
            require_repository_credential(&store, &google).await,
            Err(AppError::MissingCredential)
        ));
    }

    #[test]
    fn test_generate_state() {
        let a = generate_state();
        let b = generate_state();
        assert_eq!(a.len(), STATE_LEN);
        assert_ne!(a, b);
    }
}
