use anyhow::{bail, Context, Result};
use secrecy::{ExposeSecret, Secret};
use std::net::SocketAddr;
use std::time::Duration;
use url::Url;
use validator::Validate;

const MIN_SESSION_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Validate)]
pub struct Settings {
    #[validate]
    pub server: ServerSettings,
    pub database: Option<DatabaseSettings>,
    #[validate]
    pub auth: AuthSettings,
    #[validate]
    pub github: GitHubSettings,
    #[validate]
    pub gemini: GeminiSettings,
    #[validate]
    pub rate_limit: RateLimitSettings,
}

#[derive(Debug, Clone, Validate)]
pub struct ServerSettings {
    #[validate(custom = "validate_socket_addr")]
    pub listen_address: String,
    /// External base URL, used to build OAuth redirect URIs
    #[validate(custom = "validate_url")]
    pub public_url: String,
}

#[derive(Debug, Clone, Validate)]
pub struct DatabaseSettings {
    pub url: Secret<String>,
    pub min_connections: u32,
    #[validate(range(min = 1))]
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct OAuthAppSettings {
    pub client_id: String,
    pub client_secret: Secret<String>,
}

#[derive(Debug, Clone, Validate)]
pub struct AuthSettings {
    pub session_secret: Secret<String>,
    #[validate(range(min = 300))] // Minimum 5 minutes
    pub session_max_age_seconds: u64,
    pub secure_cookies: bool,
    pub github: Option<OAuthAppSettings>,
    pub google: Option<OAuthAppSettings>,
}

#[derive(Debug, Clone, Validate)]
pub struct GitHubSettings {
    #[validate(custom = "validate_url")]
    pub api_url: String,
    pub min_request_interval_ms: u64,
}

#[derive(Debug, Clone, Validate)]
pub struct GeminiSettings {
    pub api_key: Option<Secret<String>>,
    #[validate(length(min = 1))]
    pub model: String,
    #[validate(custom = "validate_url")]
    pub api_url: String,
    #[validate(range(min = 1))]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Validate)]
pub struct RateLimitSettings {
    #[validate(range(min = 1))]
    pub requests: u32,
    #[validate(range(min = 1))]
    pub window_seconds: u64,
}

impl Settings {
    /// Load configuration from the process environment (and `.env` if present)
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable lookup
    pub fn from_source<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let public_url = var("PUBLIC_URL").unwrap_or_else(|| "http://localhost:3000".to_string());
        let server = ServerSettings {
            listen_address: var("LISTEN_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            public_url: public_url.trim_end_matches('/').to_string(),
        };

        let database = match var("DATABASE_URL") {
            Some(url) => Some(DatabaseSettings {
                url: Secret::new(url),
                min_connections: parse_or(&var, "DATABASE_MIN_CONNECTIONS", 1)?,
                max_connections: parse_or(&var, "DATABASE_MAX_CONNECTIONS", 10)?,
            }),
            None => None,
        };

        let session_secret = var("SESSION_SECRET")
            .or_else(|| var("NEXTAUTH_SECRET"))
            .context("SESSION_SECRET environment variable is required")?;
        if session_secret.len() < MIN_SESSION_SECRET_LEN {
            bail!(
                "SESSION_SECRET must be at least {} characters long",
                MIN_SESSION_SECRET_LEN
            );
        }

        let auth = AuthSettings {
            session_secret: Secret::new(session_secret),
            session_max_age_seconds: parse_or(&var, "SESSION_MAX_AGE_SECONDS", 30 * 24 * 60 * 60)?,
            secure_cookies: server.public_url.starts_with("https://"),
            github: oauth_app(&var, "GITHUB_CLIENT_ID", "GITHUB_CLIENT_SECRET"),
            google: oauth_app(&var, "GOOGLE_CLIENT_ID", "GOOGLE_CLIENT_SECRET"),
        };

        let github = GitHubSettings {
            api_url: var("GITHUB_API_URL")
                .unwrap_or_else(|| "https://api.github.com".to_string())
                .trim_end_matches('/')
                .to_string(),
            min_request_interval_ms: parse_or(&var, "GITHUB_MIN_REQUEST_INTERVAL_MS", 1000)?,
        };

        let gemini = GeminiSettings {
            api_key: var("GEMINI_API_KEY").map(Secret::new),
            model: var("GEMINI_MODEL").unwrap_or_else(|| "gemini-1.5-flash".to_string()),
            api_url: var("GEMINI_API_URL")
                .unwrap_or_else(|| "https://generativelanguage.googleapis.com".to_string())
                .trim_end_matches('/')
                .to_string(),
            timeout_seconds: parse_or(&var, "GEMINI_TIMEOUT_SECONDS", 120)?,
        };

        let rate_limit = RateLimitSettings {
            requests: parse_or(&var, "RATE_LIMIT_REQUESTS", 100)?,
            window_seconds: parse_or(&var, "RATE_LIMIT_WINDOW_SECONDS", 60)?,
        };

        let settings = Settings {
            server,
            database,
            auth,
            github,
            gemini,
            rate_limit,
        };

        settings
            .validate_all()
            .context("Configuration validation failed")?;

        Ok(settings)
    }

    pub fn validate_all(&self) -> Result<(), validator::ValidationErrors> {
        self.validate()?;
        self.server.validate()?;
        if let Some(database) = &self.database {
            database.validate()?;
        }
        self.auth.validate()?;
        self.github.validate()?;
        self.gemini.validate()?;
        self.rate_limit.validate()?;
        Ok(())
    }

    /// Integration variables whose absence degrades the service
    pub fn missing_integrations(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.auth.github.is_none() {
            missing.push("GITHUB_CLIENT_ID");
            missing.push("GITHUB_CLIENT_SECRET");
        }
        if self.gemini.api_key.is_none() {
            missing.push("GEMINI_API_KEY");
        }
        missing
    }
}

impl AuthSettings {
    pub fn secret_bytes(&self) -> &[u8] {
        self.session_secret.expose_secret().as_bytes()
    }
}

impl GitHubSettings {
    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }
}

impl RateLimitSettings {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }
}

fn oauth_app<F>(var: &F, id_key: &str, secret_key: &str) -> Option<OAuthAppSettings>
where
    F: Fn(&str) -> Option<String>,
{
    match (var(id_key), var(secret_key)) {
        (Some(client_id), Some(client_secret)) => Some(OAuthAppSettings {
            client_id,
            client_secret: Secret::new(client_secret),
        }),
        _ => None,
    }
}

fn parse_or<F, T>(var: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid value for {}: '{}'", key, raw)),
        None => Ok(default),
    }
}

fn validate_socket_addr(addr: &str) -> Result<(), validator::ValidationError> {
    addr.parse::<SocketAddr>()
        .map(|_| ())
        .map_err(|_| validator::ValidationError::new("invalid_socket_address"))
}

fn validate_url(url: &str) -> Result<(), validator::ValidationError> {
    Url::parse(url)
        .map(|_| ())
        .map_err(|_| validator::ValidationError::new("invalid_url"))
}
