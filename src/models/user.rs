use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Identity provider a session was established through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum IdentityProvider {
    GitHub,
    Google,
}

impl IdentityProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityProvider::GitHub => "github",
            IdentityProvider::Google => "google",
        }
    }
}

impl fmt::Display for IdentityProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentityProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "github" => Ok(IdentityProvider::GitHub),
            "google" => Ok(IdentityProvider::Google),
            other => Err(format!("unknown identity provider '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    /// `{provider}:{provider account id}`
    pub id: String,
    pub provider: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: String,
    pub provider: IdentityProvider,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
}

/// Principal returned by the session endpoint
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user: SessionUser,
    pub provider: IdentityProvider,
    /// Whether repository documentation is available for this session
    pub has_repository_access: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionUser {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
}
