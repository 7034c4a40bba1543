pub mod settings;

pub use settings::{
    AuthSettings, DatabaseSettings, GeminiSettings, GitHubSettings, OAuthAppSettings,
    RateLimitSettings, ServerSettings, Settings,
};
