#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, Response};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use gitdocify::auth::{issue_session_token, Session};
use gitdocify::config::Settings;
use gitdocify::database::{MemoryStore, Store};
use gitdocify::generation::{GenerationError, GenerationParams, TextGenerator};
use gitdocify::github::{GitHubError, RepositoryHost};
use gitdocify::models::repository::{RepositoryMetadata, RepositoryRef, RepositorySummary};
use gitdocify::models::user::{IdentityProvider, NewUser};
use gitdocify::oauth::OAuthClient;
use gitdocify::rate_limit::{FixedWindowLimiter, RateLimiter};
use gitdocify::AppState;

pub const SECRET: &str = "test-session-secret-with-enough-length";

pub fn test_settings(extra: &[(&str, &str)]) -> Settings {
    let mut vars: HashMap<String, String> = HashMap::from([
        ("SESSION_SECRET".to_string(), SECRET.to_string()),
        ("GITHUB_CLIENT_ID".to_string(), "client-id".to_string()),
        ("GITHUB_CLIENT_SECRET".to_string(), "client-secret".to_string()),
        ("GEMINI_API_KEY".to_string(), "test-key".to_string()),
    ]);
    for (key, value) in extra {
        vars.insert(key.to_string(), value.to_string());
    }
    Settings::from_source(|key| vars.get(key).cloned()).expect("test settings")
}

/// In-memory repository host serving one fixed repository
pub struct MockHost {
    pub files: HashMap<String, String>,
    pub tree: Vec<String>,
    pub missing: bool,
    pub calls: Mutex<Vec<String>>,
}

impl Default for MockHost {
    fn default() -> Self {
        let files = HashMap::from([
            ("README.md".to_string(), "# Hello World\nMy first repository.".to_string()),
            ("package.json".to_string(), r#"{"name":"hello-world"}"#.to_string()),
        ]);
        Self {
            tree: vec![
                "README.md".to_string(),
                "package.json".to_string(),
                "src/index.js".to_string(),
            ],
            files,
            missing: false,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockHost {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl RepositoryHost for MockHost {
    async fn repository_info(&self, _token: &str, repo: &RepositoryRef) -> Result<RepositoryMetadata, GitHubError> {
        self.record(format!("info {}", repo));
        if self.missing {
            return Err(GitHubError::RepositoryNotFound(repo.full_name()));
        }
        Ok(RepositoryMetadata {
            name: repo.repo.clone(),
            description: Some("My first repository on GitHub!".to_string()),
            language: Some("JavaScript".to_string()),
            stars: 2500,
            forks: 2000,
            license: None,
            default_branch: "master".to_string(),
        })
    }

    async fn repository_tree(&self, _token: &str, repo: &RepositoryRef, branch: &str) -> Result<Vec<String>, GitHubError> {
        self.record(format!("tree {}@{}", repo, branch));
        Ok(self.tree.clone())
    }

    async fn file_content(
        &self,
        _token: &str,
        _repo: &RepositoryRef,
        path: &str,
        _branch: &str,
    ) -> Result<String, GitHubError> {
        self.record(format!("file {}", path));
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| GitHubError::FileNotFound(path.to_string()))
    }

    async fn list_repositories(&self, _token: &str) -> Result<Vec<RepositorySummary>, GitHubError> {
        Ok(vec![RepositorySummary {
            id: 1296269,
            name: "Hello-World".to_string(),
            full_name: "octocat/Hello-World".to_string(),
            description: None,
            private: false,
            html_url: "https://github.com/octocat/Hello-World".to_string(),
            language: Some("JavaScript".to_string()),
            stargazers_count: 2500,
            forks_count: 2000,
            updated_at: None,
            topics: vec![],
        }])
    }
}

/// Text generator replaying canned replies in order; the last reply repeats
pub struct MockGenerator {
    replies: Mutex<Vec<Result<String, String>>>,
    pub prompts: Mutex<Vec<(String, GenerationParams)>>,
}

impl MockGenerator {
    pub fn replying(replies: &[Result<&str, &str>]) -> Self {
        Self {
            replies: Mutex::new(
                replies
                    .iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn ok(text: &str) -> Self {
        Self::replying(&[Ok(text)])
    }

    pub fn failing(message: &str) -> Self {
        Self::replying(&[Err(message)])
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, GenerationError> {
        self.prompts
            .lock()
            .unwrap()
            .push((prompt.to_string(), params.clone()));

        let mut replies = self.replies.lock().unwrap();
        let reply = if replies.len() > 1 {
            replies.remove(0)
        } else {
            replies[0].clone()
        };
        reply.map_err(|m| gitdocify::generation::classify_failure(&m))
    }
}

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub host: Arc<MockHost>,
    pub generator: Option<Arc<MockGenerator>>,
}

pub struct TestAppBuilder {
    settings: Settings,
    host: MockHost,
    generator: Option<MockGenerator>,
    limiter: Option<Arc<dyn RateLimiter>>,
}

impl TestAppBuilder {
    pub fn new() -> Self {
        Self {
            settings: test_settings(&[]),
            host: MockHost::default(),
            generator: Some(MockGenerator::ok("# Hello-World\n\nGenerated documentation.")),
            limiter: None,
        }
    }

    pub fn host(mut self, host: MockHost) -> Self {
        self.host = host;
        self
    }

    pub fn generator(mut self, generator: Option<MockGenerator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn rate_limit(mut self, requests: u32) -> Self {
        self.limiter = Some(Arc::new(FixedWindowLimiter::new(
            requests,
            std::time::Duration::from_secs(60),
        )));
        self
    }

    pub fn build(self) -> TestApp {
        let store = Arc::new(MemoryStore::new());
        let host = Arc::new(self.host);
        let generator = self.generator.map(Arc::new);
        let limiter = self
            .limiter
            .unwrap_or_else(|| Arc::new(FixedWindowLimiter::from_settings(&self.settings.rate_limit)));
        let oauth = OAuthClient::new(&self.settings).expect("oauth client");

        let state = AppState {
            config: Arc::new(self.settings),
            store: store.clone() as Arc<dyn Store>,
            github: host.clone() as Arc<dyn RepositoryHost>,
            generator: generator.clone().map(|g| g as Arc<dyn TextGenerator>),
            rate_limiter: limiter,
            oauth: Arc::new(oauth),
        };

        TestApp {
            state,
            store,
            host,
            generator,
        }
    }
}

impl TestApp {
    pub fn router(&self) -> axum::Router {
        gitdocify::create_app(self.state.clone())
    }
}

pub fn github_session(user: &str) -> Session {
    Session {
        user_id: format!("github:{}", user),
        name: Some(user.to_string()),
        email: None,
        provider: IdentityProvider::GitHub,
    }
}

pub fn google_session(user: &str) -> Session {
    Session {
        user_id: format!("google:{}", user),
        name: Some(user.to_string()),
        email: Some(format!("{}@example.com", user)),
        provider: IdentityProvider::Google,
    }
}

pub const GITHUB_ACCESS_TOKEN: &str = "gho_test_token";

/// Session token only; nothing is stored for the user
pub fn token_for(app: &TestApp, session: &Session) -> String {
    issue_session_token(session, &app.state.config.auth).expect("session token")
}

/// Store the user the way the OAuth callback does, then issue their session token
pub async fn sign_in(app: &TestApp, session: &Session) -> String {
    app.store
        .upsert_user(&NewUser {
            id: session.user_id.clone(),
            provider: session.provider,
            name: session.name.clone(),
            email: session.email.clone(),
            image: None,
        })
        .await
        .expect("stored user");
    if session.provider == IdentityProvider::GitHub {
        app.store
            .save_access_token(&session.user_id, GITHUB_ACCESS_TOKEN)
            .await
            .expect("stored access token");
    }
    token_for(app, session)
}

pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
