use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{GitHubError, RepositoryHost, RequestPacer};
use crate::config::GitHubSettings;
use crate::models::repository::{RepositoryMetadata, RepositoryRef, RepositorySummary};

const USER_AGENT: &str = concat!("gitdocify/", env!("CARGO_PKG_VERSION"));
const API_VERSION: &str = "2022-11-28";
const REQUEST_TIMEOUT_SECS: u64 = 60;
const REPOSITORY_LIST_SIZE: u32 = 50;

/// REST client for the GitHub API, authenticated per call with the user's token
#[derive(Clone)]
pub struct GitHubClient {
    http: Client,
    api_url: Url,
    pacer: Arc<RequestPacer>,
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    name: String,
    description: Option<String>,
    language: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
    license: Option<LicenseResponse>,
    default_branch: String,
}

#[derive(Debug, Deserialize)]
struct LicenseResponse {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    #[serde(default)]
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct TreeEntry {
    path: Option<String>,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentResponse {
    Listing(Vec<serde_json::Value>),
    Entry(ContentEntry),
}

#[derive(Debug, Deserialize)]
struct ContentEntry {
    #[serde(rename = "type")]
    kind: String,
    content: Option<String>,
    encoding: Option<String>,
}

impl GitHubClient {
    pub fn new(settings: &GitHubSettings) -> Result<Self, GitHubError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        let api_url = Url::parse(&settings.api_url)
            .map_err(|e| GitHubError::InvalidUrl(format!("{}: {}", settings.api_url, e)))?;
        if api_url.cannot_be_a_base() {
            return Err(GitHubError::InvalidUrl(settings.api_url.clone()));
        }

        Ok(Self {
            http,
            api_url,
            pacer: Arc::new(RequestPacer::new(settings.min_request_interval())),
        })
    }

    /// API URL with each segment percent-encoded, so user input cannot add path levels
    fn endpoint<'a, I>(&self, segments: I) -> Url
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut url = self.api_url.clone();
        // Checked in `new`
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn get<'a, I>(&self, token: &str, segments: I) -> RequestBuilder
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.http
            .get(self.endpoint(segments))
            .bearer_auth(token)
            .header(header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, GitHubError> {
        self.pacer.wait().await;
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                GitHubError::FetchTimeout
            } else {
                GitHubError::Http(e)
            }
        })?;
        debug!(
            status = %response.status(),
            remaining = ?response.headers().get("x-ratelimit-remaining"),
            "GitHub API: {}",
            response.url().path()
        );
        Ok(response)
    }
}

/// Map non-success statuses onto the error taxonomy
async fn check_status<F>(response: Response, not_found: F) -> Result<Response, GitHubError>
where
    F: FnOnce() -> GitHubError,
{
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let rate_limit_exhausted = response
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        == Some("0");

    match status {
        StatusCode::NOT_FOUND => Err(not_found()),
        StatusCode::UNAUTHORIZED => Err(GitHubError::Unauthorized),
        StatusCode::TOO_MANY_REQUESTS => Err(GitHubError::RateLimited),
        StatusCode::FORBIDDEN if rate_limit_exhausted => Err(GitHubError::RateLimited),
        StatusCode::FORBIDDEN => Err(GitHubError::AccessDenied),
        _ => {
            let message = response.text().await.unwrap_or_default();
            Err(GitHubError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

async fn decode_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, GitHubError> {
    response
        .json::<T>()
        .await
        .map_err(|e| GitHubError::Decode(e.to_string()))
}

/// Decode the base64 payload of the contents API into text
pub fn decode_content(path: &str, encoded: &str) -> Result<String, GitHubError> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| GitHubError::Decode(format!("{}: {}", path, e)))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[async_trait]
impl RepositoryHost for GitHubClient {
    async fn repository_info(
        &self,
        token: &str,
        repo: &RepositoryRef,
    ) -> Result<RepositoryMetadata, GitHubError> {
        let request = self.get(token, ["repos", repo.owner.as_str(), repo.repo.as_str()]);
        let response = self.send(request).await?;
        let response = check_status(response, || GitHubError::RepositoryNotFound(repo.full_name())).await?;
        let data: RepoResponse = decode_json(response).await?;

        Ok(RepositoryMetadata {
            name: data.name,
            description: data.description,
            language: data.language,
            stars: data.stargazers_count,
            forks: data.forks_count,
            license: data.license.and_then(|l| l.name),
            default_branch: data.default_branch,
        })
    }

    async fn repository_tree(
        &self,
        token: &str,
        repo: &RepositoryRef,
        branch: &str,
    ) -> Result<Vec<String>, GitHubError> {
        let request = self
            .get(
                token,
                ["repos", repo.owner.as_str(), repo.repo.as_str(), "git", "trees", branch],
            )
            .query(&[("recursive", "1")]);
        let response = self.send(request).await?;
        let response = check_status(response, || GitHubError::RepositoryNotFound(repo.full_name())).await?;
        let data: TreeResponse = decode_json(response).await?;

        if data.truncated {
            debug!("GitHub truncated the tree listing for {}", repo);
        }

        Ok(data
            .tree
            .into_iter()
            .filter(|entry| entry.kind == "blob")
            .filter_map(|entry| entry.path)
            .filter(|path| !path.is_empty())
            .collect())
    }

    async fn file_content(
        &self,
        token: &str,
        repo: &RepositoryRef,
        path: &str,
        branch: &str,
    ) -> Result<String, GitHubError> {
        let request = self
            .get(
                token,
                ["repos", repo.owner.as_str(), repo.repo.as_str(), "contents"]
                    .into_iter()
                    .chain(path.split('/')),
            )
            .query(&[("ref", branch)]);
        let response = self.send(request).await?;
        let response = check_status(response, || GitHubError::FileNotFound(path.to_string())).await?;

        let entry = match decode_json::<ContentResponse>(response).await? {
            ContentResponse::Entry(entry) => entry,
            ContentResponse::Listing(_) => return Err(GitHubError::NotAFile(path.to_string())),
        };
        if entry.kind != "file" {
            return Err(GitHubError::NotAFile(path.to_string()));
        }

        match (entry.content, entry.encoding.as_deref()) {
            (Some(content), Some("base64")) if !content.is_empty() => decode_content(path, &content),
            _ => Err(GitHubError::Decode(format!("File '{}' has no content", path))),
        }
    }

    async fn list_repositories(&self, token: &str) -> Result<Vec<RepositorySummary>, GitHubError> {
        let request = self.get(token, ["user", "repos"]).query(&[
            ("sort", "updated".to_string()),
            ("per_page", REPOSITORY_LIST_SIZE.to_string()),
            ("visibility", "all".to_string()),
        ]);
        let response = self.send(request).await?;
        let response = check_status(response, || GitHubError::Unauthorized).await?;
        decode_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_wrapped_base64() {
        // The contents API wraps base64 at 60 columns
        let encoded = "IyBIZWxsbwoKV29ybGQgb2Yg\nUnVzdAo=\n";
        assert_eq!(decode_content("README.md", encoded).unwrap(), "# Hello\n\nWorld of Rust\n");
    }

    #[test]
    fn rejects_invalid_base64() {
        let err = decode_content("README.md", "not base64!!").unwrap_err();
        assert!(matches!(err, GitHubError::Decode(_)));
    }

    #[test]
    fn tree_response_keeps_only_blobs() {
        let raw = r#"{"sha":"abc","tree":[
            {"path":"src","type":"tree"},
            {"path":"src/main.rs","type":"blob"},
            {"path":"vendor/lib","type":"commit"},
            {"path":"README.md","type":"blob"}
        ],"truncated":false}"#;
        let data: TreeResponse = serde_json::from_str(raw).unwrap();
        let paths: Vec<String> = data
            .tree
            .into_iter()
            .filter(|e| e.kind == "blob")
            .filter_map(|e| e.path)
            .collect();
        assert_eq!(paths, vec!["src/main.rs", "README.md"]);
    }

    #[test]
    fn content_listing_is_distinguished_from_file() {
        let listing: ContentResponse = serde_json::from_str(r#"[{"type":"file","name":"a"}]"#).unwrap();
        assert!(matches!(listing, ContentResponse::Listing(_)));
        let file: ContentResponse =
            serde_json::from_str(r#"{"type":"file","content":"aGk=","encoding":"base64"}"#).unwrap();
        assert!(matches!(file, ContentResponse::Entry(_)));
    }

    #[test]
    fn user_messages_are_specific() {
        assert!(GitHubError::FetchTimeout.user_message().contains("timed out"));
        assert!(GitHubError::RepositoryNotFound("a/b".into())
            .user_message()
            .contains("not found"));
        assert!(GitHubError::RateLimited.user_message().contains("rate limit"));
    }

    #[test]
    fn user_supplied_segments_are_encoded() {
        let client = GitHubClient::new(&GitHubSettings {
            api_url: "https://api.github.com".to_string(),
            min_request_interval_ms: 0,
        })
        .unwrap();

        let url = client.endpoint(["repos", "octocat", "hello", "git", "trees", "feature/x?recursive=0"]);
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/octocat/hello/git/trees/feature%2Fx%3Frecursive=0"
        );
    }

    mod http {
        use super::*;
        use mockito::Matcher;

        fn client(server: &mockito::ServerGuard) -> GitHubClient {
            GitHubClient::new(&GitHubSettings {
                api_url: server.url(),
                min_request_interval_ms: 0,
            })
            .unwrap()
        }

        fn repo() -> RepositoryRef {
            "octocat/hello".parse().unwrap()
        }

        #[tokio::test]
        async fn repository_info_maps_metadata() {
            let mut server = mockito::Server::new_async().await;
            let mock = server
                .mock("GET", "/repos/octocat/hello")
                .match_header("authorization", "Bearer gho_token")
                .with_status(200)
                .with_header("content-type", "application/json")
                .with_body(
                    r#"{"name":"hello","description":"Greets","language":"Rust","stargazers_count":7,
                        "forks_count":2,"license":{"name":"MIT License"},"default_branch":"trunk"}"#,
                )
                .create_async()
                .await;

            let metadata = client(&server).repository_info("gho_token", &repo()).await.unwrap();
            assert_eq!(metadata.default_branch, "trunk");
            assert_eq!(metadata.license.as_deref(), Some("MIT License"));
            assert_eq!(metadata.stars, 7);
            mock.assert_async().await;
        }

        #[tokio::test]
        async fn error_statuses_map_to_taxonomy() {
            let mut server = mockito::Server::new_async().await;
            server
                .mock("GET", "/repos/octocat/missing")
                .with_status(404)
                .with_body(r#"{"message":"Not Found"}"#)
                .create_async()
                .await;
            server
                .mock("GET", "/repos/octocat/private")
                .with_status(403)
                .with_header("x-ratelimit-remaining", "4999")
                .with_body(r#"{"message":"Resource not accessible by integration"}"#)
                .create_async()
                .await;
            server
                .mock("GET", "/repos/octocat/hello")
                .with_status(403)
                .with_header("x-ratelimit-remaining", "0")
                .with_body(r#"{"message":"API rate limit exceeded"}"#)
                .create_async()
                .await;

            let client = client(&server);
            let err = client
                .repository_info("t", &"octocat/missing".parse().unwrap())
                .await
                .unwrap_err();
            assert!(matches!(err, GitHubError::RepositoryNotFound(name) if name == "octocat/missing"));

            let err = client
                .repository_info("t", &"octocat/private".parse().unwrap())
                .await
                .unwrap_err();
            assert!(matches!(err, GitHubError::AccessDenied));

            let err = client.repository_info("t", &repo()).await.unwrap_err();
            assert!(matches!(err, GitHubError::RateLimited));
        }

        #[tokio::test]
        async fn file_content_decodes_base64_at_ref() {
            let mut server = mockito::Server::new_async().await;
            let mock = server
                .mock("GET", "/repos/octocat/hello/contents/src/main.rs")
                .match_query(Matcher::UrlEncoded("ref".into(), "trunk".into()))
                .with_status(200)
                .with_header("content-type", "application/json")
                .with_body(
                    r#"{"type":"file","encoding":"base64","content":"Zm4gbWFpbigpIHt9\nCg==\n"}"#,
                )
                .create_async()
                .await;

            let content = client(&server)
                .file_content("t", &repo(), "src/main.rs", "trunk")
                .await
                .unwrap();
            assert_eq!(content, "fn main() {}\n");
            mock.assert_async().await;
        }

        #[tokio::test]
        async fn directory_is_not_a_file() {
            let mut server = mockito::Server::new_async().await;
            server
                .mock("GET", "/repos/octocat/hello/contents/src")
                .match_query(Matcher::Any)
                .with_status(200)
                .with_header("content-type", "application/json")
                .with_body(r#"[{"type":"file","name":"main.rs","path":"src/main.rs"}]"#)
                .create_async()
                .await;

            let err = client(&server)
                .file_content("t", &repo(), "src", "trunk")
                .await
                .unwrap_err();
            assert!(matches!(err, GitHubError::NotAFile(_)));
        }

        #[tokio::test]
        async fn tree_lists_blobs_recursively() {
            let mut server = mockito::Server::new_async().await;
            let mock = server
                .mock("GET", "/repos/octocat/hello/git/trees/trunk")
                .match_query(Matcher::UrlEncoded("recursive".into(), "1".into()))
                .with_status(200)
                .with_header("content-type", "application/json")
                .with_body(
                    r#"{"tree":[{"path":"src","type":"tree"},{"path":"src/main.rs","type":"blob"}],"truncated":false}"#,
                )
                .create_async()
                .await;

            let tree = client(&server).repository_tree("t", &repo(), "trunk").await.unwrap();
            assert_eq!(tree, vec!["src/main.rs"]);
            mock.assert_async().await;
        }
    }
}
