use futures::stream::{self, StreamExt};
use futures::FutureExt;
use tracing::{info, warn};

use crate::github::RepositoryHost;
use crate::models::repository::RepositoryRef;

/// Per-file content ceiling (1 MiB)
pub const MAX_FILE_SIZE: usize = 1024 * 1024;
pub const TRUNCATION_MARKER: &str = "\n... (file truncated)";
/// Upper bound on concurrent content requests
pub const FETCH_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFile {
    pub path: String,
    pub content: String,
}

/// Cut content at the 1 MiB ceiling and append the truncation marker.
///
/// The cut lands on the nearest UTF-8 boundary at or below the ceiling, which is
/// exactly `MAX_FILE_SIZE` bytes for ASCII text.
pub fn truncate_content(mut content: String) -> String {
    if content.len() <= MAX_FILE_SIZE {
        return content;
    }
    let mut cut = MAX_FILE_SIZE;
    while !content.is_char_boundary(cut) {
        cut -= 1;
    }
    content.truncate(cut);
    content.push_str(TRUNCATION_MARKER);
    content
}

/// Download the selected files with bounded fan-out.
///
/// Failures are logged and dropped; results keep the order of `paths`.
pub async fn fetch_key_files(
    host: &dyn RepositoryHost,
    token: &str,
    repo: &RepositoryRef,
    branch: &str,
    paths: &[&str],
) -> Vec<FetchedFile> {
    info!("Fetching {} key files from {}", paths.len(), repo);

    // Boxed before buffering so callers' futures stay Send
    let fetches: Vec<_> = paths
        .iter()
        .map(|&path| {
            async move {
                match host.file_content(token, repo, path, branch).await {
                    Ok(content) => Some(FetchedFile {
                        path: path.to_string(),
                        content: truncate_content(content),
                    }),
                    Err(e) => {
                        warn!("Failed to fetch {} from {}: {}", path, repo, e);
                        None
                    }
                }
            }
            .boxed()
        })
        .collect();

    let results: Vec<Option<FetchedFile>> = stream::iter(fetches)
        .buffered(FETCH_CONCURRENCY)
        .collect()
        .await;

    results.into_iter().flatten().collect()
}
