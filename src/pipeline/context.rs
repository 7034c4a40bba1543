use std::future::Future;
use std::time::Duration;
use tracing::info;

use crate::github::{GitHubError, RepositoryHost};
use crate::models::repository::{RepositoryMetadata, RepositoryRef};

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
pub const MAX_TREE_ENTRIES: usize = 1000;

/// Metadata and (bounded) file tree of one repository
#[derive(Debug, Clone)]
pub struct RepositoryContext {
    pub metadata: RepositoryMetadata,
    pub tree: Vec<String>,
    /// Branch the tree was read from
    pub branch: String,
}

async fn with_timeout<T, F>(operation: F) -> Result<T, GitHubError>
where
    F: Future<Output = Result<T, GitHubError>>,
{
    tokio::time::timeout(FETCH_TIMEOUT, operation)
        .await
        .map_err(|_| GitHubError::FetchTimeout)?
}

/// Fetch metadata and the recursive tree. With an explicit branch both calls run
/// concurrently; otherwise the default branch is resolved first.
pub async fn fetch_repository_context(
    host: &dyn RepositoryHost,
    token: &str,
    repo: &RepositoryRef,
    branch: Option<&str>,
) -> Result<RepositoryContext, GitHubError> {
    info!("Fetching repository info and file tree for {}", repo);

    let (metadata, mut tree, branch) = match branch {
        Some(branch) => {
            let (metadata, tree) = tokio::try_join!(
                with_timeout(host.repository_info(token, repo)),
                with_timeout(host.repository_tree(token, repo, branch)),
            )?;
            (metadata, tree, branch.to_string())
        }
        None => {
            let metadata = with_timeout(host.repository_info(token, repo)).await?;
            let branch = metadata.default_branch.clone();
            let tree = with_timeout(host.repository_tree(token, repo, &branch)).await?;
            (metadata, tree, branch)
        }
    };

    tree.truncate(MAX_TREE_ENTRIES);

    Ok(RepositoryContext {
        metadata,
        tree,
        branch,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::repository::RepositorySummary;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubHost {
        tree_size: usize,
        hang_on_tree: bool,
        missing: bool,
        tree_branches: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl RepositoryHost for StubHost {
        async fn repository_info(&self, _token: &str, repo: &RepositoryRef) -> Result<RepositoryMetadata, GitHubError> {
            if self.missing {
                return Err(GitHubError::RepositoryNotFound(repo.full_name()));
            }
            Ok(RepositoryMetadata {
                name: repo.repo.clone(),
                default_branch: "trunk".to_string(),
                ..Default::default()
            })
        }

        async fn repository_tree(&self, _token: &str, _repo: &RepositoryRef, branch: &str) -> Result<Vec<String>, GitHubError> {
            self.tree_branches.lock().unwrap().push(branch.to_string());
            if self.hang_on_tree {
                std::future::pending::<()>().await;
            }
            Ok((0..self.tree_size).map(|i| format!("file_{:04}.txt", i)).collect())
        }

        async fn file_content(&self, _: &str, _: &RepositoryRef, path: &str, _: &str) -> Result<String, GitHubError> {
            Err(GitHubError::FileNotFound(path.to_string()))
        }

        async fn list_repositories(&self, _token: &str) -> Result<Vec<RepositorySummary>, GitHubError> {
            Ok(Vec::new())
        }
    }

    fn repo() -> RepositoryRef {
        "octocat/Hello-World".parse().unwrap()
    }

    #[tokio::test]
    async fn resolves_default_branch_first() {
        let host = StubHost {
            tree_size: 3,
            ..Default::default()
        };
        let context = fetch_repository_context(&host, "token", &repo(), None).await.unwrap();
        assert_eq!(context.branch, "trunk");
        assert_eq!(context.tree.len(), 3);
        assert_eq!(*host.tree_branches.lock().unwrap(), vec!["trunk"]);
    }

    #[tokio::test]
    async fn explicit_branch_overrides_default() {
        let host = StubHost::default();
        let context = fetch_repository_context(&host, "token", &repo(), Some("release"))
            .await
            .unwrap();
        assert_eq!(context.branch, "release");
        assert_eq!(*host.tree_branches.lock().unwrap(), vec!["release"]);
    }

    #[tokio::test]
    async fn large_trees_keep_first_entries_in_order() {
        let host = StubHost {
            tree_size: 1500,
            ..Default::default()
        };
        let context = fetch_repository_context(&host, "token", &repo(), None).await.unwrap();
        assert_eq!(context.tree.len(), MAX_TREE_ENTRIES);
        assert_eq!(context.tree.first().unwrap(), "file_0000.txt");
        assert_eq!(context.tree.last().unwrap(), "file_0999.txt");
    }

    #[tokio::test]
    async fn not_found_is_propagated() {
        let host = StubHost {
            missing: true,
            ..Default::default()
        };
        let err = fetch_repository_context(&host, "token", &repo(), None).await.unwrap_err();
        assert!(matches!(err, GitHubError::RepositoryNotFound(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_tree_fetch_times_out() {
        let host = StubHost {
            hang_on_tree: true,
            ..Default::default()
        };
        let err = fetch_repository_context(&host, "token", &repo(), None).await.unwrap_err();
        assert!(matches!(err, GitHubError::FetchTimeout));
    }
}
