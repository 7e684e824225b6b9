//! GitHub REST v3 client
//!
//! Implements [`RepoApi`] over plain `GET` requests. One request per call, no
//! retries: the watcher loop is the retry policy.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::types::{CommitSummary, Comparison, RepositoryInfo, TreeListing};
use super::{CommitId, RemoteError, RepoApi, RepositoryRef, TreeEntry};
use crate::config::GitHubConfig;

const API_VERSION: &str = "2022-11-28";

/// GitHub API client
pub struct GitHubClient {
    api_url: String,
    token: Option<String>,
    http: Client,
}

impl fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_url", &self.api_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl GitHubClient {
    /// Create a new client from configuration
    ///
    /// Reads the token from the environment variable named in config; an unset
    /// or empty variable means anonymous access.
    pub fn from_config(config: &GitHubConfig) -> Result<Self, RemoteError> {
        debug!(api_url = %config.api_url, token_env = %config.token_env, "from_config: called");
        let token = config.get_token();
        if token.is_none() {
            debug!("from_config: no token, using anonymous access");
        }
        Self::new(&config.api_url, token, Duration::from_millis(config.timeout_ms))
    }

    pub fn new(api_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, RemoteError> {
        let http = Self::http_builder(timeout).build()?;
        Ok(Self::from_parts(api_url, token, http))
    }

    fn http_builder(timeout: Duration) -> ClientBuilder {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));

        Client::builder()
            .user_agent(concat!("commitwatch/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(timeout)
    }

    fn from_parts(api_url: &str, token: Option<String>, http: Client) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
            http,
        }
    }

    /// Whether requests carry a credential
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn repo_url(&self, repo: &RepositoryRef, suffix: &str) -> String {
        format!("{}/repos/{}/{}{}", self.api_url, repo.owner, repo.name, suffix)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T, RemoteError> {
        debug!(%url, "get_json: called");
        let mut request = self.http.get(url).query(query);
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = request.send().await?;
        let status = response.status().as_u16();

        if !response.status().is_success() {
            let headers = response.headers().clone();
            let body = response.text().await.unwrap_or_default();
            let err = RemoteError::from_response(status, &headers, body);
            debug!(%url, status, error = %err, "get_json: non-success status");
            return Err(err);
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| RemoteError::InvalidResponse(format!("{}: {}", url, e)))
    }
}

#[async_trait]
impl RepoApi for GitHubClient {
    async fn fetch_latest_commit(&self, repo: &RepositoryRef) -> Result<CommitId, RemoteError> {
        debug!(%repo, "fetch_latest_commit: called");
        let url = self.repo_url(repo, "/commits");
        let commits: Vec<CommitSummary> = self.get_json(&url, &[("per_page", "1")]).await?;

        commits
            .into_iter()
            .next()
            .map(|c| CommitId::new(c.sha))
            .ok_or_else(|| RemoteError::InvalidResponse(format!("{} has no commits", repo)))
    }

    async fn fetch_changed_paths(
        &self,
        repo: &RepositoryRef,
        base: &CommitId,
        head: &CommitId,
    ) -> Result<Vec<String>, RemoteError> {
        debug!(%repo, base = %base.short(), head = %head.short(), "fetch_changed_paths: called");
        let url = self.repo_url(repo, &format!("/compare/{}...{}", base, head));
        let comparison: Comparison = self.get_json(&url, &[]).await?;

        Ok(comparison.files.into_iter().map(|f| f.filename).collect())
    }

    async fn fetch_default_branch(&self, repo: &RepositoryRef) -> Result<String, RemoteError> {
        debug!(%repo, "fetch_default_branch: called");
        let url = self.repo_url(repo, "");
        let info: RepositoryInfo = self.get_json(&url, &[]).await?;
        Ok(info.default_branch)
    }

    async fn fetch_tree(&self, repo: &RepositoryRef, branch: &str) -> Result<Vec<TreeEntry>, RemoteError> {
        debug!(%repo, %branch, "fetch_tree: called");
        let url = self.repo_url(repo, &format!("/git/trees/{}", branch));
        let listing: TreeListing = self.get_json(&url, &[("recursive", "1")]).await?;

        if listing.truncated {
            warn!(%repo, %branch, entries = listing.tree.len(), "Tree listing truncated by the API; registry is partial");
        }

        Ok(listing.tree)
    }
}
