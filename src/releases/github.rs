//! GitHub releases backend

use std::future::Future;
use std::path::Path;

use reqwest::header::ACCEPT;
use reqwest::Client;

use crate::config;
use crate::download::{download_to_file, AssetFetcher};
use crate::error::{Error, Result};
use crate::{log_debug, log_error, log_info, log_warn};

use super::models::{AssetDescriptor, ReleaseDescriptor};
use super::ReleaseSource;

const MODULE: &str = "releases::github";

/// Client for one repository's releases
pub struct GithubClient {
    client: Client,
    api_base: String,
    repo: String,
    token: Option<String>,
}

impl GithubClient {
    /// # Arguments
    /// * `repo` - "owner/name"
    /// * `token` - optional API token to lift anonymous rate limits
    pub fn new(repo: &str, token: Option<String>) -> Result<Self> {
        Self::with_api_base(config::urls::GITHUB_API, repo, token)
    }

    pub fn with_api_base(api_base: &str, repo: &str, token: Option<String>) -> Result<Self> {
        let repo = repo.trim().trim_matches('/');
        if repo.split('/').filter(|s| !s.is_empty()).count() != 2 {
            return Err(Error::Configuration(format!(
                "repository must look like 'owner/name', got '{}'",
                repo
            )));
        }

        let client = Client::builder()
            .user_agent(config::app::USER_AGENT)
            .build()
            .map_err(|e| Error::Network(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            repo: repo.to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    /// URL of one page of the release listing, starting at page 1
    pub fn releases_url(&self, page: u32) -> String {
        format!(
            "{}/repos/{}/releases?per_page={}&page={}",
            self.api_base,
            self.repo,
            config::urls::RELEASES_PER_PAGE,
            page
        )
    }

    async fn fetch_page(&self, page: u32) -> Result<Vec<ReleaseDescriptor>> {
        let url = self.releases_url(page);
        log_debug!(MODULE, "Fetching {}", url);

        let mut request = self
            .client
            .get(&url)
            .header(ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            log_error!(MODULE, "Failed to fetch releases: {}", e);
            Error::Network(format!("failed to fetch releases: {}", e))
        })?;

        if !response.status().is_success() {
            return Err(Error::Network(format!(
                "GitHub API request failed with status: {}",
                response.status()
            )));
        }

        response.json().await.map_err(|e| {
            log_error!(MODULE, "Failed to parse releases JSON: {}", e);
            Error::Network(format!("failed to parse releases: {}", e))
        })
    }
}

/// Request pages 1, 2, ... until one comes back short of `per_page`
async fn collect_pages<F, Fut>(
    per_page: usize,
    max_pages: u32,
    mut fetch_page: F,
) -> Result<Vec<ReleaseDescriptor>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Vec<ReleaseDescriptor>>>,
{
    let mut releases = Vec::new();
    for page in 1..=max_pages {
        let batch = fetch_page(page).await?;
        let last = batch.len() < per_page;
        releases.extend(batch);
        if last {
            return Ok(releases);
        }
    }
    log_warn!(
        MODULE,
        "Stopped after {} pages ({} releases); older releases are not listed",
        max_pages,
        releases.len()
    );
    Ok(releases)
}

impl ReleaseSource for GithubClient {
    async fn list_releases(&self) -> Result<Vec<ReleaseDescriptor>> {
        log_info!(MODULE, "Fetching releases of {} from {}", self.repo, self.api_base);
        if self.token.is_some() {
            log_debug!(MODULE, "Using API token");
        }
        collect_pages(
            config::urls::RELEASES_PER_PAGE as usize,
            config::urls::MAX_RELEASE_PAGES,
            |page| self.fetch_page(page),
        )
        .await
    }
}

impl AssetFetcher for GithubClient {
    async fn fetch(&self, asset: &AssetDescriptor, dest: &Path) -> Result<u64> {
        download_to_file(&self.client, &asset.download_url, dest).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_releases_url() {
        let client =
            GithubClient::with_api_base("https://api.example.invalid/", "/meshtastic/firmware/", None)
                .unwrap();
        assert_eq!(
            client.releases_url(3),
            "https://api.example.invalid/repos/meshtastic/firmware/releases?per_page=100&page=3"
        );
    }

    #[test]
    fn test_rejects_malformed_repo() {
        for repo in ["meshtastic", "a/b/c", ""] {
            let err = GithubClient::new(repo, None).err().unwrap();
            assert!(matches!(err, Error::Configuration(_)), "{}", repo);
        }
    }

    #[test]
    fn test_blank_token_is_ignored() {
        let client = GithubClient::new("meshtastic/firmware", Some("  ".into())).unwrap();
        assert!(client.token.is_none());
    }

    fn page(start: usize, len: usize) -> Vec<ReleaseDescriptor> {
        (start..start + len)
            .map(|i| ReleaseDescriptor {
                tag: format!("v2.{}.0", i),
                is_prerelease: false,
                draft: false,
                published_at: None,
                created_at: None,
                assets: Vec::new(),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_collects_pages_until_short_page() {
        let mut requested = Vec::new();
        let releases = collect_pages(3, 10, |n| {
            requested.push(n);
            let batch = match n {
                1 => page(0, 3),
                2 => page(3, 3),
                _ => page(6, 1),
            };
            async move { Ok(batch) }
        })
        .await
        .unwrap();
        assert_eq!(requested, vec![1, 2, 3]);
        assert_eq!(releases.len(), 7);
        assert_eq!(releases[6].tag, "v2.6.0");
    }

    #[tokio::test]
    async fn test_empty_page_ends_listing() {
        let mut calls = 0;
        let releases = collect_pages(2, 10, |n| {
            calls += 1;
            let batch = if n == 1 { page(0, 2) } else { Vec::new() };
            async move { Ok(batch) }
        })
        .await
        .unwrap();
        assert_eq!(calls, 2);
        assert_eq!(releases.len(), 2);
    }

    #[tokio::test]
    async fn test_page_limit_and_errors() {
        let capped = collect_pages(1, 4, |n| {
            let batch = page(n as usize, 1);
            async move { Ok(batch) }
        })
        .await
        .unwrap();
        assert_eq!(capped.len(), 4);

        let failed = collect_pages(1, 4, |n| async move {
            if n == 2 {
                Err(Error::Network("rate limited".into()))
            } else {
                Ok(page(0, 1))
            }
        })
        .await;
        assert!(matches!(failed, Err(Error::Network(_))));
    }
}
