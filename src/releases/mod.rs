//! Release resolution module
//!
//! Fetches the release list and picks the release to flash.

mod filters;
mod github;
mod models;

pub use filters::select_release;
pub use github::GithubClient;
pub use models::{AssetDescriptor, Channel, Position, ReleaseDescriptor, ReleaseQuery};

use crate::error::Result;
use crate::log_info;

const MODULE: &str = "releases";

/// Read-only view of a release hosting backend
#[allow(async_fn_in_trait)]
pub trait ReleaseSource {
    /// Every release known to the backend, in backend order
    async fn list_releases(&self) -> Result<Vec<ReleaseDescriptor>>;
}

/// Fetch the release list once and select the release matching `query`
pub async fn resolve_release<S: ReleaseSource>(
    source: &S,
    query: &ReleaseQuery,
) -> Result<ReleaseDescriptor> {
    let releases = source.list_releases().await?;
    log_info!(MODULE, "Fetched {} releases", releases.len());

    let release = select_release(&releases, query)?;
    log_info!(
        MODULE,
        "Selected release: {} [{}]",
        release.tag,
        release.channel()
    );
    Ok(release)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory release source counting how often it is queried
    pub(crate) struct StaticSource {
        pub releases: Vec<ReleaseDescriptor>,
        pub calls: AtomicUsize,
    }

    impl StaticSource {
        pub fn new(releases: Vec<ReleaseDescriptor>) -> Self {
            Self {
                releases,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl ReleaseSource for StaticSource {
        async fn list_releases(&self) -> Result<Vec<ReleaseDescriptor>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.releases.clone())
        }
    }

    struct OfflineSource;

    impl ReleaseSource for OfflineSource {
        async fn list_releases(&self) -> Result<Vec<ReleaseDescriptor>> {
            Err(Error::Network("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn test_resolve_queries_source_once() {
        let source = StaticSource::new(vec![
            filters::tests::release("v2.7.12", false, 18),
            filters::tests::release("v2.7.11", true, 15),
        ]);
        let query = ReleaseQuery {
            channel: Channel::Alpha,
            position: Position::Latest,
            tag: None,
        };
        let release = resolve_release(&source, &query).await.unwrap();
        assert_eq!(release.tag, "v2.7.11");
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_network_failure_surfaces() {
        let query = ReleaseQuery {
            channel: Channel::Stable,
            position: Position::Latest,
            tag: None,
        };
        let err = resolve_release(&OfflineSource, &query).await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }
}
