use std::sync::Arc;

use crate::config::{Session, StoreConfig};
use crate::error::StoreError;
use crate::raw::RawReader;
use crate::storage::client::ContentClient;
use crate::storage::github::GitHubClient;
use crate::store::{AnalyticsStore, DocumentStore, ShareLinkStore};

/// Every store wired to one backing client.
#[derive(Clone)]
pub struct AppState {
    pub documents: DocumentStore,
    pub links: ShareLinkStore,
    pub analytics: AnalyticsStore,
    pub raw: RawReader,
}

impl AppState {
    /// Build the stores on top of an existing client.
    ///
    /// `owner` is the account owning the repository; it only shapes raw URLs.
    pub fn new(
        client: Arc<dyn ContentClient>,
        config: &StoreConfig,
        owner: &str,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            documents: DocumentStore::new(client.clone(), config),
            links: ShareLinkStore::new(client.clone(), config, owner),
            analytics: AnalyticsStore::new(client),
            raw: RawReader::new(config)?,
        })
    }

    /// Build the stores against the GitHub API for `session`.
    pub fn github(config: &StoreConfig, session: Session) -> Result<Self, StoreError> {
        let owner = session.owner.clone();
        let client: Arc<dyn ContentClient> = Arc::new(GitHubClient::new(config, session)?);
        tracing::info!(
            "Using repository {}/{} on {}",
            owner,
            config.repository,
            config.api_base_url
        );
        Self::new(client, config, &owner)
    }
}
