use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};

use crate::config::StoreConfig;
use crate::error::{Lookup, StoreError};
use crate::identity::{DocumentId, LinkId};
use crate::models::share_link::{IssuedLink, ShareLink};
use crate::repository::ensure_collection_exists;
use crate::storage::client::ContentClient;
use crate::storage::layout;
use crate::store::{create_json, read_json};

/// Share links stored as `analytics/links/{link_id}.json`.
///
/// The URL handed out is `{share_base_url}/shared/{link_id}`: the application
/// resolves the id to the stored record, then reads the post anonymously from
/// the record's raw URL.
#[derive(Clone)]
pub struct ShareLinkStore {
    client: Arc<dyn ContentClient>,
    owner: String,
    repository: String,
    branch: String,
    raw_base_url: String,
    share_base_url: String,
}

impl ShareLinkStore {
    pub fn new(client: Arc<dyn ContentClient>, config: &StoreConfig, owner: impl Into<String>) -> Self {
        Self {
            client,
            owner: owner.into(),
            repository: config.repository.clone(),
            branch: config.branch.clone(),
            raw_base_url: config.raw_base_url.trim_end_matches('/').to_string(),
            share_base_url: config.share_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Anonymous URL of a post's stored bytes:
    /// `{raw}/{owner}/{repository}/{branch}/blogs/{id}.md`.
    pub fn raw_url(&self, document: &DocumentId) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.raw_base_url,
            self.owner,
            self.repository,
            self.branch,
            document.path()
        )
    }

    pub fn share_url(&self, link_id: &LinkId) -> String {
        format!("{}/shared/{}", self.share_base_url, link_id)
    }

    /// Issue a new link to `document`. The document itself is not checked.
    pub async fn create(
        &self,
        document: &DocumentId,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<IssuedLink, StoreError> {
        ensure_collection_exists(self.client.as_ref(), &self.repository, &self.branch).await?;

        let link = ShareLink {
            link_id: LinkId::generate(),
            document_ref: document.clone(),
            resource_url: self.raw_url(document),
            expires_at,
            created_at: Utc::now().trunc_subsecs(3),
            is_active: true,
        };

        create_json(
            self.client.as_ref(),
            &layout::link_path(link.link_id.as_str()),
            &link,
            &format!("Create share link: {}", link.link_id),
        )
        .await?;

        tracing::info!("Created share link '{}' for post '{}'", link.link_id, document);
        Ok(IssuedLink {
            share_url: self.share_url(&link.link_id),
            link,
        })
    }

    /// Look up a link record. Expired links are returned as-is; check
    /// [`ShareLink::is_expired`] to enforce expiry.
    pub async fn resolve(&self, link_id: &LinkId) -> Lookup<ShareLink> {
        read_json::<ShareLink>(self.client.as_ref(), &layout::link_path(link_id.as_str()))
            .await
            .into()
    }
}
