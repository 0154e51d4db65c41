use std::sync::Arc;

use futures::future::join_all;

use crate::error::StoreError;
use crate::identity::{unique_millis, LinkId};
use crate::models::click::ClickEvent;
use crate::storage::client::ContentClient;
use crate::storage::layout;
use crate::store::{create_json, read_json};

/// Append-only click log: one `analytics/clicks/{link_id}-{millis}.json` file
/// per share-link resolution.
#[derive(Clone)]
pub struct AnalyticsStore {
    client: Arc<dyn ContentClient>,
}

impl AnalyticsStore {
    pub fn new(client: Arc<dyn ContentClient>) -> Self {
        Self { client }
    }

    /// Record a click without ever failing the caller.
    ///
    /// Tracking sits on the read path of shared posts, so errors are only logged.
    pub async fn record_click(&self, link_id: &LinkId, address: &str, client_signature: &str) {
        let event = ClickEvent::new(link_id.clone(), address, client_signature);
        if let Err(e) = self.record(&event).await {
            tracing::warn!("Failed to record click for link '{link_id}': {e}");
        }
    }

    /// Write one event, returning its path.
    pub async fn record(&self, event: &ClickEvent) -> Result<String, StoreError> {
        let path = layout::click_path(event.link_id.as_str(), unique_millis());
        create_json(
            self.client.as_ref(),
            &path,
            event,
            &format!("Track click: {}", event.link_id),
        )
        .await?;
        tracing::debug!("Recorded click at '{path}'");
        Ok(path)
    }

    /// Every readable click of `link_id`, oldest first.
    ///
    /// Unreadable events are skipped; a failed enumeration yields no events.
    pub async fn list_clicks(&self, link_id: &LinkId) -> Vec<ClickEvent> {
        let entries = match self.client.list_dir(layout::CLICKS_DIR).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Failed to list clicks for link '{link_id}': {e}");
                return Vec::new();
            }
        };

        let prefix = layout::click_prefix(link_id.as_str());
        let paths: Vec<String> = entries
            .into_iter()
            .filter(|entry| {
                entry.is_file()
                    && entry.name.starts_with(&prefix)
                    && entry.name.ends_with(layout::JSON_EXTENSION)
            })
            .map(|entry| entry.path)
            .collect();

        let reads = join_all(
            paths
                .iter()
                .map(|path| read_json::<ClickEvent>(self.client.as_ref(), path)),
        )
        .await;

        let mut events: Vec<ClickEvent> = reads
            .into_iter()
            .zip(&paths)
            .filter_map(|(read, path)| match read {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!("Skipping click record '{path}': {e}");
                    None
                }
            })
            .collect();

        events.sort_by_key(|event| event.timestamp);
        events
    }
}
