use std::sync::Arc;

use chrono::{SubsecRound, Utc};
use futures::future::join_all;

use crate::codec::front_matter;
use crate::config::StoreConfig;
use crate::error::{Lookup, StoreError};
use crate::identity::DocumentId;
use crate::models::document::{Document, StoredDocument};
use crate::repository::ensure_collection_exists;
use crate::storage::client::{ContentClient, RemoteFile};
use crate::storage::layout;

/// CRUD over posts stored as `blogs/{id}.md`.
///
/// Writes use optimistic concurrency: the file's current revision is fetched
/// right before each write and sent with it, so a write racing another one
/// fails with [`StoreError::ConcurrentModification`] instead of overwriting it.
/// The fetch-then-write window is not closed; nothing is retried.
#[derive(Clone)]
pub struct DocumentStore {
    client: Arc<dyn ContentClient>,
    repository: String,
    branch: String,
}

impl DocumentStore {
    pub fn new(client: Arc<dyn ContentClient>, config: &StoreConfig) -> Self {
        Self {
            client,
            repository: config.repository.clone(),
            branch: config.branch.clone(),
        }
    }

    /// Create (`id` = `None`) or update a document. Returns the id written to.
    ///
    /// `created_at` is kept from the stored file when there is one, otherwise
    /// taken from `document`, otherwise set to now; `updated_at` is always now.
    pub async fn save(
        &self,
        document: &Document,
        id: Option<&DocumentId>,
    ) -> Result<DocumentId, StoreError> {
        document.validate()?;
        ensure_collection_exists(self.client.as_ref(), &self.repository, &self.branch).await?;

        let id = match id {
            Some(id) => id.clone(),
            None => DocumentId::derive(&document.title),
        };
        let path = id.path();

        let existing = match self.client.get_file(&path).await {
            Ok(file) => file,
            Err(e) => {
                tracing::debug!("No readable revision for '{path}' ({e}), writing without one");
                None
            }
        };

        let now = Utc::now().trunc_subsecs(3);
        let stored_created_at = existing
            .as_ref()
            .and_then(|file| decode_file(file).ok())
            .and_then(|doc| doc.created_at);

        let to_store = Document {
            created_at: Some(
                stored_created_at
                    .or(document.created_at.map(|t| t.trunc_subsecs(3)))
                    .unwrap_or(now),
            ),
            updated_at: Some(now),
            ..document.clone()
        };

        let message = match existing {
            Some(_) => format!("Update post: {}", document.title),
            None => format!("Create post: {}", document.title),
        };
        let revision = existing.map(|file| file.revision);
        let is_update = revision.is_some();

        self.client
            .put_file(&path, front_matter::encode(&to_store).into_bytes(), &message, revision)
            .await?;

        if is_update {
            tracing::info!("Updated post '{id}'");
        } else {
            tracing::info!("Created post '{id}'");
        }
        Ok(id)
    }

    /// Read one document.
    pub async fn get(&self, id: &DocumentId) -> Lookup<StoredDocument> {
        let file = match self.client.get_file(&id.path()).await {
            Ok(Some(file)) => file,
            Ok(None) => return Lookup::Absent,
            Err(e) => return Lookup::Failed(e),
        };

        match decode_file(&file) {
            Ok(document) => Lookup::Found(StoredDocument {
                id: id.clone(),
                revision: file.revision,
                document,
            }),
            Err(e) => Lookup::Failed(e),
        }
    }

    /// Delete a document at its current revision. No tombstone is kept.
    pub async fn delete(&self, id: &DocumentId) -> Result<(), StoreError> {
        let path = id.path();
        let file = self
            .client
            .get_file(&path)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("post '{id}'")))?;

        self.client
            .delete_file(&path, &file.revision, &format!("Delete post: {id}"))
            .await?;

        tracing::info!("Deleted post '{id}'");
        Ok(())
    }

    /// Every readable document, in no particular order.
    ///
    /// Failures are logged and degrade to fewer (or no) results.
    pub async fn list_all(&self) -> Vec<StoredDocument> {
        match self.try_list_all().await {
            Ok(documents) => documents,
            Err(e) => {
                tracing::warn!("Failed to list posts: {e}");
                Vec::new()
            }
        }
    }

    /// Like [`list_all`](Self::list_all), but reports a failed enumeration.
    ///
    /// Documents that fail to fetch or decode are still dropped individually.
    pub async fn try_list_all(&self) -> Result<Vec<StoredDocument>, StoreError> {
        ensure_collection_exists(self.client.as_ref(), &self.repository, &self.branch).await?;

        let ids: Vec<DocumentId> = self
            .client
            .list_dir(layout::POSTS_DIR)
            .await?
            .iter()
            .filter(|entry| entry.is_file())
            .filter_map(|entry| DocumentId::from_file_name(&entry.name))
            .collect();

        let lookups = join_all(ids.iter().map(|id| self.get(id))).await;

        Ok(lookups
            .into_iter()
            .zip(&ids)
            .filter_map(|(lookup, id)| match lookup {
                Lookup::Found(doc) => Some(doc),
                Lookup::Absent => None,
                Lookup::Failed(e) => {
                    tracing::warn!("Skipping post '{id}' in listing: {e}");
                    None
                }
            })
            .collect())
    }
}

fn decode_file(file: &RemoteFile) -> Result<Document, StoreError> {
    let text = String::from_utf8(file.content.clone())?;
    front_matter::decode(&text)
}
