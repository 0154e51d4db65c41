//! Stores layered on the repository file tree.

pub mod analytics;
pub mod documents;
pub mod links;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;
use crate::storage::client::ContentClient;

pub use analytics::AnalyticsStore;
pub use documents::DocumentStore;
pub use links::ShareLinkStore;

/// Read and deserialize a JSON file. `Ok(None)` if the file doesn't exist.
pub(crate) async fn read_json<T: DeserializeOwned>(
    client: &dyn ContentClient,
    path: &str,
) -> Result<Option<T>, StoreError> {
    match client.get_file(path).await? {
        Some(file) => Ok(Some(serde_json::from_slice(&file.content)?)),
        None => Ok(None),
    }
}

/// Serialize `value` as pretty JSON and create the file at `path`.
///
/// Records are write-once, so no revision is sent: writing over an existing
/// file fails with `ConcurrentModification`.
pub(crate) async fn create_json<T: Serialize + Sync>(
    client: &dyn ContentClient,
    path: &str,
    value: &T,
    message: &str,
) -> Result<String, StoreError> {
    let payload = serde_json::to_vec_pretty(value)?;
    client.put_file(path, payload, message, None).await
}
