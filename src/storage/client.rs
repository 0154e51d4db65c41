use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// A file read from the repository.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteFile {
    pub path: String,
    /// Revision token (blob sha) required to update or delete this file.
    pub revision: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    #[serde(other)]
    Other,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

impl DirEntry {
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// Descriptor of the backing repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub default_branch: Option<String>,
}

/// Payload for creating the backing repository.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewRepository {
    pub name: String,
    pub description: String,
    pub private: bool,
    pub auto_init: bool,
}

/// Operations on the versioned file tree backing every store.
///
/// Abstracted as a trait so stores can run against GitHub, an in-memory
/// tree, or a mock.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentClient: Send + Sync {
    /// Fetch the repository descriptor. Returns `None` if it doesn't exist.
    async fn get_repository(&self) -> Result<Option<RepositoryInfo>, StoreError>;

    async fn create_repository(&self, request: &NewRepository) -> Result<RepositoryInfo, StoreError>;

    /// Retrieve a file by path. Returns `None` if the file doesn't exist.
    async fn get_file(&self, path: &str) -> Result<Option<RemoteFile>, StoreError>;

    /// Create or replace a file, returning its new revision token.
    ///
    /// `revision` must be the current token when the file already exists;
    /// a stale or missing token fails with `ConcurrentModification`.
    async fn put_file(
        &self,
        path: &str,
        content: Vec<u8>,
        message: &str,
        revision: Option<String>,
    ) -> Result<String, StoreError>;

    /// Delete a file at the given revision.
    async fn delete_file(&self, path: &str, revision: &str, message: &str) -> Result<(), StoreError>;

    /// List a directory. A missing directory lists as empty.
    async fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>, StoreError>;
}
