use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::storage::client::{
    ContentClient, DirEntry, EntryKind, NewRepository, RemoteFile, RepositoryInfo,
};

/// In-process file tree with the same revision semantics as the GitHub
/// contents API. Useful for tests and offline runs.
#[derive(Default)]
pub struct InMemoryContentClient {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    repository: Option<RepositoryInfo>,
    files: BTreeMap<String, StoredFile>,
    failing_paths: HashSet<String>,
    next_revision: u64,
}

struct StoredFile {
    content: Vec<u8>,
    revision: String,
}

impl State {
    fn bump_revision(&mut self) -> String {
        self.next_revision += 1;
        format!("{:040x}", self.next_revision)
    }

    fn check_available(&self, path: &str) -> Result<(), StoreError> {
        if self.failing_paths.contains(path) {
            return Err(StoreError::transport(Some(503), format!("simulated failure on '{path}'")));
        }
        Ok(())
    }

    fn require_repository(&self) -> Result<(), StoreError> {
        if self.repository.is_none() {
            return Err(StoreError::transport(Some(404), "GitHub API error: Not Found"));
        }
        Ok(())
    }
}

impl InMemoryContentClient {
    /// An empty client whose repository does not exist yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// A client whose repository already exists.
    pub fn with_repository(name: &str) -> Self {
        let client = Self::default();
        client.lock().repository = Some(RepositoryInfo {
            name: name.to_string(),
            full_name: name.to_string(),
            private: false,
            default_branch: Some("main".to_string()),
        });
        client
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // A panic while holding the lock leaves the tree consistent, so keep going.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn has_repository(&self) -> bool {
        self.lock().repository.is_some()
    }

    /// Write raw bytes, bypassing revision checks.
    pub fn insert_raw(&self, path: &str, content: impl Into<Vec<u8>>) -> String {
        let mut state = self.lock();
        let revision = state.bump_revision();
        state.files.insert(
            path.to_string(),
            StoredFile {
                content: content.into(),
                revision: revision.clone(),
            },
        );
        revision
    }

    /// Raw bytes at `path`, if any.
    pub fn read_raw(&self, path: &str) -> Option<Vec<u8>> {
        self.lock().files.get(path).map(|f| f.content.clone())
    }

    /// Every stored path, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.lock().files.keys().cloned().collect()
    }

    /// Make every read and write of `path` fail with a 503.
    pub fn fail_path(&self, path: &str) {
        self.lock().failing_paths.insert(path.to_string());
    }
}

#[async_trait]
impl ContentClient for InMemoryContentClient {
    async fn get_repository(&self) -> Result<Option<RepositoryInfo>, StoreError> {
        Ok(self.lock().repository.clone())
    }

    async fn create_repository(&self, request: &NewRepository) -> Result<RepositoryInfo, StoreError> {
        let mut state = self.lock();
        if state.repository.is_some() {
            return Err(StoreError::transport(
                Some(422),
                "GitHub API error: Repository creation failed.",
            ));
        }
        let info = RepositoryInfo {
            name: request.name.clone(),
            full_name: request.name.clone(),
            private: request.private,
            default_branch: Some("main".to_string()),
        };
        state.repository = Some(info.clone());
        Ok(info)
    }

    async fn get_file(&self, path: &str) -> Result<Option<RemoteFile>, StoreError> {
        let state = self.lock();
        state.check_available(path)?;
        Ok(state.files.get(path).map(|f| RemoteFile {
            path: path.to_string(),
            revision: f.revision.clone(),
            content: f.content.clone(),
        }))
    }

    async fn put_file(
        &self,
        path: &str,
        content: Vec<u8>,
        _message: &str,
        revision: Option<String>,
    ) -> Result<String, StoreError> {
        let mut state = self.lock();
        state.require_repository()?;
        state.check_available(path)?;

        let current = state.files.get(path).map(|f| f.revision.as_str());
        if current != revision.as_deref() {
            return Err(StoreError::ConcurrentModification {
                path: path.to_string(),
            });
        }

        let revision = state.bump_revision();
        state.files.insert(
            path.to_string(),
            StoredFile {
                content,
                revision: revision.clone(),
            },
        );
        Ok(revision)
    }

    async fn delete_file(&self, path: &str, revision: &str, _message: &str) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.require_repository()?;
        state.check_available(path)?;

        let current = state.files.get(path).map(|f| f.revision.clone());
        match current {
            None => Err(StoreError::transport(Some(404), "GitHub API error: Not Found")),
            Some(current) if current != revision => Err(StoreError::ConcurrentModification {
                path: path.to_string(),
            }),
            Some(_) => {
                state.files.remove(path);
                Ok(())
            }
        }
    }

    async fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>, StoreError> {
        let state = self.lock();
        state.check_available(path)?;

        let prefix = format!("{}/", path.trim_end_matches('/'));
        let mut files = Vec::new();
        let mut dirs = BTreeSet::new();

        for key in state.files.keys() {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((dir, _)) => {
                    dirs.insert(dir.to_string());
                }
                None => files.push(DirEntry {
                    name: rest.to_string(),
                    path: key.clone(),
                    kind: EntryKind::File,
                }),
            }
        }

        files.extend(dirs.into_iter().map(|name| DirEntry {
            path: format!("{prefix}{name}"),
            name,
            kind: EntryKind::Dir,
        }));
        Ok(files)
    }
}
