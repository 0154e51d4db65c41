#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tokio::sync::Barrier;
use wiremock::MockServer;

use blivate::storage::client::{ContentClient, DirEntry, NewRepository, RemoteFile, RepositoryInfo};
use blivate::storage::github::GitHubClient;
use blivate::storage::memory::InMemoryContentClient;
use blivate::{AppState, Session, StoreConfig, StoreError};

pub const OWNER: &str = "octocat";
pub const TOKEN: &str = "ghp_test_token";
pub const REPOSITORY: &str = "blivate-blog-posts";

/// Stores wired to an in-memory repository.
pub struct MemoryEnv {
    pub client: Arc<InMemoryContentClient>,
    pub config: StoreConfig,
    pub app: AppState,
}

impl MemoryEnv {
    /// Repository does not exist yet.
    pub fn empty() -> Self {
        Self::with_client(Arc::new(InMemoryContentClient::new()))
    }

    /// Repository already created.
    pub fn ready() -> Self {
        Self::with_client(Arc::new(InMemoryContentClient::with_repository(REPOSITORY)))
    }

    pub fn with_client(client: Arc<InMemoryContentClient>) -> Self {
        let config = StoreConfig::default()
            .with_repository(REPOSITORY)
            .with_share_base_url("https://blog.example.com");
        let app = AppState::new(client.clone(), &config, OWNER).expect("Failed to build stores");
        Self {
            client,
            config,
            app,
        }
    }
}

/// Config pointing both the API and raw URLs at a mock server.
pub fn mock_config(server: &MockServer) -> StoreConfig {
    StoreConfig::default()
        .with_repository(REPOSITORY)
        .with_base_urls(server.uri(), server.uri())
}

pub fn github_client(server: &MockServer) -> GitHubClient {
    GitHubClient::new(&mock_config(server), Session::new(OWNER, TOKEN))
        .expect("Failed to build GitHub client")
}

/// Contents-API path of `file` in the test repository.
pub fn contents_path(file: &str) -> String {
    format!("/repos/{OWNER}/{REPOSITORY}/contents/{file}")
}

/// A contents-API file payload, base64 wrapped at 60 columns like GitHub does.
pub fn contents_json(file: &str, sha: &str, text: &str) -> serde_json::Value {
    let encoded = STANDARD.encode(text);
    let wrapped = encoded
        .as_bytes()
        .chunks(60)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join("\n");
    serde_json::json!({
        "name": file.rsplit('/').next().unwrap_or(file),
        "path": file,
        "sha": sha,
        "type": "file",
        "encoding": "base64",
        "content": wrapped,
    })
}

/// Wraps an in-memory client so that `parties` concurrent `get_file` calls
/// all return before any of them proceeds, forcing writers onto the same
/// revision.
pub struct LockstepClient {
    inner: Arc<InMemoryContentClient>,
    barrier: Barrier,
}

impl LockstepClient {
    pub fn new(inner: Arc<InMemoryContentClient>, parties: usize) -> Self {
        Self {
            inner,
            barrier: Barrier::new(parties),
        }
    }
}

#[async_trait]
impl ContentClient for LockstepClient {
    async fn get_repository(&self) -> Result<Option<RepositoryInfo>, StoreError> {
        self.inner.get_repository().await
    }

    async fn create_repository(&self, request: &NewRepository) -> Result<RepositoryInfo, StoreError> {
        self.inner.create_repository(request).await
    }

    async fn get_file(&self, path: &str) -> Result<Option<RemoteFile>, StoreError> {
        let file = self.inner.get_file(path).await;
        self.barrier.wait().await;
        file
    }

    async fn put_file(
        &self,
        path: &str,
        content: Vec<u8>,
        message: &str,
        revision: Option<String>,
    ) -> Result<String, StoreError> {
        self.inner.put_file(path, content, message, revision).await
    }

    async fn delete_file(&self, path: &str, revision: &str, message: &str) -> Result<(), StoreError> {
        self.inner.delete_file(path, revision, message).await
    }

    async fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>, StoreError> {
        self.inner.list_dir(path).await
    }
}
