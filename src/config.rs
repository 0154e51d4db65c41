use std::path::Path;

use serde::Deserialize;

use crate::error::StoreError;

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_RAW_BASE_URL: &str = "https://raw.githubusercontent.com";
pub const DEFAULT_REPOSITORY: &str = "blivate-blog-posts";
pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_SHARE_BASE_URL: &str = "http://localhost:8080";

/// Where the posts live and how to reach them.
///
/// Credentials live in [`Session`].
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Origin of the hosting API (e.g. `https://api.github.com`).
    pub api_base_url: String,
    /// Origin serving raw file contents anonymously.
    pub raw_base_url: String,
    /// Name of the repository that holds every post, link and click.
    pub repository: String,
    /// Branch used for reads, writes and raw URLs.
    ///
    /// Must exist in the repository. Repositories created on first use get
    /// the account's default branch, which may be `master` rather than `main`.
    pub branch: String,
    /// Public origin of the application; share URLs are built on it.
    pub share_base_url: String,
    /// `User-Agent` sent with every request (GitHub rejects requests without one).
    pub user_agent: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            raw_base_url: DEFAULT_RAW_BASE_URL.to_string(),
            repository: DEFAULT_REPOSITORY.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
            share_base_url: DEFAULT_SHARE_BASE_URL.to_string(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_user_agent() -> String {
    format!("blivate/{}", env!("CARGO_PKG_VERSION"))
}

impl StoreConfig {
    /// Load the configuration.
    ///
    /// Sources, later ones winning:
    /// - built-in defaults
    /// - the optional TOML file at `file`
    /// - `BLIVATE_*` environment variables (e.g. `BLIVATE_REPOSITORY`,
    ///   `BLIVATE_API_BASE_URL`)
    pub fn load(file: Option<&Path>) -> Result<Self, StoreError> {
        let defaults = StoreConfig::default();

        let mut builder = config::Config::builder()
            .set_default("api_base_url", defaults.api_base_url)?
            .set_default("raw_base_url", defaults.raw_base_url)?
            .set_default("repository", defaults.repository)?
            .set_default("branch", defaults.branch)?
            .set_default("share_base_url", defaults.share_base_url)?
            .set_default("user_agent", defaults.user_agent)?;

        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        let settings = builder
            .add_source(config::Environment::with_prefix("BLIVATE"))
            .build()?;

        let config: StoreConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Point the configuration at a different repository.
    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = repository.into();
        self
    }

    /// Point both API and raw origins at a single base (used with mock servers).
    pub fn with_base_urls(mut self, api: impl Into<String>, raw: impl Into<String>) -> Self {
        self.api_base_url = api.into();
        self.raw_base_url = raw.into();
        self
    }

    pub fn with_share_base_url(mut self, share_base_url: impl Into<String>) -> Self {
        self.share_base_url = share_base_url.into();
        self
    }

    fn validate(&self) -> Result<(), StoreError> {
        if self.repository.trim().is_empty() {
            return Err(StoreError::Config("repository cannot be empty".into()));
        }
        if self.branch.trim().is_empty() {
            return Err(StoreError::Config("branch cannot be empty".into()));
        }
        for (name, value) in [
            ("api_base_url", &self.api_base_url),
            ("raw_base_url", &self.raw_base_url),
            ("share_base_url", &self.share_base_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| StoreError::Config(format!("{name} '{value}' is not a URL: {e}")))?;
        }
        Ok(())
    }
}

/// The authenticated account the store acts for.
///
/// `owner` is the login owning the backing repository; `token` is the bearer
/// credential. Both are passed explicitly to the transport.
#[derive(Clone)]
pub struct Session {
    pub owner: String,
    pub token: String,
}

impl Session {
    pub fn new(owner: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            token: token.into(),
        }
    }

    /// Build the session from environment variables.
    ///
    /// Required env vars:
    /// - `BLIVATE_OWNER`
    /// - `BLIVATE_TOKEN`
    pub fn from_env() -> Result<Self, StoreError> {
        Ok(Self {
            owner: std::env::var("BLIVATE_OWNER")
                .map_err(|_| StoreError::Config("BLIVATE_OWNER not set".into()))?,
            token: std::env::var("BLIVATE_TOKEN")
                .map_err(|_| StoreError::Config("BLIVATE_TOKEN not set".into()))?,
        })
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("owner", &self.owner)
            .field("token", &"<redacted>")
            .finish()
    }
}
