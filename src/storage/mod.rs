pub mod client;
pub mod github;
pub mod layout;
pub mod memory;

pub use client::{ContentClient, DirEntry, EntryKind, RemoteFile, RepositoryInfo};
pub use github::GitHubClient;
pub use memory::InMemoryContentClient;
