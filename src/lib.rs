//! Post storage on top of a GitHub repository.
//!
//! Posts are markdown files with a front-matter header under `blogs/`; share
//! links and click events are JSON files under `analytics/`. The repository
//! is the only database.

pub mod analytics;
pub mod app;
pub mod codec;
pub mod config;
pub mod error;
pub mod identity;
pub mod models {
    pub mod click;
    pub mod document;
    pub mod share_link;
}
pub mod raw;
pub mod repository;
pub mod storage;
pub mod store;

pub use app::AppState;
pub use config::{Session, StoreConfig};
pub use error::{Lookup, StoreError};
pub use identity::{DocumentId, LinkId};
pub use models::click::ClickEvent;
pub use models::document::{Document, StoredDocument};
pub use models::share_link::{IssuedLink, ShareLink};
