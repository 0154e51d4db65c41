use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::storage::layout;

/// Maximum length of the slug part of a document id (before the suffix).
pub const MAX_SLUG_LEN: usize = 50;

const FALLBACK_SLUG: &str = "untitled";
const LINK_ID_LEN: usize = 26;
const LINK_ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

static LAST_TOKEN: AtomicI64 = AtomicI64::new(0);

/// Millisecond timestamp that never repeats within the process.
///
/// Follows wall-clock time, but when two calls land in the same millisecond
/// (or the clock steps back) the later call gets `previous + 1`.
pub fn unique_millis() -> i64 {
    let now = chrono::Utc::now().timestamp_millis();
    let mut last = LAST_TOKEN.load(Ordering::Relaxed);
    loop {
        let next = if now > last { now } else { last + 1 };
        match LAST_TOKEN.compare_exchange_weak(last, next, Ordering::SeqCst, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(observed) => last = observed,
        }
    }
}

/// Turn a title into a path-safe slug.
///
/// Lower-cases, drops everything outside `[a-z0-9]` and whitespace, joins the
/// remaining words with single hyphens and truncates to [`MAX_SLUG_LEN`].
pub fn slugify(title: &str) -> String {
    let kept: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect();

    let joined = kept.split_whitespace().collect::<Vec<_>>().join("-");
    // Only ASCII survives the filter, so byte truncation is char-safe.
    let truncated = &joined[..joined.len().min(MAX_SLUG_LEN)];
    truncated.trim_end_matches('-').to_string()
}

/// Stable identity of a stored document; also its file name without extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Derive a fresh id from a title: `<slug>-<unique millis>`.
    pub fn derive(title: &str) -> Self {
        Self::derive_with_token(title, unique_millis())
    }

    pub fn derive_with_token(title: &str, token: i64) -> Self {
        let slug = slugify(title);
        let slug = if slug.is_empty() { FALLBACK_SLUG.to_string() } else { slug };
        DocumentId(format!("{slug}-{token}"))
    }

    /// Wrap an existing id, e.g. one read back from a directory listing.
    ///
    /// Returns `None` when the id could escape the posts directory.
    pub fn parse(raw: &str) -> Option<Self> {
        let valid = !raw.is_empty()
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            && !raw.starts_with('.');
        valid.then(|| DocumentId(raw.to_string()))
    }

    /// Recover the id from a file name such as `hello-world-1700000000000.md`.
    pub fn from_file_name(name: &str) -> Option<Self> {
        name.strip_suffix(layout::POST_EXTENSION)
            .and_then(DocumentId::parse)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Repository path of the document, e.g. `blogs/<id>.md`.
    pub fn path(&self) -> String {
        layout::post_path(&self.0)
    }

    pub fn file_name(&self) -> String {
        format!("{}{}", self.0, layout::POST_EXTENSION)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Random identity of a share link.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(String);

impl LinkId {
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let id = (0..LINK_ID_LEN)
            .map(|_| LINK_ID_ALPHABET[rng.random_range(0..LINK_ID_ALPHABET.len())] as char)
            .collect();
        LinkId(id)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let valid = !raw.is_empty() && raw.chars().all(|c| c.is_ascii_alphanumeric());
        valid.then(|| LinkId(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
