use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::identity::DocumentId;

/// A post as authored: title, markdown body, tags and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    /// Markdown body.
    pub body: String,
    /// Display order only.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Document {
    /// A new, never-saved document. Timestamps are filled in on save.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            tags: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Title and body are both required.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.title.trim().is_empty() {
            return Err(StoreError::InvalidDocument("title cannot be empty".into()));
        }
        if self.body.trim().is_empty() {
            return Err(StoreError::InvalidDocument("body cannot be empty".into()));
        }
        Ok(())
    }

    /// Plain-text preview of the body, at most `max_len` bytes, cut on a char boundary.
    pub fn excerpt(&self, max_len: usize) -> String {
        strip_markdown_for_preview(&self.body, max_len)
    }

    /// Case-insensitive match against title, body and tags.
    ///
    /// An empty term matches everything.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&term)
            || self.body.to_lowercase().contains(&term)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&term))
    }
}

/// A document read back from the repository.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: DocumentId,
    /// Revision token of the file at read time (git blob sha).
    pub revision: String,
    pub document: Document,
}

/// Sort newest first by `created_at`, undated documents last, ties broken by id.
///
/// Listing order is otherwise unspecified.
pub fn sort_newest_first(documents: &mut [StoredDocument]) {
    documents.sort_by(|a, b| {
        b.document
            .created_at
            .cmp(&a.document.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Preview line for post listings: text and inline code only, single-spaced.
fn strip_markdown_for_preview(raw: &str, max_len: usize) -> String {
    use pulldown_cmark::{Event, Options, Parser};

    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS;

    let mut preview = String::new();
    for event in Parser::new_ext(raw, options) {
        let fragment = match event {
            Event::Text(t) | Event::Code(t) => t,
            _ => continue,
        };
        let fragment = fragment.split_whitespace().collect::<Vec<_>>().join(" ");
        if fragment.is_empty() {
            continue;
        }
        if !preview.is_empty() {
            preview.push(' ');
        }
        preview.push_str(&fragment);
        if preview.len() >= max_len {
            break;
        }
    }

    if preview.len() > max_len {
        let mut cut = max_len;
        while !preview.is_char_boundary(cut) {
            cut -= 1;
        }
        preview.truncate(cut);
    }
    preview.trim_end().to_string()
}
