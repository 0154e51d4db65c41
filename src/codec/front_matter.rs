//! Front-matter serialization of posts.
//!
//! ```text
//! ---
//! title: "<title>"
//! tags: ["tag1", "tag2"]
//! createdAt: "<rfc3339>"
//! updatedAt: "<rfc3339>"
//! ---
//! <body>
//! ```
//!
//! Quoted values escape `\` as `\\`, `"` as `\"` and line breaks as `\n` / `\r`.
//! Decoding is lenient: unknown keys are ignored, missing or unreadable fields
//! fall back to defaults, and unescaped quotes or unquoted tags written by hand
//! are still understood. Only missing delimiters are an error.

use std::sync::LazyLock;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;

use crate::error::StoreError;
use crate::models::document::Document;

pub const DELIMITER: &str = "---";
pub const UNTITLED: &str = "untitled";

static FIELD_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*:\s*(.*?)\s*$").expect("field line pattern is valid")
});

/// Serialize a document into its stored text form.
///
/// Timestamps that are `None` are left out of the header.
pub fn encode(document: &Document) -> String {
    let mut out = String::with_capacity(document.body.len() + 128);
    out.push_str(DELIMITER);
    out.push('\n');

    out.push_str(&format!("title: {}\n", quote(&document.title)));

    let tags: Vec<String> = document.tags.iter().map(|t| quote(t)).collect();
    out.push_str(&format!("tags: [{}]\n", tags.join(", ")));

    if let Some(created_at) = document.created_at {
        out.push_str(&format!("createdAt: {}\n", quote(&format_timestamp(&created_at))));
    }
    if let Some(updated_at) = document.updated_at {
        out.push_str(&format!("updatedAt: {}\n", quote(&format_timestamp(&updated_at))));
    }

    out.push_str(DELIMITER);
    out.push('\n');
    out.push_str(&document.body);
    out
}

/// Parse stored text back into a document.
///
/// Fails with [`StoreError::MalformedDocument`] only when the two `---`
/// delimiter lines cannot be found in order.
pub fn decode(text: &str) -> Result<Document, StoreError> {
    let normalized = text.trim_start_matches('\u{feff}').replace("\r\n", "\n");
    let (header, body) = split_front_matter(&normalized)?;

    let mut title = None;
    let mut tags = None;
    let mut created_at = None;
    let mut updated_at = None;

    for line in header.lines() {
        let Some(caps) = FIELD_LINE.captures(line) else {
            continue;
        };
        let value = caps.get(2).map_or("", |m| m.as_str());
        // First occurrence of a key wins.
        match caps.get(1).map_or("", |m| m.as_str()) {
            "title" if title.is_none() => title = Some(unquote(value)),
            "tags" if tags.is_none() => tags = Some(parse_tags(value)),
            "createdAt" if created_at.is_none() => created_at = Some(parse_timestamp(value)),
            "updatedAt" if updated_at.is_none() => updated_at = Some(parse_timestamp(value)),
            _ => {}
        }
    }

    Ok(Document {
        title: title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNTITLED.to_string()),
        body: body.trim().to_string(),
        tags: tags.unwrap_or_default(),
        created_at: created_at.flatten(),
        updated_at: updated_at.flatten(),
    })
}

/// Fixed-width RFC 3339 with milliseconds, so stored values sort as strings.
/// Sub-millisecond precision is dropped.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Split `---\n<header>\n---\n<body>` into header and body.
fn split_front_matter(text: &str) -> Result<(&str, &str), StoreError> {
    let rest = text
        .strip_prefix("---\n")
        .ok_or_else(|| StoreError::MalformedDocument("missing opening '---' delimiter".into()))?;

    // Header may be empty: the closing delimiter can follow immediately.
    if rest == DELIMITER {
        return Ok(("", ""));
    }
    if let Some(body) = rest.strip_prefix("---\n") {
        return Ok(("", body));
    }

    if let Some(pos) = rest.find("\n---\n") {
        return Ok((&rest[..pos], &rest[pos + 5..]));
    }
    if let Some(header) = rest.strip_suffix("\n---") {
        return Ok((header, ""));
    }

    Err(StoreError::MalformedDocument(
        "missing closing '---' delimiter".into(),
    ))
}

fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Value of a `key: "..."` line.
///
/// Takes everything between the first and the last quote, so legacy values
/// with unescaped inner quotes survive. Unquoted values are taken as-is.
fn unquote(value: &str) -> String {
    let value = value.trim();
    match (value.find('"'), value.rfind('"')) {
        (Some(start), Some(end)) if start == 0 && end > start => unescape(&value[start + 1..end]),
        _ => value.to_string(),
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let raw = unquote(value);
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|ts| ts.with_timezone(&Utc))
        .ok()
}

/// Parse `["a", "b"]`; bare words separated by commas are accepted too.
fn parse_tags(value: &str) -> Vec<String> {
    let inner = match value.find('[') {
        Some(open) => {
            let after = &value[open + 1..];
            after.rfind(']').map_or(after, |close| &after[..close])
        }
        None => value,
    };

    let mut tags = Vec::new();
    let mut chars = inner.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        match chars.peek() {
            None => break,
            Some(',') => {
                chars.next();
            }
            Some('"') => {
                chars.next();
                let mut tag = String::new();
                while let Some(c) = chars.next() {
                    match c {
                        '"' => break,
                        '\\' => match chars.next() {
                            Some('n') => tag.push('\n'),
                            Some('r') => tag.push('\r'),
                            Some(escaped @ ('\\' | '"')) => tag.push(escaped),
                            Some(other) => {
                                tag.push('\\');
                                tag.push(other);
                            }
                            None => tag.push('\\'),
                        },
                        other => tag.push(other),
                    }
                }
                tags.push(tag);
                // Skip anything up to the next separator.
                while chars.next_if(|c| *c != ',').is_some() {}
            }
            Some(_) => {
                let mut raw = String::new();
                while let Some(c) = chars.next_if(|c| *c != ',') {
                    raw.push(c);
                }
                let tag = raw.trim().replace('"', "");
                if !tag.is_empty() {
                    tags.push(tag);
                }
            }
        }
    }

    tags
}
