//! Repository paths. These are a storage contract shared with every other
//! client of the same repository, so changing them orphans existing data.

pub const POSTS_DIR: &str = "blogs";
pub const POST_EXTENSION: &str = ".md";
pub const LINKS_DIR: &str = "analytics/links";
pub const CLICKS_DIR: &str = "analytics/clicks";
pub const JSON_EXTENSION: &str = ".json";

/// `blogs/{id}.md`
pub fn post_path(id: &str) -> String {
    format!("{POSTS_DIR}/{id}{POST_EXTENSION}")
}

/// `analytics/links/{link_id}.json`
pub fn link_path(link_id: &str) -> String {
    format!("{LINKS_DIR}/{link_id}{JSON_EXTENSION}")
}

/// `analytics/clicks/{link_id}-{millis}.json`
pub fn click_path(link_id: &str, millis: i64) -> String {
    format!("{CLICKS_DIR}/{}{JSON_EXTENSION}", click_file_stem(link_id, millis))
}

pub fn click_file_stem(link_id: &str, millis: i64) -> String {
    format!("{link_id}-{millis}")
}

/// Prefix shared by every click file of one link.
pub fn click_prefix(link_id: &str) -> String {
    format!("{link_id}-")
}
