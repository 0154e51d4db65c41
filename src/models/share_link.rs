use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{DocumentId, LinkId};

/// Read-only reference to one document, stored as JSON under `analytics/links/`.
///
/// Field names on disk are camelCase and must stay that way for existing data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareLink {
    #[serde(rename = "id")]
    pub link_id: LinkId,
    #[serde(rename = "blogId")]
    pub document_ref: DocumentId,
    /// Anonymous raw-content URL of the target document.
    #[serde(rename = "rawUrl")]
    pub resource_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl ShareLink {
    /// Whether the link is past its expiry at `now`.
    ///
    /// Advisory: nothing in the store refuses expired links.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

/// A freshly created link together with the URL to hand out.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedLink {
    pub link: ShareLink,
    pub share_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn link(expires_at: Option<DateTime<Utc>>) -> ShareLink {
        ShareLink {
            link_id: LinkId::parse("abc123").unwrap(),
            document_ref: DocumentId::parse("hello-world-1").unwrap(),
            resource_url: "https://raw.example/o/r/main/blogs/hello-world-1.md".to_string(),
            expires_at,
            created_at: Utc::now(),
            is_active: true,
        }
    }

    #[test]
    fn test_is_expired() {
        let now = Utc::now();
        assert!(!link(None).is_expired(now));
        assert!(!link(Some(now + Duration::hours(1))).is_expired(now));
        assert!(link(Some(now - Duration::hours(1))).is_expired(now));
    }

    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_value(link(None)).unwrap();
        assert_eq!(json["id"], "abc123");
        assert_eq!(json["blogId"], "hello-world-1");
        assert!(json["rawUrl"].as_str().unwrap().ends_with(".md"));
        assert_eq!(json["isActive"], true);
        assert!(json.get("createdAt").is_some());
        assert!(json.get("expiresAt").is_none());
    }

    #[test]
    fn test_deserialize_record_written_by_web_client() {
        let json = r###"{
            "id": "k3j4h5g6f7d8s9a0",
            "blogId": "my-post-1717171717171",
            "rawUrl": "https://raw.githubusercontent.com/octocat/blivate-blog-posts/main/blogs/my-post-1717171717171.md",
            "expiresAt": "2024-07-01T12:00:00.000Z",
            "createdAt": "2024-06-01T12:00:00.000Z",
            "isActive": true
        }"###;

        let link: ShareLink = serde_json::from_str(json).unwrap();
        assert_eq!(link.document_ref.as_str(), "my-post-1717171717171");
        assert!(link.expires_at.is_some());
    }
}
