use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::LinkId;

/// One resolution of a share link. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickEvent {
    pub link_id: LinkId,
    pub timestamp: DateTime<Utc>,
    /// Source address of the visitor.
    #[serde(rename = "ip")]
    pub address: String,
    /// Client signature (the `User-Agent` header).
    #[serde(rename = "userAgent")]
    pub client_signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl ClickEvent {
    pub fn new(
        link_id: LinkId,
        address: impl Into<String>,
        client_signature: impl Into<String>,
    ) -> Self {
        Self {
            link_id,
            timestamp: Utc::now(),
            address: address.into(),
            client_signature: client_signature.into(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}
