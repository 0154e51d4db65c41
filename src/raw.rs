use crate::codec::front_matter;
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::models::document::Document;
use crate::models::share_link::ShareLink;

/// Anonymous reader for raw post URLs. Sends no credentials.
#[derive(Clone)]
pub struct RawReader {
    http: reqwest::Client,
}

impl RawReader {
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { http })
    }

    /// Fetch the text at `url` with a plain GET.
    pub async fn get_raw_content(&self, url: &str) -> Result<String, StoreError> {
        tracing::debug!("GET {url} (anonymous)");
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::transport(
                Some(status.as_u16()),
                format!(
                    "Failed to fetch raw content: {}",
                    status.canonical_reason().unwrap_or("unknown error")
                ),
            ));
        }
        Ok(response.text().await?)
    }

    /// Fetch and decode the post a share link points at.
    pub async fn read_shared(&self, link: &ShareLink) -> Result<Document, StoreError> {
        let text = self.get_raw_content(&link.resource_url).await?;
        parse_post_from_raw(&text)
    }
}

/// Decode raw stored text, as served by the raw URL.
pub fn parse_post_from_raw(text: &str) -> Result<Document, StoreError> {
    front_matter::decode(text)
}
