use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::codec::transport::{decode_content, encode_content};
use crate::config::{Session, StoreConfig};
use crate::error::StoreError;
use crate::storage::client::{ContentClient, DirEntry, NewRepository, RemoteFile, RepositoryInfo};

const API_ACCEPT: &str = "application/vnd.github.v3+json";

/// GitHub contents-API implementation of [`ContentClient`].
pub struct GitHubClient {
    http: reqwest::Client,
    api_base: Url,
    owner: String,
    repository: String,
    branch: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentsFile {
    path: String,
    sha: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Serialize)]
struct PutContents<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
    branch: &'a str,
}

#[derive(Debug, Serialize)]
struct DeleteContents<'a> {
    message: &'a str,
    sha: &'a str,
    branch: &'a str,
}

#[derive(Debug, Deserialize)]
struct WriteResult {
    content: WrittenFile,
}

#[derive(Debug, Deserialize)]
struct WrittenFile {
    sha: String,
}

impl GitHubClient {
    /// Create a client acting for `session` on the repository named in `config`.
    pub fn new(config: &StoreConfig, session: Session) -> Result<Self, StoreError> {
        let api_base = Url::parse(&config.api_base_url)
            .map_err(|e| StoreError::Config(format!("invalid api_base_url: {e}")))?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", session.token))
            .map_err(|_| StoreError::Config("token contains invalid header characters".into()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static(API_ACCEPT));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            http,
            api_base,
            owner: session.owner,
            repository: config.repository.clone(),
            branch: config.branch.clone(),
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Config(format!("'{}' cannot be a base URL", self.api_base)))?
            .pop_if_empty()
            .extend(segments.iter().flat_map(|s| s.split('/')).filter(|s| !s.is_empty()));
        Ok(url)
    }

    fn contents_url(&self, path: &str) -> Result<Url, StoreError> {
        self.url(&["repos", &self.owner, &self.repository, "contents", path])
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        tracing::debug!("{} {}", method, url);
        self.http.request(method, url)
    }

    /// Turn a non-success response into a `StoreError`.
    async fn error_from(response: Response, path: &str) -> StoreError {
        let status = response.status();
        let message = response
            .json::<ApiErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());

        match status {
            StatusCode::CONFLICT => StoreError::ConcurrentModification {
                path: path.to_string(),
            },
            // Raised when writing over an existing file without its sha.
            StatusCode::UNPROCESSABLE_ENTITY if message.contains("sha") => {
                StoreError::ConcurrentModification {
                    path: path.to_string(),
                }
            }
            _ => StoreError::transport(Some(status.as_u16()), format!("GitHub API error: {message}")),
        }
    }
}

#[async_trait]
impl ContentClient for GitHubClient {
    async fn get_repository(&self) -> Result<Option<RepositoryInfo>, StoreError> {
        let url = self.url(&["repos", &self.owner, &self.repository])?;
        let response = self.request(Method::GET, url).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => Ok(Some(response.json().await?)),
            _ => Err(Self::error_from(response, &self.repository).await),
        }
    }

    async fn create_repository(&self, request: &NewRepository) -> Result<RepositoryInfo, StoreError> {
        let url = self.url(&["user", "repos"])?;
        let response = self.request(Method::POST, url).json(request).send().await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, &request.name).await);
        }
        Ok(response.json().await?)
    }

    async fn get_file(&self, path: &str) -> Result<Option<RemoteFile>, StoreError> {
        let mut url = self.contents_url(path)?;
        url.query_pairs_mut().append_pair("ref", &self.branch);
        let response = self.request(Method::GET, url).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => return Ok(None),
            s if !s.is_success() => return Err(Self::error_from(response, path).await),
            _ => {}
        }

        let file: ContentsFile = response.json().await?;
        if file.encoding.as_deref().is_some_and(|e| e != "base64") {
            return Err(StoreError::Serialization(format!(
                "'{}' is not served inline (encoding {:?})",
                file.path, file.encoding
            )));
        }

        Ok(Some(RemoteFile {
            content: decode_content(&file.content)?,
            path: file.path,
            revision: file.sha,
        }))
    }

    async fn put_file(
        &self,
        path: &str,
        content: Vec<u8>,
        message: &str,
        revision: Option<String>,
    ) -> Result<String, StoreError> {
        let url = self.contents_url(path)?;
        let body = PutContents {
            message,
            content: encode_content(&content),
            sha: revision,
            branch: &self.branch,
        };
        let response = self.request(Method::PUT, url).json(&body).send().await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, path).await);
        }
        let written: WriteResult = response.json().await?;
        Ok(written.content.sha)
    }

    async fn delete_file(&self, path: &str, revision: &str, message: &str) -> Result<(), StoreError> {
        let url = self.contents_url(path)?;
        let body = DeleteContents {
            message,
            sha: revision,
            branch: &self.branch,
        };
        let response = self.request(Method::DELETE, url).json(&body).send().await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, path).await);
        }
        Ok(())
    }

    async fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>, StoreError> {
        let mut url = self.contents_url(path)?;
        url.query_pairs_mut().append_pair("ref", &self.branch);
        let response = self.request(Method::GET, url).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => return Ok(Vec::new()),
            s if !s.is_success() => return Err(Self::error_from(response, path).await),
            _ => {}
        }

        // A file path answers with an object instead of an array.
        let value: serde_json::Value = response.json().await?;
        if !value.is_array() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(api: &str) -> GitHubClient {
        let config = StoreConfig::default().with_base_urls(api, api);
        GitHubClient::new(&config, Session::new("octocat", "t0ken")).unwrap()
    }

    #[test]
    fn test_contents_url() {
        let client = client("https://api.github.com");
        let url = client.contents_url("blogs/hello-1.md").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/octocat/blivate-blog-posts/contents/blogs/hello-1.md"
        );
    }

    #[test]
    fn test_url_keeps_base_path() {
        let client = client("http://127.0.0.1:9999/api/v3/");
        let url = client.url(&["user", "repos"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9999/api/v3/user/repos");
    }

    #[test]
    fn test_invalid_token_is_config_error() {
        let result = GitHubClient::new(&StoreConfig::default(), Session::new("o", "bad\ntoken"));
        assert!(matches!(result, Err(StoreError::Config(_))));
    }
}
