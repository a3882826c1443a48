// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! GitHub contents-API backend.
//!
//! Persists each collection document as one file in a repository, using the
//! contents endpoint's `sha` precondition for optimistic concurrency: a `PUT`
//! carrying a stale blob SHA is rejected by GitHub, which this client surfaces
//! as [`RemoteError::Conflict`]. Content moves base64-encoded, as the API
//! requires.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::{ContentClient, RemoteError, RemoteFile, VersionToken};

const DEFAULT_API_BASE: &str = "https://api.github.com";

pub struct GithubContentClient {
    client: Client,
    api_base: String,
    owner: String,
    repo: String,
    token: Option<String>,
}

/// Contents-API file response (GET).
#[derive(Debug, Deserialize)]
struct ContentResponse {
    content: Option<String>,
    sha: String,
}

/// Contents-API write request (PUT).
#[derive(Debug, Serialize)]
struct PutRequest {
    message: String,
    content: String,
    branch: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
}

/// Contents-API write response (PUT).
#[derive(Debug, Deserialize)]
struct PutResponse {
    content: PutContent,
}

#[derive(Debug, Deserialize)]
struct PutContent {
    sha: String,
}

impl GithubContentClient {
    #[must_use]
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            owner: owner.into(),
            repo: repo.into(),
            token,
        }
    }

    /// Override the API base URL (for proxies and test servers).
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base, self.owner, self.repo, path
        )
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = builder
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "doc-store");
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(error: reqwest::Error) -> Self {
        RemoteError::Backend(error.to_string())
    }
}

#[async_trait]
impl ContentClient for GithubContentClient {
    async fn get_file(&self, path: &str, reference: &str) -> Result<RemoteFile, RemoteError> {
        let url = self.contents_url(path);
        let response = self
            .request(self.client.get(&url).query(&[("ref", reference)]))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let body: ContentResponse = response.json().await?;
                // The API returns base64 with embedded newlines
                let encoded: String = body
                    .content
                    .unwrap_or_default()
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect();
                let content = BASE64
                    .decode(encoded)
                    .map_err(|e| RemoteError::Backend(format!("invalid base64 content: {e}")))?;
                debug!(path, bytes = content.len(), "fetched file");
                Ok(RemoteFile {
                    content,
                    version: VersionToken::new(body.sha),
                })
            }
            StatusCode::NOT_FOUND => Err(RemoteError::NotFound),
            status => Err(RemoteError::Backend(format!(
                "GET {path} returned {status}"
            ))),
        }
    }

    async fn put_file(
        &self,
        path: &str,
        content: &[u8],
        branch: &str,
        expected: Option<&VersionToken>,
    ) -> Result<VersionToken, RemoteError> {
        let url = self.contents_url(path);
        let request = PutRequest {
            message: format!("Update {path}"),
            content: BASE64.encode(content),
            branch: branch.to_string(),
            sha: expected.map(|v| v.as_str().to_string()),
        };

        let response = self
            .request(self.client.put(&url).json(&request))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => {
                let body: PutResponse = response.json().await?;
                debug!(path, sha = %body.content.sha, "wrote file");
                Ok(VersionToken::new(body.content.sha))
            }
            // 409 is a branch-level conflict; 422 is the stale/missing-sha case
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                Err(RemoteError::Conflict {
                    expected: expected.map(ToString::to_string).unwrap_or_default(),
                })
            }
            status => Err(RemoteError::Backend(format!(
                "PUT {path} returned {status}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contents_url() {
        let client = GithubContentClient::new("acme", "site-content", None);
        assert_eq!(
            client.contents_url("data/pages.json"),
            "https://api.github.com/repos/acme/site-content/contents/data/pages.json"
        );
    }

    #[test]
    fn test_api_base_override() {
        let client = GithubContentClient::new("acme", "site-content", None)
            .with_api_base("http://127.0.0.1:9999");
        assert!(client
            .contents_url("data/pages.json")
            .starts_with("http://127.0.0.1:9999/repos/"));
    }

    #[test]
    fn test_put_request_omits_missing_sha() {
        let request = PutRequest {
            message: "Update data/pages.json".into(),
            content: BASE64.encode(b"[]"),
            branch: "main".into(),
            sha: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("sha"));
    }
}
