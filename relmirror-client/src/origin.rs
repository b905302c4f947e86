//! Origin registry client: release listings and asset downloads.

use reqwest::header::AUTHORIZATION;
use tracing::debug;

use relmirror_core::{OriginTarget, Release};

use crate::error::ClientError;
use crate::http::{decode_json, endpoint, network_err};

/// Releases requested per listing call.
const RELEASES_PER_PAGE: &str = "100";

/// Read-only client for the origin's release API.
#[derive(Debug, Clone)]
pub struct OriginClient {
    http: reqwest::Client,
    target: OriginTarget,
}

impl OriginClient {
    pub fn new(http: reqwest::Client, target: OriginTarget) -> Self {
        Self { http, target }
    }

    /// `GET /repos/{owner}/{repo}/releases`, newest first as the origin orders them.
    pub async fn list_releases(&self) -> Result<Vec<Release>, ClientError> {
        let mut url = self.releases_url(&[])?;
        url.query_pairs_mut().append_pair("per_page", RELEASES_PER_PAGE);
        debug!(url = %url, "listing origin releases");
        self.get_json(url.as_str()).await
    }

    /// `GET /repos/{owner}/{repo}/releases/latest`.
    ///
    /// "Latest" is decided by the origin, not derived from [`Self::list_releases`].
    pub async fn latest_release(&self) -> Result<Release, ClientError> {
        let url = self.releases_url(&["latest"])?;
        debug!(url = %url, "fetching origin latest release");
        self.get_json(url.as_str()).await
    }

    /// Download an asset in a single attempt and return the whole payload.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>, ClientError> {
        let response = self
            .authorized(self.http.get(url))
            .send()
            .await
            .map_err(|e| network_err(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| network_err(url, e))?;
        Ok(body.to_vec())
    }

    fn releases_url(&self, tail: &[&str]) -> Result<url::Url, ClientError> {
        let mut segments: Vec<&str> = vec![
            "repos",
            self.target.owner.as_str(),
            self.target.repo.as_str(),
            "releases",
        ];
        segments.extend_from_slice(tail);
        endpoint(&self.target.api_url, &segments)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.target.token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {token}")),
            None => request,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, ClientError> {
        let response = self
            .authorized(self.http.get(url))
            .send()
            .await
            .map_err(|e| network_err(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        decode_json(url, response).await
    }
}
