//! Mirror registry client: folder listings and file create/update.
//!
//! The access token travels as the `access_token` query parameter on reads
//! and as a form field on writes. URLs kept in errors and logs never include it.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::StatusCode;
use tracing::debug;

use relmirror_core::{MirrorRelease, MirrorTarget, RemoteEntry};

use crate::error::ClientError;
use crate::http::{decode_json, endpoint, network_err};

/// Client for the mirror's contents and release APIs.
#[derive(Debug, Clone)]
pub struct MirrorClient {
    http: reqwest::Client,
    target: MirrorTarget,
}

impl MirrorClient {
    pub fn new(http: reqwest::Client, target: MirrorTarget) -> Self {
        Self { http, target }
    }

    pub fn target(&self) -> &MirrorTarget {
        &self.target
    }

    /// List one folder of the release repository.
    ///
    /// Any non-success status is an error, 404 included. A path that names a
    /// single file lists as empty.
    pub async fn list_folder(&self, path: &str) -> Result<Vec<RemoteEntry>, ClientError> {
        self.fetch_listing(path, false).await
    }

    /// Like [`Self::list_folder`], but a folder that does not exist yet (404)
    /// lists as empty. For upload target folders only.
    pub async fn list_folder_or_empty(
        &self,
        path: &str,
    ) -> Result<Vec<RemoteEntry>, ClientError> {
        self.fetch_listing(path, true).await
    }

    async fn fetch_listing(
        &self,
        path: &str,
        absent_is_empty: bool,
    ) -> Result<Vec<RemoteEntry>, ClientError> {
        let url = self.contents_url(path)?;
        let shown = url.to_string();
        debug!(url = %shown, "listing mirror folder");

        let response = self
            .http
            .get(self.with_token(url))
            .send()
            .await
            .map_err(|e| network_err(&shown, e))?;

        let status = response.status();
        if absent_is_empty && status == StatusCode::NOT_FOUND {
            debug!(path, "mirror folder absent");
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(ClientError::Status {
                url: shown,
                status: status.as_u16(),
            });
        }

        let body: serde_json::Value = decode_json(&shown, response).await?;
        if !body.is_array() {
            return Ok(Vec::new());
        }
        serde_json::from_value(body).map_err(|e| ClientError::Decode {
            url: shown,
            message: e.to_string(),
        })
    }

    /// `GET /repos/{owner}/{repo}/releases` on the mirror.
    pub async fn list_releases(&self) -> Result<Vec<MirrorRelease>, ClientError> {
        let url = endpoint(
            &self.target.api_url,
            &[
                "repos",
                self.target.owner.as_str(),
                self.target.repo.as_str(),
                "releases",
            ],
        )?;
        let shown = url.to_string();
        debug!(url = %shown, "listing mirror releases");

        let response = self
            .http
            .get(self.with_token(url))
            .send()
            .await
            .map_err(|e| network_err(&shown, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                url: shown,
                status: status.as_u16(),
            });
        }
        decode_json(&shown, response).await
    }

    /// Create a file that does not exist on the mirror yet.
    pub async fn create_file(
        &self,
        path: &str,
        content: &[u8],
        message: &str,
    ) -> Result<(), ClientError> {
        let url = self.contents_url(path)?;
        let encoded = BASE64.encode(content);
        let form = [
            ("access_token", self.target.token.as_str()),
            ("content", encoded.as_str()),
            ("message", message),
        ];
        let request = self.http.post(url.clone()).form(&form);
        self.submit(url, request).await
    }

    /// Replace an existing file; `sha` is the hash read from the folder listing.
    pub async fn update_file(
        &self,
        path: &str,
        content: &[u8],
        sha: &str,
        message: &str,
    ) -> Result<(), ClientError> {
        let url = self.contents_url(path)?;
        let encoded = BASE64.encode(content);
        let form = [
            ("access_token", self.target.token.as_str()),
            ("content", encoded.as_str()),
            ("sha", sha),
            ("message", message),
        ];
        let request = self.http.put(url.clone()).form(&form);
        self.submit(url, request).await
    }

    async fn submit(
        &self,
        url: url::Url,
        request: reqwest::RequestBuilder,
    ) -> Result<(), ClientError> {
        let shown = url.to_string();
        let response = request.send().await.map_err(|e| network_err(&shown, e))?;
        match response.status().as_u16() {
            200 | 201 => Ok(()),
            status => Err(ClientError::Status { url: shown, status }),
        }
    }

    fn contents_url(&self, path: &str) -> Result<url::Url, ClientError> {
        endpoint(
            &self.target.api_url,
            &[
                "repos",
                self.target.owner.as_str(),
                self.target.release_repo.as_str(),
                "contents",
                path,
            ],
        )
    }

    fn with_token(&self, mut url: url::Url) -> url::Url {
        url.query_pairs_mut()
            .append_pair("access_token", &self.target.token);
        url
    }
}
