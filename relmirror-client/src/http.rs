//! Shared HTTP plumbing: client construction, URL assembly, JSON decoding.
//!
//! Status interpretation stays in the per-registry modules; this layer only
//! turns transport failures and undecodable bodies into [`ClientError`].

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::ClientError;

/// User agent sent with every registry request.
pub const USER_AGENT_VALUE: &str = concat!("relmirror/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client shared by the origin and mirror clients.
pub fn build_http_client(timeout_secs: u64) -> Result<reqwest::Client, ClientError> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .default_headers(default_headers)
        .build()
        .map_err(ClientError::Build)
}

/// Append `segments` to `base`, percent-encoding each one.
///
/// Every segment is split on `/` and empty pieces are dropped, so callers may
/// pass repository paths such as `历史版本/v1.0.0/` unchanged.
pub(crate) fn endpoint(base: &str, segments: &[&str]) -> Result<Url, ClientError> {
    let mut url = Url::parse(base).map_err(|e| ClientError::InvalidUrl {
        url: base.to_string(),
        reason: e.to_string(),
    })?;
    {
        let mut path = url.path_segments_mut().map_err(|()| ClientError::InvalidUrl {
            url: base.to_string(),
            reason: "base url cannot carry a path".to_string(),
        })?;
        path.pop_if_empty();
        for segment in segments {
            path.extend(segment.split('/').filter(|piece| !piece.is_empty()));
        }
    }
    Ok(url)
}

pub(crate) fn network_err(url: &str, source: reqwest::Error) -> ClientError {
    ClientError::Network {
        url: url.to_string(),
        source,
    }
}

/// Read the body and decode it as JSON.
pub(crate) async fn decode_json<T: DeserializeOwned>(
    url: &str,
    response: reqwest::Response,
) -> Result<T, ClientError> {
    let raw = response.bytes().await.map_err(|e| network_err(url, e))?;
    serde_json::from_slice(&raw).map_err(|e| ClientError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_encodes_each_segment() {
        let url = endpoint(
            "https://gitee.com/api/v5",
            &["repos", "me", "rel", "contents", "历史版本/v1 beta/"],
        )
        .expect("url");
        assert_eq!(
            url.as_str(),
            "https://gitee.com/api/v5/repos/me/rel/contents/%E5%8E%86%E5%8F%B2%E7%89%88%E6%9C%AC/v1%20beta"
        );
    }

    #[test]
    fn endpoint_tolerates_trailing_slash_on_base() {
        let url = endpoint("http://127.0.0.1:9000/", &["repos", "o", "r", "releases"]).expect("url");
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/repos/o/r/releases");
    }

    #[test]
    fn endpoint_rejects_garbage_base() {
        assert!(matches!(
            endpoint("not a url", &["x"]),
            Err(ClientError::InvalidUrl { .. })
        ));
    }
}
