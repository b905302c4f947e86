//! Integration tests for the origin and mirror clients.
//!
//! Uses wiremock for HTTP mocking. Covers listing decode, status mapping,
//! the 404-as-empty folder rule, and the create/update form payloads.

use relmirror_client::{build_http_client, ClientError, MirrorClient, OriginClient};
use relmirror_core::{EntryKind, MirrorTarget, OriginTarget};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn origin_client(server: &MockServer, token: Option<&str>) -> OriginClient {
    OriginClient::new(
        build_http_client(10).expect("http client"),
        OriginTarget {
            owner: "octo".into(),
            repo: "tool".into(),
            api_url: server.uri(),
            token: token.map(str::to_string),
        },
    )
}

fn mirror_client(server: &MockServer) -> MirrorClient {
    MirrorClient::new(
        build_http_client(10).expect("http client"),
        MirrorTarget {
            owner: "mirror".into(),
            repo: "tool".into(),
            release_repo: "tool-releases".into(),
            token: "secret".into(),
            api_url: server.uri(),
            web_url: "https://mirror.test".into(),
            branch: "master".into(),
        },
    )
}

#[tokio::test]
async fn list_releases_decodes_origin_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/tool/releases"))
        .and(query_param("per_page", "100"))
        .and(header("authorization", "Bearer gh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "tag_name": "v2.0.0",
                "body": "Second",
                "assets": [
                    {"name": "app.zip", "browser_download_url": "https://dl.test/app.zip", "size": 3}
                ]
            },
            {"tag_name": "v1.0.0", "body": null, "assets": []}
        ])))
        .mount(&server)
        .await;

    let releases = origin_client(&server, Some("gh-token"))
        .list_releases()
        .await
        .expect("list releases");

    assert_eq!(releases.len(), 2);
    assert_eq!(releases[0].tag_name, "v2.0.0");
    assert_eq!(releases[0].assets[0].browser_download_url, "https://dl.test/app.zip");
    assert_eq!(releases[1].body, "");
}

#[tokio::test]
async fn list_releases_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/tool/releases"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = origin_client(&server, None)
        .list_releases()
        .await
        .expect_err("403 must fail");
    assert_eq!(err.status(), Some(403));
}

#[tokio::test]
async fn malformed_listing_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/tool/releases/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let err = origin_client(&server, None)
        .latest_release()
        .await
        .expect_err("garbage body must fail");
    assert!(matches!(err, ClientError::Decode { .. }), "got {err:?}");
}

#[tokio::test]
async fn latest_release_uses_dedicated_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/tool/releases/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tag_name": "v2.0.0",
            "body": "",
            "assets": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let latest = origin_client(&server, None)
        .latest_release()
        .await
        .expect("latest");
    assert_eq!(latest.tag_name, "v2.0.0");
}

#[tokio::test]
async fn download_returns_body_and_maps_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dl/app.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK\x03\x04".to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dl/missing.zip"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = origin_client(&server, None);
    let bytes = client
        .download(&format!("{}/dl/app.zip", server.uri()))
        .await
        .expect("download");
    assert_eq!(bytes, b"PK\x03\x04");

    let err = client
        .download(&format!("{}/dl/missing.zip", server.uri()))
        .await
        .expect_err("404 must fail");
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn list_folder_sends_token_and_decodes_entries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/mirror/tool-releases/contents/history"))
        .and(query_param("access_token", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "v1.0.0", "type": "dir", "sha": "d1", "path": "history/v1.0.0"},
            {"name": "notes.txt", "type": "file", "sha": "f1", "path": "history/notes.txt"}
        ])))
        .mount(&server)
        .await;

    let entries = mirror_client(&server)
        .list_folder("history/")
        .await
        .expect("list folder");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].kind, EntryKind::Dir);
    assert_eq!(entries[1].sha, "f1");
}

#[tokio::test]
async fn missing_target_folder_lists_as_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/mirror/tool-releases/contents/history/v9.9.9"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let entries = mirror_client(&server)
        .list_folder_or_empty("history/v9.9.9")
        .await
        .expect("404 is an empty target folder");
    assert!(entries.is_empty());
}

#[tokio::test]
async fn missing_folder_is_an_error_for_plain_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/mirror/tool-releases/contents/history"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = mirror_client(&server)
        .list_folder("history")
        .await
        .expect_err("404 on a plain listing must fail");
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn folder_listing_server_error_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/mirror/tool-releases/contents/history"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = mirror_client(&server)
        .list_folder("history")
        .await
        .expect_err("500 must fail");
    assert_eq!(err.status(), Some(500));
    assert!(
        !err.to_string().contains("secret"),
        "access token leaked into error: {err}"
    );
}

#[tokio::test]
async fn listing_a_file_path_yields_no_entries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/mirror/tool-releases/contents/history/README.md"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "README.md", "type": "file", "sha": "r1"
        })))
        .mount(&server)
        .await;

    let entries = mirror_client(&server)
        .list_folder("history/README.md")
        .await
        .expect("list");
    assert!(entries.is_empty());
}

#[tokio::test]
async fn mirror_release_list_is_decoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/mirror/tool/releases"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"tag_name": "v1.0.0", "body": null}
        ])))
        .mount(&server)
        .await;

    let releases = mirror_client(&server).list_releases().await.expect("releases");
    assert_eq!(releases[0].tag_name, "v1.0.0");
}

#[tokio::test]
async fn create_posts_base64_content_with_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/repos/mirror/tool-releases/contents/history/v1/app.txt"))
        .and(body_string_contains("access_token=secret"))
        // base64("hello") == "aGVsbG8="; '=' is form-encoded as %3D
        .and(body_string_contains("content=aGVsbG8%3D"))
        .and(body_string_contains("message=upload+file"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    mirror_client(&server)
        .create_file("history/v1/app.txt", b"hello", "upload file")
        .await
        .expect("create");
}

#[tokio::test]
async fn update_puts_previous_sha() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/repos/mirror/tool-releases/contents/latest/app.txt"))
        .and(body_string_contains("sha=abc123"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    mirror_client(&server)
        .update_file("latest/app.txt", b"hello", "abc123", "upload file")
        .await
        .expect("update");
}

#[tokio::test]
async fn write_rejected_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/repos/mirror/tool-releases/contents/history/v1/app.txt"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let err = mirror_client(&server)
        .create_file("history/v1/app.txt", b"hello", "upload file")
        .await
        .expect_err("only 200/201 count as success");
    assert_eq!(err.status(), Some(204));
}
