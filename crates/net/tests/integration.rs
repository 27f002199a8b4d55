//! Integration tests for the net crate

use httpmock::prelude::*;
use otaup_errors::{Error, NetworkError};
use otaup_hash::Hash;
use otaup_net::{download_file, fetch_text, NetClient, NetConfig};
use tempfile::tempdir;

#[tokio::test]
async fn download_writes_file_and_reports_size() {
    let server = MockServer::start();
    let content = b"test file content";
    let mock = server.mock(|when, then| {
        when.method(GET).path("/bundle.tar");
        then.status(200).body(content);
    });

    let temp = tempdir().unwrap();
    let dest = temp.path().join("bundle.tar");
    let client = NetClient::with_defaults().unwrap();

    let result = download_file(&client, &server.url("/bundle.tar"), &dest, None)
        .await
        .unwrap();

    mock.assert();
    assert_eq!(result.size, content.len() as u64);
    assert_eq!(tokio::fs::read(&dest).await.unwrap(), content);
}

#[tokio::test]
async fn download_replaces_stale_file() {
    let server = MockServer::start();
    let content = b"fresh";
    server.mock(|when, then| {
        when.method(GET).path("/bundle.tar");
        then.status(200).body(content);
    });

    let temp = tempdir().unwrap();
    let dest = temp.path().join("bundle.tar");
    tokio::fs::write(&dest, b"stale leftover from a previous attempt")
        .await
        .unwrap();

    let client = NetClient::with_defaults().unwrap();
    download_file(&client, &server.url("/bundle.tar"), &dest, None)
        .await
        .unwrap();

    assert_eq!(tokio::fs::read(&dest).await.unwrap(), content);
}

#[tokio::test]
async fn download_verifies_expected_hash() {
    let server = MockServer::start();
    let content = b"verified content";
    let expected = Hash::from_data(content);

    server.mock(|when, then| {
        when.method(GET).path("/verified.tar");
        then.status(200).body(content);
    });

    let temp = tempdir().unwrap();
    let dest = temp.path().join("verified.tar");
    let client = NetClient::with_defaults().unwrap();

    let result = download_file(&client, &server.url("/verified.tar"), &dest, Some(&expected))
        .await
        .unwrap();
    assert_eq!(result.size, content.len() as u64);
}

#[tokio::test]
async fn download_mismatch_removes_file() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/corrupt.tar");
        then.status(200).body(b"tampered content");
    });

    let temp = tempdir().unwrap();
    let dest = temp.path().join("corrupt.tar");
    let client = NetClient::with_defaults().unwrap();
    let wrong = Hash::from_data(b"what the manifest promised");

    let error = download_file(&client, &server.url("/corrupt.tar"), &dest, Some(&wrong))
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        Error::Network(NetworkError::ChecksumMismatch { .. })
    ));
    assert!(!dest.exists());
}

#[tokio::test]
async fn download_empty_body_is_an_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/empty.tar");
        then.status(200).body(b"");
    });

    let temp = tempdir().unwrap();
    let dest = temp.path().join("empty.tar");
    let client = NetClient::with_defaults().unwrap();

    let error = download_file(&client, &server.url("/empty.tar"), &dest, None)
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        Error::Network(NetworkError::EmptyTransfer { .. })
    ));
    assert!(!dest.exists());
}

#[tokio::test]
async fn download_http_error_propagates() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/missing.tar");
        then.status(404).body("Not Found");
    });

    let temp = tempdir().unwrap();
    let dest = temp.path().join("missing.tar");
    let client = NetClient::with_defaults().unwrap();

    let error = download_file(&client, &server.url("/missing.tar"), &dest, None)
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        Error::Network(NetworkError::HttpError { status: 404, .. })
    ));
}

#[tokio::test]
async fn fetch_text_returns_body() {
    let server = MockServer::start();
    let content = "1.0.0;fw_1_0_0.tar;\n";
    server.mock(|when, then| {
        when.method(GET).path("/versions");
        then.status(200).body(content);
    });

    let client = NetClient::with_defaults().unwrap();
    let text = fetch_text(&client, &server.url("/versions")).await.unwrap();
    assert_eq!(text, content);
}

#[tokio::test]
async fn fetch_text_http_error_propagates() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/versions");
        then.status(500).body("boom");
    });

    let client = NetClient::with_defaults().unwrap();
    let error = fetch_text(&client, &server.url("/versions"))
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        Error::Network(NetworkError::HttpError { status: 500, .. })
    ));
}

#[tokio::test]
async fn default_user_agent_is_sent_unless_overridden() {
    let server = MockServer::start();
    let default_ua = server.mock(|when, then| {
        when.method(GET)
            .path("/ua")
            .header("user-agent", format!("otaup/{}", env!("CARGO_PKG_VERSION")));
        then.status(200).body("ok");
    });

    let client = NetClient::with_defaults().unwrap();
    fetch_text(&client, &server.url("/ua")).await.unwrap();
    default_ua.assert();

    let custom_ua = server.mock(|when, then| {
        when.method(GET).path("/custom").header("user-agent", "boot-loop/2");
        then.status(200).body("ok");
    });

    let config = NetConfig {
        headers: [("User-Agent".to_string(), "boot-loop/2".to_string())]
            .into_iter()
            .collect(),
        ..NetConfig::default()
    };
    let client = NetClient::new(&config).unwrap();
    fetch_text(&client, &server.url("/custom")).await.unwrap();
    custom_ua.assert();
}
