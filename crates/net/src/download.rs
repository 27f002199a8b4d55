//! Streaming download with incremental digest verification

use crate::client::NetClient;
use futures::StreamExt;
use otaup_errors::{Error, NetworkError};
use otaup_hash::Hash;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Outcome of a completed download
#[derive(Debug, Clone)]
pub struct DownloadResult {
    pub size: u64,
}

/// Fetch a URL as text
///
/// # Errors
///
/// Returns an error on transport failure, a non-2xx status, or a body that
/// is not valid text.
pub async fn fetch_text(client: &NetClient, url: &str) -> Result<String, Error> {
    let response = client.get(url).await?;

    let status = response.status();
    if !status.is_success() {
        return Err(NetworkError::HttpError {
            status: status.as_u16(),
            message: status.to_string(),
        }
        .into());
    }

    response
        .text()
        .await
        .map_err(|e| NetworkError::DownloadFailed(e.to_string()).into())
}

/// Stream a URL to a local file, verifying an expected content hash
///
/// Any stale file at `dest` is removed first. The digest is only computed
/// when an expected hash is supplied; without one the download is accepted
/// unconditionally. A transfer of zero bytes is an error, and a digest
/// mismatch removes the file before the error is returned.
///
/// # Errors
///
/// Returns an error on transport failure, a non-2xx status, an empty
/// transfer, a digest mismatch, or file I/O failure.
pub async fn download_file(
    client: &NetClient,
    url: &str,
    dest: &Path,
    expected: Option<&Hash>,
) -> Result<DownloadResult, Error> {
    otaup_fsops::remove_file(dest).await?;

    let response = client.get(url).await?;
    let status = response.status();
    if !status.is_success() {
        return Err(NetworkError::HttpError {
            status: status.as_u16(),
            message: status.to_string(),
        }
        .into());
    }

    let mut file = File::create(dest)
        .await
        .map_err(|e| Error::io_with_path(&e, dest))?;
    let mut hasher = expected.map(|_| blake3::Hasher::new());
    let mut written: u64 = 0;

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| NetworkError::DownloadFailed(e.to_string()))?;
        if let Some(hasher) = hasher.as_mut() {
            hasher.update(&chunk);
        }
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    drop(file);

    if written == 0 {
        otaup_fsops::remove_file(dest).await?;
        return Err(NetworkError::EmptyTransfer {
            url: url.to_string(),
        }
        .into());
    }

    if let (Some(hasher), Some(expected)) = (hasher, expected) {
        let actual = Hash::from_bytes(*hasher.finalize().as_bytes());
        if actual != *expected {
            otaup_fsops::remove_file(dest).await?;
            return Err(NetworkError::ChecksumMismatch {
                expected: expected.to_hex(),
                actual: actual.to_hex(),
            }
            .into());
        }
    }

    debug!(url = %url, bytes = written, "download complete");
    Ok(DownloadResult { size: written })
}
