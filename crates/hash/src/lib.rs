#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! BLAKE3 content hashing for otaup
//!
//! This crate provides the content hash used for download integrity
//! verification and for the diff-skip comparison during unpacking.

use blake3::Hasher;
use otaup_errors::{Error, ManifestError};
use std::fmt;
use std::io::Read;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// Size of chunks for streaming hash computation.
///
/// Small on purpose: the target devices have a very small memory budget, and
/// every hashing and copy loop in the engine moves data in chunks of this
/// size.
pub const CHUNK_SIZE: usize = 512;

/// A BLAKE3 hash value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hash {
    bytes: [u8; 32],
}

impl Hash {
    /// Create a hash from raw bytes
    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Get the raw bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Convert to lowercase hex
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Parse from a hex string; either case is accepted
    ///
    /// # Errors
    /// Returns an error if the input is not valid hexadecimal or does not
    /// decode to exactly 32 bytes.
    pub fn from_hex(s: &str) -> Result<Self, Error> {
        let bytes = hex::decode(s).map_err(|_| ManifestError::InvalidHash {
            value: s.to_string(),
        })?;

        if bytes.len() != 32 {
            return Err(ManifestError::InvalidHash {
                value: s.to_string(),
            }
            .into());
        }

        let mut array = [0u8; 32];
        array.copy_from_slice(&bytes);
        Ok(Self::from_bytes(array))
    }

    /// Compute hash of a byte slice
    #[must_use]
    pub fn from_data(data: &[u8]) -> Self {
        let hash = blake3::hash(data);
        Self::from_bytes(*hash.as_bytes())
    }

    /// Compute hash of a file
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or read.
    pub async fn hash_file(path: &Path) -> Result<Self, Error> {
        let mut file = File::open(path)
            .await
            .map_err(|e| Error::io_with_path(&e, path))?;

        let mut hasher = Hasher::new();
        let mut buffer = vec![0; CHUNK_SIZE];

        loop {
            let n = file.read(&mut buffer).await?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }

        Ok(Self::from_bytes(*hasher.finalize().as_bytes()))
    }

    /// Compute hash of a file from blocking code
    ///
    /// The archive walk runs on a blocking thread; this is the synchronous
    /// counterpart of [`Hash::hash_file`].
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or read.
    pub fn hash_file_blocking(path: &Path) -> Result<Self, Error> {
        let mut file =
            std::fs::File::open(path).map_err(|e| Error::io_with_path(&e, path))?;

        let mut hasher = Hasher::new();
        let mut buffer = [0u8; CHUNK_SIZE];

        loop {
            let n = file.read(&mut buffer)?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }

        Ok(Self::from_bytes(*hasher.finalize().as_bytes()))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
