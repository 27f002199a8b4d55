#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Version manifest handling for otaup
//!
//! The remote manifest is an append-only, newline-delimited log of
//! `version;filename;hash` records; only the last non-blank line is
//! authoritative. A manifest that cannot be parsed resolves to the
//! "no update available" entry rather than an error.

use otaup_config::constants::{DEFAULT_VERSION, MANIFEST_SEPARATOR, VERSION_MARKER_FILE};
use otaup_errors::{Error, ManifestError};
use otaup_hash::Hash;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tokio::fs;

/// An opaque version token
///
/// Ordering is plain lexicographic string comparison, not semantic
/// versioning: `"1.10.0"` sorts before `"1.9.0"`. The boot contract depends
/// on this exact ordering, quirk included.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Version {
    fn default() -> Self {
        Self(DEFAULT_VERSION.to_string())
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Version {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

/// The authoritative record of one manifest line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub version: Version,
    pub filename: String,
    pub hash: Option<Hash>,
}

impl ManifestEntry {
    /// The entry meaning "no update available"
    #[must_use]
    pub fn no_update() -> Self {
        Self {
            version: Version::default(),
            filename: String::new(),
            hash: None,
        }
    }

    /// Strictly parse one manifest line
    ///
    /// Trailing separators are stripped; the remainder must split into
    /// exactly three fields. An empty hash field means "no verification".
    ///
    /// # Errors
    ///
    /// Returns an error if the field count is wrong or a non-empty hash
    /// field does not decode as a digest.
    pub fn parse_line(line: &str) -> Result<Self, Error> {
        let line = line.trim().trim_end_matches(MANIFEST_SEPARATOR);
        let fields: Vec<&str> = line.split(MANIFEST_SEPARATOR).collect();

        let [version, filename, hash] = fields.as_slice() else {
            return Err(ManifestError::FieldCount {
                found: fields.len(),
            }
            .into());
        };

        let hash = if hash.is_empty() {
            None
        } else {
            Some(Hash::from_hex(hash)?)
        };

        Ok(Self {
            version: Version::new(*version),
            filename: (*filename).to_string(),
            hash,
        })
    }
}

/// Resolve the authoritative entry of a manifest body
///
/// Takes the last non-blank line. Malformed manifests (wrong field count,
/// undecodable hash, empty body) resolve to [`ManifestEntry::no_update`];
/// this function never fails.
#[must_use]
pub fn latest_entry(body: &str) -> ManifestEntry {
    body.lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .and_then(|line| ManifestEntry::parse_line(line).ok())
        .unwrap_or_else(ManifestEntry::no_update)
}

/// Read the version marker of an installed tree
///
/// A missing marker (or missing tree) yields the default version token; the
/// marker content is used raw, without trimming.
///
/// # Errors
///
/// Returns an error for any failure other than the marker not existing.
pub async fn read_installed_version(tree_root: &Path) -> Result<Version, Error> {
    let marker = tree_root.join(VERSION_MARKER_FILE);
    match fs::read_to_string(&marker).await {
        Ok(content) => Ok(Version::new(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Version::default()),
        Err(e) => Err(Error::io_with_path(&e, marker)),
    }
}

/// Write a tree's version marker
///
/// # Errors
///
/// Returns an error if the marker file cannot be written.
pub async fn write_version_marker(tree_root: &Path, version: &Version) -> Result<(), Error> {
    let marker = tree_root.join(VERSION_MARKER_FILE);
    fs::write(&marker, version.as_str())
        .await
        .map_err(|e| Error::io_with_path(&e, marker))
}
