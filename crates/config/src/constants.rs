//! Fixed, non-configurable names used across the update engine
//!
//! These are deliberately not exposed via TOML configuration: the bundle and
//! marker names are part of the on-device layout contract, and the boot loop
//! relies on them staying stable across releases.

/// Name of the directory holding the currently runnable version.
pub const DEFAULT_LIVE_DIR: &str = "app";

/// Name of the directory a candidate version is assembled in.
pub const DEFAULT_STAGING_DIR: &str = "next";

/// Local filename the downloaded bundle is written to.
pub const BUNDLE_FILE_NAME: &str = "firmware.tar";

/// Marker file at the root of a tree holding its raw version string.
pub const VERSION_MARKER_FILE: &str = ".version";

/// Version token reported when no marker file exists yet.
pub const DEFAULT_VERSION: &str = "0.0.0";

/// Suffix appended to a file written next to an existing one during unpack.
pub const STAGED_FILE_SUFFIX: &str = ".ota";

/// Manifest field separator.
pub const MANIFEST_SEPARATOR: char = ';';
