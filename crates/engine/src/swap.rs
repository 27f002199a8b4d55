//! Installing the staging tree as the live tree
//!
//! The old live tree is deleted, then the staging tree is renamed onto its
//! path. Filesystems that cannot rename a directory atomically fall back to
//! a recursive copy followed by staging deletion. The delete-to-install
//! window is the one accepted point of vulnerability to power loss.

use otaup_errors::Result;
use std::path::Path;
use tracing::{debug, info};

/// Replace the live tree with the staging tree
///
/// # Errors
///
/// Returns an error if deleting the old tree, the rename, or the fallback
/// copy fails.
pub(crate) async fn swap_live(root: &Path, live: &Path, staging: &Path) -> Result<()> {
    info!(path = %live.display(), "removing old version");
    otaup_fsops::remove_tree(live).await?;

    if otaup_fsops::directory_rename_supported(root).await? {
        debug!("installing staging tree by rename");
        otaup_fsops::rename(staging, live).await
    } else {
        debug!("directory rename unsupported, installing by copy");
        copy_swap(staging, live).await
    }
}

/// Emulated swap for filesystems without true directory rename
pub(crate) async fn copy_swap(staging: &Path, live: &Path) -> Result<()> {
    otaup_fsops::copy_directory(staging, live).await?;
    otaup_fsops::remove_tree(staging).await
}
