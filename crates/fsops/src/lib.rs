#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Filesystem operations for otaup
//!
//! Deletion is idempotent everywhere in the engine: removing a path that does
//! not exist is a successful no-op. All other filesystem errors propagate.

use otaup_errors::Error;
use std::path::Path;
use tokio::fs;
use tokio::sync::OnceCell;

/// Result type for filesystem operations
type Result<T> = std::result::Result<T, Error>;

/// Check if a path exists
pub async fn exists(path: &Path) -> bool {
    fs::metadata(path).await.is_ok()
}

/// Remove a file, tolerating a missing one
///
/// # Errors
///
/// Returns an error for any failure other than the file not existing.
pub async fn remove_file(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io_with_path(&e, path)),
    }
}

/// Remove a directory tree, tolerating a missing one
///
/// # Errors
///
/// Returns an error for any failure other than the tree not existing.
pub async fn remove_tree(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io_with_path(&e, path)),
    }
}

/// Create a directory with all parent directories
///
/// # Errors
///
/// Returns an error if any directory in the chain cannot be created.
pub async fn create_dir_all(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| Error::io_with_path(&e, path))
}

/// Rename a file or directory
///
/// # Errors
///
/// Returns an error if the rename operation fails.
pub async fn rename(src: &Path, dst: &Path) -> Result<()> {
    fs::rename(src, dst)
        .await
        .map_err(|e| Error::io_with_path(&e, src))
}

/// Recursively copy a directory
///
/// # Errors
///
/// Returns an error if:
/// - Creating the destination directory fails
/// - Reading the source directory fails
/// - Copying any file or subdirectory fails
pub async fn copy_directory(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst)
        .await
        .map_err(|e| Error::io_with_path(&e, dst))?;

    let mut entries = fs::read_dir(src)
        .await
        .map_err(|e| Error::io_with_path(&e, src))?;
    while let Some(entry) = entries.next_entry().await? {
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        let metadata = entry.metadata().await?;
        if metadata.is_dir() {
            Box::pin(copy_directory(&src_path, &dst_path)).await?;
        } else {
            fs::copy(&src_path, &dst_path).await?;
        }
    }

    Ok(())
}

static RENAME_PROBE: OnceCell<bool> = OnceCell::const_new();

/// Whether this filesystem performs a true directory rename
///
/// Some flash filesystems silently merge or leave an empty shell behind when
/// a directory is renamed. Probed once by renaming a throwaway directory with
/// nested content and checking the content actually moved; the result is
/// cached for the lifetime of the process.
///
/// # Errors
///
/// Returns an error if the probe directories cannot be created or cleaned up.
pub async fn directory_rename_supported(probe_root: &Path) -> Result<bool> {
    RENAME_PROBE
        .get_or_try_init(|| probe_directory_rename(probe_root))
        .await
        .copied()
}

async fn probe_directory_rename(root: &Path) -> Result<bool> {
    let src = root.join(".rename-probe");
    let dst = root.join(".rename-probe-done");

    remove_tree(&src).await?;
    remove_tree(&dst).await?;
    create_dir_all(&src.join("inner")).await?;

    let moved = match fs::rename(&src, &dst).await {
        Ok(()) => exists(&dst.join("inner")).await,
        Err(_) => false,
    };

    remove_tree(&src).await?;
    remove_tree(&dst).await?;
    Ok(moved)
}
