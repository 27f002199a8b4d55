//! Selective bundle unpacking
//!
//! Walks the tar entries in archive order. Entries under the live-dir prefix
//! are redirected into the staging tree; entries outside it install directly
//! in place (shared files such as network credentials live outside the
//! versioned tree). Files that would land on top of an existing, identical
//! file are skipped entirely to avoid rewriting unchanged flash content.

use otaup_config::constants::STAGED_FILE_SUFFIX;
use otaup_errors::{Error, Result, UpdateError};
use otaup_hash::{Hash, CHUNK_SIZE};
use std::io::{Read, Write};
use std::path::{Component, Path, PathBuf};
use tar::Archive;
use tracing::debug;

/// Unpack a downloaded bundle
///
/// Archive iteration is blocking IO, so the walk runs on a blocking thread.
///
/// # Errors
///
/// Returns an error if the bundle cannot be opened or read as a tar archive,
/// if an entry path is not installable, or if any filesystem operation
/// fails.
pub(crate) async fn unpack_bundle(
    bundle: &Path,
    root: &Path,
    live_dir: &str,
    staging_dir: &str,
) -> Result<()> {
    let bundle = bundle.to_path_buf();
    let root = root.to_path_buf();
    let live_dir = live_dir.to_string();
    let staging_dir = staging_dir.to_string();

    tokio::task::spawn_blocking(move || unpack_blocking(&bundle, &root, &live_dir, &staging_dir))
        .await
        .map_err(|e| Error::internal(format!("unpack task failed: {e}")))?
}

fn unpack_blocking(bundle: &Path, root: &Path, live_dir: &str, staging_dir: &str) -> Result<()> {
    let file = std::fs::File::open(bundle).map_err(|e| Error::io_with_path(&e, bundle))?;
    let mut archive = Archive::new(file);

    for entry in archive
        .entries()
        .map_err(|e| extraction_failed(&e))?
    {
        let mut entry = entry.map_err(|e| extraction_failed(&e))?;
        let raw_path = entry.path().map_err(|e| extraction_failed(&e))?.into_owned();

        if raw_path
            .components()
            .any(|c| c == Component::ParentDir)
        {
            return Err(UpdateError::InvalidEntryPath {
                path: raw_path.display().to_string(),
            }
            .into());
        }
        let Some(rel) = raw_path.to_str() else {
            return Err(UpdateError::InvalidEntryPath {
                path: raw_path.display().to_string(),
            }
            .into());
        };

        let mapped = map_install_path(rel, live_dir, staging_dir);
        let resolved = root.join(&mapped);
        let entry_type = entry.header().entry_type();

        if entry_type.is_dir() {
            std::fs::create_dir_all(&resolved)
                .map_err(|e| Error::io_with_path(&e, &resolved))?;
            continue;
        }
        if !entry_type.is_file() {
            debug!(path = %mapped, "skipping special archive entry");
            continue;
        }

        install_file_entry(&mut entry, &mapped, &resolved, staging_dir)?;
    }

    Ok(())
}

/// Redirect paths under the live-dir prefix into the staging tree
fn map_install_path(rel: &str, live_dir: &str, staging_dir: &str) -> String {
    if rel == live_dir {
        staging_dir.to_string()
    } else if let Some(rest) = rel.strip_prefix(&format!("{live_dir}/")) {
        format!("{staging_dir}/{rest}")
    } else {
        rel.to_string()
    }
}

fn install_file_entry<R: Read>(
    reader: &mut R,
    mapped: &str,
    resolved: &Path,
    staging_dir: &str,
) -> Result<()> {
    // A diff baseline exists only for files outside the staging tree.
    // Containment is a substring test on the mapped path, exactly as the
    // device has always decided it; a path that merely embeds the staging
    // name elsewhere is (mis)classified the same way.
    let baseline = if !mapped.contains(staging_dir) && resolved.exists() {
        Some(Hash::hash_file_blocking(resolved)?)
    } else {
        None
    };

    let target = if baseline.is_some() {
        staged_sibling(resolved)
    } else {
        resolved.to_path_buf()
    };

    let written = write_chunked(reader, &target, baseline.is_some())?;

    match (baseline, written) {
        (Some(original), Some(new)) if new == original => {
            debug!(path = %mapped, "content unchanged, keeping existing file");
            std::fs::remove_file(&target).map_err(|e| Error::io_with_path(&e, &target))?;
        }
        (Some(_), _) => {
            remove_if_exists(resolved)?;
            std::fs::rename(&target, resolved)
                .map_err(|e| Error::io_with_path(&e, resolved))?;
            debug!(path = %mapped, "installed in place");
        }
        _ => debug!(path = %mapped, "unpacked"),
    }

    Ok(())
}

/// Stream an entry to disk in fixed-size chunks, hashing while writing
fn write_chunked<R: Read>(reader: &mut R, dest: &Path, hash: bool) -> Result<Option<Hash>> {
    let mut out = std::fs::File::create(dest).map_err(|e| Error::io_with_path(&e, dest))?;
    let mut hasher = hash.then(blake3::Hasher::new);
    let mut buffer = [0u8; CHUNK_SIZE];

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        if let Some(hasher) = hasher.as_mut() {
            hasher.update(&buffer[..n]);
        }
        out.write_all(&buffer[..n])
            .map_err(|e| Error::io_with_path(&e, dest))?;
    }
    out.flush().map_err(|e| Error::io_with_path(&e, dest))?;

    Ok(hasher.map(|h| Hash::from_bytes(*h.finalize().as_bytes())))
}

fn staged_sibling(path: &Path) -> PathBuf {
    let mut os = path.to_path_buf().into_os_string();
    os.push(STAGED_FILE_SUFFIX);
    PathBuf::from(os)
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io_with_path(&e, path)),
    }
}

fn extraction_failed(e: &std::io::Error) -> Error {
    UpdateError::ExtractionFailed {
        message: e.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_redirects_live_prefix_only() {
        assert_eq!(map_install_path("app/main.py", "app", "next"), "next/main.py");
        assert_eq!(map_install_path("app", "app", "next"), "next");
        assert_eq!(map_install_path("wifi.cfg", "app", "next"), "wifi.cfg");
        // Only a whole leading segment counts as the prefix
        assert_eq!(map_install_path("apples/a.py", "app", "next"), "apples/a.py");
    }

    #[test]
    fn staged_sibling_appends_suffix() {
        assert_eq!(
            staged_sibling(Path::new("/sd/wifi.cfg")),
            PathBuf::from("/sd/wifi.cfg.ota")
        );
    }
}
