//! Archive.
//!
//! This module contains the code to unpack a Node.js distribution archive.

use std::fs::{self, File};
use std::path::{Component, Path, PathBuf};
use tracing::{instrument, trace, warn};

/// Archive type to be used on OSes other than Windows.
#[cfg(not(windows))]
pub(crate) const ARCHIVE_TYPE: &str = "tar.gz";

/// Archive type to be used on Windows.
#[cfg(windows)]
pub(crate) const ARCHIVE_TYPE: &str = "zip";

// Removes the top-level directory (`node-v<version>-<os>-<arch>`) from the given entry name.
#[doc(hidden)]
fn strip_top_level(name: &Path) -> Option<PathBuf> {
    let mut components = name.components();
    components.next()?;
    let rest = components.as_path();
    if rest.as_os_str().is_empty() {
        return None;
    }

    Some(rest.to_path_buf())
}

// Whether the given (already stripped) entry name stays within the destination directory.
#[doc(hidden)]
fn is_enclosed(name: &Path) -> bool {
    name.components().all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}

// Creates the parent directory of the given path, if missing.
#[doc(hidden)]
fn create_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.exists() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// Unpacks the given archive into `dest`, dropping the top-level directory of every entry.
#[cfg(not(windows))]
#[instrument(level = "trace")]
pub(crate) fn unpack(archive: &Path, dest: &Path) -> anyhow::Result<()> {
    use flate2::read::GzDecoder;
    use tar::Archive;

    let archive_file = File::open(archive)?;
    let mut archive = Archive::new(GzDecoder::new(archive_file));
    archive.set_preserve_permissions(true);
    for entry in archive.entries()? {
        let mut entry = entry?;

        let Ok(name) = entry.path() else {
            let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
            warn!(%name, "skipping dangerous name");
            continue;
        };
        let is_dir = entry.header().entry_type().is_dir();
        let Some(name) = strip_top_level(&name) else {
            if !is_dir {
                warn!(name = %name.display(), "skipping unusual name");
            }
            continue;
        };
        if !is_enclosed(&name) {
            warn!(name = %name.display(), "skipping dangerous name");
            continue;
        }

        let target = dest.join(name);
        trace!("unpacking {target:?}");
        if is_dir {
            fs::create_dir_all(&target)?;
        } else {
            create_parent(&target)?;
            entry.unpack(&target)?;
        }
    }

    Ok(())
}

/// Unpacks the given archive into `dest`, dropping the top-level directory of every entry.
#[cfg(windows)]
#[instrument(level = "trace")]
pub(crate) fn unpack(archive: &Path, dest: &Path) -> anyhow::Result<()> {
    let archive_file = File::open(archive)?;
    let mut zip = zip::ZipArchive::new(archive_file)?;
    for i in 0..zip.len() {
        let mut file = zip.by_index(i)?;
        let Some(name) = file.enclosed_name() else {
            warn!(name = file.name(), "skipping dangerous name");
            continue;
        };
        let Some(name) = strip_top_level(&name) else {
            if !file.is_dir() {
                warn!(name = %name.display(), "skipping unusual name");
            }
            continue;
        };
        if !is_enclosed(&name) {
            warn!(name = %name.display(), "skipping dangerous name");
            continue;
        }

        let target = dest.join(name);
        trace!("unpacking {target:?}");
        if file.is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            create_parent(&target)?;
            let mut outfile = File::create(&target)?;
            std::io::copy(&mut file, &mut outfile)?;
        }
    }

    Ok(())
}
