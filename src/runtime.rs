//! Runtime.
//!
//! This module contains the code to download and unpack the bundled Node.js runtime.

use crate::archive::{self, ARCHIVE_TYPE};
use crate::component::Installable;
use crate::config::NodeConfig;
use crate::layout::Layout;
use crate::platform::PlatformInfo;
use anyhow::{Context, anyhow, bail};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, instrument, trace, warn};

/// The bundled Node.js runtime.
#[derive(Debug)]
pub(crate) struct NodeRuntime {
    dist_url: String,
    layout: Layout,
    platform: PlatformInfo,
    version: semver::Version,
}

impl NodeRuntime {
    /// Creates a new `NodeRuntime`.
    pub(crate) fn new(config: &NodeConfig, layout: &Layout, platform: PlatformInfo) -> Self {
        Self {
            dist_url: config.dist_url.trim_end_matches('/').to_string(),
            layout: layout.clone(),
            platform,
            version: config.version.clone(),
        }
    }

    /// Returns the file name of the distribution archive for this platform.
    pub(crate) fn archive_name(&self) -> anyhow::Result<String> {
        let Some(suffix) = self.platform.dist_suffix() else {
            bail!("no Node.js distribution for platform {}", self.platform);
        };

        Ok(format!("node-v{}-{suffix}.{ARCHIVE_TYPE}", self.version))
    }

    /// Returns the download URL of the distribution archive.
    pub(crate) fn archive_url(&self) -> anyhow::Result<String> {
        let archive_name = self.archive_name()?;
        Ok(format!("{}/v{}/{archive_name}", self.dist_url, self.version))
    }

    /// Returns the version reported by the installed node executable.
    #[instrument(level = "trace", skip(self))]
    pub(crate) fn installed_version(&self) -> anyhow::Result<semver::Version> {
        let output = Command::new(self.layout.node_bin()) //
            .arg("--version")
            .stdin(Stdio::null()) // disconnect from self
            .output()?;
        if !output.status.success() {
            bail!("node --version returned {}", output.status);
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let version = stdout.trim().trim_start_matches('v');

        Ok(semver::Version::parse(version)?)
    }

    // Returns the cached archive, downloading it unless offline.
    #[instrument(level = "trace", skip(self))]
    fn fetch(&self, offline: bool) -> anyhow::Result<PathBuf> {
        let cache_dir = self.layout.cache_dir();
        let dest = cache_dir.join(self.archive_name()?);

        // check if already downloaded
        if dest.is_file() {
            debug!(archive = %dest.display(), "using cached archive");
            return Ok(dest);
        }
        if offline {
            bail!("offline mode and no cached archive at {}", dest.display());
        }

        // make request
        let url = self.archive_url()?;
        debug!(url, "downloading");
        let client = reqwest::blocking::Client::new();
        let mut response = client
            .get(&url) //
            .header(reqwest::header::ACCEPT, "application/octet-stream") //
            .send()?
            .error_for_status()?;

        // download to a partial file first
        fs::create_dir_all(&cache_dir)?;
        let mut part = dest.clone();
        part.set_extension("part");
        let mut part_file = File::create(&part)?;
        let bytes_written = response.copy_to(&mut part_file)?;
        trace!(bytes_written);
        part_file.sync_all()?;
        drop(part_file);
        fs::rename(&part, &dest)?;

        Ok(dest)
    }

    // Unpacks the archive into a temporary directory and verifies the runtime in there.
    #[instrument(level = "trace", skip(self))]
    fn unpack(&self, archive: &Path) -> anyhow::Result<PathBuf> {
        let tmp = self.layout.cache_dir().join(format!("node-v{}.tmp", self.version));

        // remove left-overs from last run, if there are any
        if tmp.exists() {
            fs::remove_dir_all(&tmp)?;
        }

        archive::unpack(archive, &tmp)?;

        let node_bin = self.layout.node_bin();
        let node_bin = node_bin.strip_prefix(self.layout.node_dir())?;
        if !tmp.join(node_bin).is_file() {
            return Err(anyhow!("failed to verify runtime, {} missing", node_bin.display()));
        }

        Ok(tmp)
    }

    // Replaces the current runtime directory with the unpacked one.
    #[instrument(level = "trace", skip(self))]
    fn replace(&self, unpacked: &Path) -> anyhow::Result<()> {
        let node_dir = self.layout.node_dir();
        if node_dir.is_dir() {
            fs::remove_dir_all(&node_dir).with_context(|| format!("failed to remove {}", node_dir.display()))?;
        }
        fs::rename(unpacked, &node_dir).with_context(|| format!("failed to move {} to {}", unpacked.display(), node_dir.display()))?;

        Ok(())
    }
}

impl Installable for NodeRuntime {
    fn name(&self) -> &str {
        "Node.js"
    }

    fn is_installed(&self) -> bool {
        self.layout.node_bin().is_file()
    }

    fn install(&self, offline: bool) -> anyhow::Result<()> {
        let archive = self.fetch(offline)?;
        let unpacked = match self.unpack(&archive) {
            Ok(unpacked) => unpacked,
            Err(err) => {
                // next attempt downloads it again
                warn!(?err, archive = %archive.display(), "dropping cached archive");
                let _ = fs::remove_file(&archive);
                return Err(err);
            }
        };

        self.replace(&unpacked)
    }
}
