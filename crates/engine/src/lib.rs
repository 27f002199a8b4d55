#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! The otaup update engine
//!
//! One attempt runs at a time, in five steps: resolve versions, stage,
//! download, unpack, swap. The staging tree is the unit of rollback — any
//! failure after it is created removes it and leaves the live tree exactly
//! as it was. Committing a successful update is the caller's job: restart
//! the process so it boots from the swapped-in tree.

mod swap;
mod unpack;

use otaup_config::Config;
use otaup_errors::Result;
use otaup_manifest::{latest_entry, read_installed_version, write_version_marker};
use otaup_net::{download_file, fetch_text, NetClient, NetConfig};
use tracing::{debug, info, warn};

pub use otaup_manifest::{ManifestEntry, Version};

/// Outcome of a version check
#[derive(Debug, Clone)]
pub struct UpdateCheck {
    pub installed: Version,
    pub available: ManifestEntry,
    /// Whether an attempt would proceed (version order, or force)
    pub update_due: bool,
}

/// The update engine
///
/// Owns the HTTP client and the configured tree layout for the lifetime of
/// an attempt. Assumes exclusive ownership of the bundle file and the
/// staging tree; nothing else may touch them while an attempt is in flight.
pub struct Updater {
    config: Config,
    client: NetClient,
}

impl Updater {
    /// Create an updater from a configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built from it.
    pub fn new(mut config: Config) -> Result<Self> {
        config.validate()?;
        let net_config = NetConfig {
            headers: config.headers.clone(),
            ..NetConfig::default()
        };
        let client = NetClient::new(&net_config)?;
        Ok(Self { config, client })
    }

    /// The validated configuration this updater runs with
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Read the installed version and resolve the latest remote entry
    ///
    /// # Errors
    ///
    /// Returns an error if the installed marker cannot be read (beyond not
    /// existing) or the manifest cannot be fetched. An unparseable manifest
    /// is not an error; it resolves to "no update available".
    pub async fn check(&self) -> Result<UpdateCheck> {
        let installed = read_installed_version(&self.config.live_root()).await?;

        let url = format!("{}/versions", self.config.base_url);
        let body = fetch_text(&self.client, &url).await?;
        let available = latest_entry(&body);

        debug!(installed = %installed, available = %available.version, "version check");

        let update_due = available.version > installed || self.config.force_update;
        Ok(UpdateCheck {
            installed,
            available,
            update_due,
        })
    }

    /// Install the latest version if one is due
    ///
    /// Returns `true` when an update was downloaded and installed — the
    /// caller must then restart the process — and `false` when the device is
    /// already current.
    ///
    /// # Errors
    ///
    /// Any failure between staging creation and swap completion removes the
    /// staging tree and the bundle, then propagates. The live tree is never
    /// touched by that recovery. If the staging cleanup itself fails with
    /// anything but "not found", the cleanup error propagates and the
    /// original failure is lost.
    pub async fn install_update_if_available(&self) -> Result<bool> {
        let check = self.check().await?;
        if !check.update_due {
            debug!(installed = %check.installed, "no update due");
            return Ok(false);
        }

        info!(
            from = %check.installed,
            to = %check.available.version,
            "updating"
        );

        if let Err(e) = self.run_attempt(&check.available).await {
            warn!(error = %e, "update failed, removing staging tree");
            otaup_fsops::remove_file(&self.config.bundle_path()).await?;
            otaup_fsops::remove_tree(&self.config.staging_root()).await?;
            return Err(e);
        }

        info!(version = %check.available.version, "update installed, restart to apply");
        Ok(true)
    }

    /// One staged attempt: stage, download, unpack, swap
    async fn run_attempt(&self, entry: &ManifestEntry) -> Result<()> {
        let staging = self.config.staging_root();

        // A staging tree can only be left over from an interrupted attempt
        otaup_fsops::remove_tree(&staging).await?;
        otaup_fsops::create_dir_all(&staging).await?;
        write_version_marker(&staging, &entry.version).await?;

        self.download_bundle(entry).await?;

        let bundle = self.config.bundle_path();
        unpack::unpack_bundle(
            &bundle,
            &self.config.root,
            &self.config.live_dir,
            &self.config.staging_dir,
        )
        .await?;
        otaup_fsops::remove_file(&bundle).await?;

        swap::swap_live(
            &self.config.root,
            &self.config.live_root(),
            &staging,
        )
        .await
    }

    async fn download_bundle(&self, entry: &ManifestEntry) -> Result<()> {
        let url = format!("{}/{}", self.config.base_url, entry.filename);
        let bundle = self.config.bundle_path();

        debug!(url = %url, "downloading bundle");
        let result = download_file(&self.client, &url, &bundle, entry.hash.as_ref()).await?;
        debug!(bytes = result.size, "bundle saved");
        Ok(())
    }
}
