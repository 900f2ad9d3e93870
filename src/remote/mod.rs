//! # Remote Store Module
//!
//! Interfaccia verso lo store remoto che ospita screenshot e preview.
//!
//! ## Responsabilità:
//! - Definisce i tipi remoti: versione, localization, device set, asset
//! - Definisce `AssetStore`, la capability consumata dal sync
//! - `snapshot`: implementazione in memoria persistita su JSON
//!
//! ## Gerarchia remota:
//! ```text
//! AppVersion
//! └── Localization (una per locale)
//!     └── DeviceSet (uno per kind + display type)
//!         └── RemoteAsset (ordinati, stato di processing asincrono)
//! ```
//!
//! Il client HTTP del vendor non fa parte del crate: basta implementare
//! `AssetStore` per collegarlo.

pub mod snapshot;

pub use snapshot::{ProcessingModel, SnapshotStore, StoreStats};

use crate::device::AssetKind;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// App version being edited
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppVersion {
    pub id: String,
    pub version_string: String,
    pub platform: String,
}

/// Per-language record under an app version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Localization {
    pub id: String,
    pub locale: String,
}

/// Remote collection of assets for one (localization, kind, display type)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceSet {
    pub id: String,
    pub kind: AssetKind,
    pub display_type: String,
}

/// Stato di processing lato remoto
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingState {
    AwaitingUpload,
    /// Accepted, not yet finalized
    UploadComplete,
    Complete,
    Failed,
}

impl ProcessingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingUpload => "AWAITING_UPLOAD",
            Self::UploadComplete => "UPLOAD_COMPLETE",
            Self::Complete => "COMPLETE",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for ProcessingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uploaded asset handle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteAsset {
    pub id: String,
    /// MD5 hex of the source file
    pub checksum: Option<String>,
    pub file_name: String,
    pub state: ProcessingState,
}

impl RemoteAsset {
    pub fn is_complete(&self) -> bool {
        self.state == ProcessingState::Complete
    }
}

/// Device set together with its assets, in remote order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDeviceSet {
    pub set: DeviceSet,
    pub assets: Vec<RemoteAsset>,
}

impl RemoteDeviceSet {
    pub fn contains_checksum(&self, checksum: &str) -> bool {
        self.assets
            .iter()
            .any(|asset| asset.checksum.as_deref() == Some(checksum))
    }

    pub fn asset_ids(&self) -> Vec<String> {
        self.assets.iter().map(|asset| asset.id.clone()).collect()
    }

    /// Target order: assets sorted by file name
    pub fn sorted_asset_ids(&self) -> Vec<String> {
        let mut assets: Vec<&RemoteAsset> = self.assets.iter().collect();
        assets.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        assets.into_iter().map(|asset| asset.id.clone()).collect()
    }
}

/// Capability offered by the remote store
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Editable version for the platform, if any
    async fn fetch_edit_version(&self, platform: &str) -> Result<Option<AppVersion>>;

    async fn fetch_localizations(&self, version: &AppVersion) -> Result<Vec<Localization>>;

    async fn fetch_device_sets(&self, localization: &Localization, kind: AssetKind) -> Result<Vec<DeviceSet>>;

    async fn fetch_assets(&self, set: &DeviceSet) -> Result<Vec<RemoteAsset>>;

    async fn create_device_set(
        &self,
        localization: &Localization,
        kind: AssetKind,
        display_type: &str,
    ) -> Result<DeviceSet>;

    async fn create_localization(&self, version: &AppVersion, locale: &str) -> Result<Localization>;

    /// Uploads without waiting for remote processing
    async fn upload_asset(&self, set: &DeviceSet, path: &Path) -> Result<RemoteAsset>;

    async fn delete_asset(&self, asset: &RemoteAsset) -> Result<()>;

    async fn reorder(&self, set: &DeviceSet, asset_ids: &[String]) -> Result<()>;
}
