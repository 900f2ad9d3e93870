//! # Snapshot Store Module
//!
//! Implementazione di `AssetStore` in memoria, persistita in un file JSON.
//!
//! ## Responsabilità:
//! - Mantiene il catalogo remoto: versioni, localization, device set, asset
//! - Simula il processing asincrono degli asset (`ProcessingModel`)
//! - Conta le chiamate ricevute per diagnostica e test
//! - Salva/carica il catalogo da `~/.media-sync/store_<hash>.json`
//!
//! ## Simulazione del processing:
//! - `Immediate`: l'asset è COMPLETE appena caricato
//! - `AfterPolls(n)`: resta UPLOAD_COMPLETE per `n` letture, poi COMPLETE
//! - `AlwaysFailed`: ogni upload termina FAILED
//! - `FailFirst(n)`: i primi `n` upload terminano FAILED, i successivi COMPLETE
//!
//! ## Esempio struttura catalogo:
//! ```json
//! {
//!   "app_id": "com.example.app",
//!   "versions": [{ "version": { "id": "1", "version_string": "1.0", "platform": "ios" }, "editable": true }],
//!   "localizations": [{ "version_id": "1", "localization": { "id": "2", "locale": "en-US" } }],
//!   "device_sets": [{ "localization_id": "2", "set": { "id": "3", "kind": "screenshot", "display_type": "APP_IPHONE_47" }, "assets": [] }],
//!   "next_id": 4
//! }
//! ```

use super::{AppVersion, AssetStore, DeviceSet, Localization, ProcessingState, RemoteAsset};
use crate::device::AssetKind;
use crate::error::SyncError;
use crate::file_manager::FileManager;
use crate::languages::canonical_language;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

/// How uploaded assets move through the remote processing states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingModel {
    Immediate,
    AfterPolls(u32),
    AlwaysFailed,
    FailFirst(u32),
}

/// Calls received by the store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub uploads: usize,
    pub deletes: usize,
    pub reorders: usize,
    pub localizations_created: usize,
    pub device_sets_created: usize,
    pub rejected_calls: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct VersionRecord {
    version: AppVersion,
    editable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LocalizationRecord {
    version_id: String,
    localization: Localization,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AssetRecord {
    asset: RemoteAsset,
    #[serde(default)]
    pending_polls: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DeviceSetRecord {
    localization_id: String,
    set: DeviceSet,
    assets: Vec<AssetRecord>,
}

/// Persisted remote catalog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Catalog {
    app_id: String,
    versions: Vec<VersionRecord>,
    localizations: Vec<LocalizationRecord>,
    device_sets: Vec<DeviceSetRecord>,
    next_id: u64,
}

impl Catalog {
    fn next_id(&mut self) -> String {
        self.next_id += 1;
        self.next_id.to_string()
    }

    fn set_mut(&mut self, set_id: &str) -> Result<&mut DeviceSetRecord> {
        self.device_sets
            .iter_mut()
            .find(|record| record.set.id == set_id)
            .ok_or_else(|| SyncError::Remote(format!("Device set {} not found", set_id)).into())
    }
}

struct StoreState {
    catalog: Catalog,
    model: ProcessingModel,
    stats: StoreStats,
    failing_uploads: usize,
    failing_deletes: usize,
}

/// In-memory remote store persisted as JSON
pub struct SnapshotStore {
    path: Option<PathBuf>,
    state: Mutex<StoreState>,
}

impl SnapshotStore {
    /// Nuovo catalogo in memoria con una versione modificabile "1.0"
    pub fn new(app_id: &str, platform: &str) -> Self {
        let mut catalog = Catalog {
            app_id: app_id.to_string(),
            ..Default::default()
        };
        let id = catalog.next_id();
        catalog.versions.push(VersionRecord {
            version: AppVersion {
                id,
                version_string: "1.0".to_string(),
                platform: platform.to_string(),
            },
            editable: true,
        });
        Self::from_catalog(catalog, None)
    }

    /// Catalogo senza alcuna versione modificabile
    pub fn without_editable_version(app_id: &str) -> Self {
        let catalog = Catalog {
            app_id: app_id.to_string(),
            ..Default::default()
        };
        Self::from_catalog(catalog, None)
    }

    fn from_catalog(catalog: Catalog, path: Option<PathBuf>) -> Self {
        Self {
            path,
            state: Mutex::new(StoreState {
                catalog,
                model: ProcessingModel::Immediate,
                stats: StoreStats::default(),
                failing_uploads: 0,
                failing_deletes: 0,
            }),
        }
    }

    /// Percorso di default del catalogo per un'app
    pub fn default_path(app_id: &str) -> Result<PathBuf> {
        let store_dir = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?
            .join(".media-sync");

        let mut hasher = Sha256::new();
        hasher.update(app_id.as_bytes());
        let hash = hex::encode(hasher.finalize())[..16].to_string();

        Ok(store_dir.join(format!("store_{}.json", hash)))
    }

    /// Carica il catalogo da file, o ne crea uno nuovo se non esiste
    pub async fn open(path: &Path, app_id: &str, platform: &str) -> Result<Self> {
        if !path.exists() {
            let mut store = Self::new(app_id, platform);
            store.path = Some(path.to_path_buf());
            return Ok(store);
        }

        let content = fs::read_to_string(path).await?;
        let catalog: Catalog = serde_json::from_str(&content)?;
        if catalog.app_id != app_id {
            return Err(SyncError::InvalidConfig(format!(
                "Store file {} belongs to app '{}', not '{}'",
                path.display(),
                catalog.app_id,
                app_id
            ))
            .into());
        }

        let store = Self::from_catalog(catalog, Some(path.to_path_buf()));
        {
            let mut state = store.state.lock().await;
            let has_editable = state
                .catalog
                .versions
                .iter()
                .any(|record| record.editable && record.version.platform == platform);
            if !has_editable {
                let id = state.catalog.next_id();
                state.catalog.versions.push(VersionRecord {
                    version: AppVersion {
                        id,
                        version_string: "1.0".to_string(),
                        platform: platform.to_string(),
                    },
                    editable: true,
                });
            }
        }
        Ok(store)
    }

    /// Save current catalog to file
    pub async fn save(&self) -> Result<()> {
        let Some(ref path) = self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = {
            let state = self.state.lock().await;
            serde_json::to_string_pretty(&state.catalog)?
        };
        fs::write(path, content).await?;
        Ok(())
    }

    pub async fn set_processing_model(&self, model: ProcessingModel) {
        self.state.lock().await.model = model;
    }

    /// The next `count` upload calls fail before reaching the store
    pub async fn fail_next_uploads(&self, count: usize) {
        self.state.lock().await.failing_uploads = count;
    }

    /// The next `count` delete calls fail without deleting
    pub async fn fail_next_deletes(&self, count: usize) {
        self.state.lock().await.failing_deletes = count;
    }

    pub async fn stats(&self) -> StoreStats {
        self.state.lock().await.stats.clone()
    }

    /// Numero totale di asset presenti nel catalogo
    pub async fn asset_count(&self) -> usize {
        let state = self.state.lock().await;
        state.catalog.device_sets.iter().map(|record| record.assets.len()).sum()
    }
}

#[async_trait]
impl AssetStore for SnapshotStore {
    async fn fetch_edit_version(&self, platform: &str) -> Result<Option<AppVersion>> {
        let state = self.state.lock().await;
        Ok(state
            .catalog
            .versions
            .iter()
            .find(|record| record.editable && record.version.platform == platform)
            .map(|record| record.version.clone()))
    }

    async fn fetch_localizations(&self, version: &AppVersion) -> Result<Vec<Localization>> {
        let state = self.state.lock().await;
        Ok(state
            .catalog
            .localizations
            .iter()
            .filter(|record| record.version_id == version.id)
            .map(|record| record.localization.clone())
            .collect())
    }

    async fn fetch_device_sets(&self, localization: &Localization, kind: AssetKind) -> Result<Vec<DeviceSet>> {
        let state = self.state.lock().await;
        Ok(state
            .catalog
            .device_sets
            .iter()
            .filter(|record| record.localization_id == localization.id && record.set.kind == kind)
            .map(|record| record.set.clone())
            .collect())
    }

    async fn fetch_assets(&self, set: &DeviceSet) -> Result<Vec<RemoteAsset>> {
        let mut state = self.state.lock().await;
        let record = state.catalog.set_mut(&set.id)?;

        // Each read moves accepted assets one step closer to completion
        for asset in record.assets.iter_mut() {
            if asset.asset.state == ProcessingState::UploadComplete {
                if asset.pending_polls == 0 {
                    asset.asset.state = ProcessingState::Complete;
                } else {
                    asset.pending_polls -= 1;
                }
            }
        }

        Ok(record.assets.iter().map(|asset| asset.asset.clone()).collect())
    }

    async fn create_device_set(
        &self,
        localization: &Localization,
        kind: AssetKind,
        display_type: &str,
    ) -> Result<DeviceSet> {
        let mut state = self.state.lock().await;
        if let Some(existing) = state.catalog.device_sets.iter().find(|record| {
            record.localization_id == localization.id
                && record.set.kind == kind
                && record.set.display_type == display_type
        }) {
            return Ok(existing.set.clone());
        }

        let set = DeviceSet {
            id: state.catalog.next_id(),
            kind,
            display_type: display_type.to_string(),
        };
        state.catalog.device_sets.push(DeviceSetRecord {
            localization_id: localization.id.clone(),
            set: set.clone(),
            assets: Vec::new(),
        });
        state.stats.device_sets_created += 1;
        debug!("Created {} set {} for {}", kind, display_type, localization.locale);
        Ok(set)
    }

    async fn create_localization(&self, version: &AppVersion, locale: &str) -> Result<Localization> {
        let mut state = self.state.lock().await;
        let Some(locale) = canonical_language(locale) else {
            state.stats.rejected_calls += 1;
            return Err(SyncError::UnknownLocale(locale.to_string()).into());
        };
        if state
            .catalog
            .localizations
            .iter()
            .any(|record| record.version_id == version.id && record.localization.locale == locale)
        {
            state.stats.rejected_calls += 1;
            return Err(SyncError::Remote(format!("Localization {} already exists", locale)).into());
        }

        let localization = Localization {
            id: state.catalog.next_id(),
            locale: locale.to_string(),
        };
        state.catalog.localizations.push(LocalizationRecord {
            version_id: version.id.clone(),
            localization: localization.clone(),
        });
        state.stats.localizations_created += 1;
        Ok(localization)
    }

    async fn upload_asset(&self, set: &DeviceSet, path: &Path) -> Result<RemoteAsset> {
        {
            let mut state = self.state.lock().await;
            if state.failing_uploads > 0 {
                state.failing_uploads -= 1;
                state.stats.rejected_calls += 1;
                return Err(SyncError::Remote(format!("Upload of {} was rejected", path.display())).into());
            }
        }

        let checksum = FileManager::checksum(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut state = self.state.lock().await;
        let model = state.model;
        let (asset_state, pending_polls) = match model {
            ProcessingModel::Immediate => (ProcessingState::Complete, 0),
            ProcessingModel::AfterPolls(polls) => (ProcessingState::UploadComplete, polls),
            ProcessingModel::AlwaysFailed => (ProcessingState::Failed, 0),
            ProcessingModel::FailFirst(remaining) if remaining > 0 => {
                state.model = ProcessingModel::FailFirst(remaining - 1);
                (ProcessingState::Failed, 0)
            }
            ProcessingModel::FailFirst(_) => (ProcessingState::Complete, 0),
        };

        let asset = RemoteAsset {
            id: state.catalog.next_id(),
            checksum: Some(checksum),
            file_name,
            state: asset_state,
        };
        state.catalog.set_mut(&set.id)?.assets.push(AssetRecord {
            asset: asset.clone(),
            pending_polls,
        });
        state.stats.uploads += 1;
        Ok(asset)
    }

    async fn delete_asset(&self, asset: &RemoteAsset) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.failing_deletes > 0 {
            state.failing_deletes -= 1;
            state.stats.rejected_calls += 1;
            return Err(SyncError::Remote(format!("Delete of asset {} was rejected", asset.id)).into());
        }

        let record = state
            .catalog
            .device_sets
            .iter_mut()
            .find(|record| record.assets.iter().any(|a| a.asset.id == asset.id))
            .ok_or_else(|| SyncError::Remote(format!("Asset {} not found", asset.id)))?;
        record.assets.retain(|a| a.asset.id != asset.id);
        state.stats.deletes += 1;
        Ok(())
    }

    async fn reorder(&self, set: &DeviceSet, asset_ids: &[String]) -> Result<()> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let record = state.catalog.set_mut(&set.id)?;

        let mut current: Vec<&str> = record.assets.iter().map(|a| a.asset.id.as_str()).collect();
        let mut requested: Vec<&str> = asset_ids.iter().map(String::as_str).collect();
        current.sort_unstable();
        requested.sort_unstable();
        if current != requested {
            state.stats.rejected_calls += 1;
            return Err(SyncError::Remote(format!("Reorder ids do not match set {}", set.id)).into());
        }

        let mut reordered = Vec::with_capacity(asset_ids.len());
        for id in asset_ids {
            if let Some(index) = record.assets.iter().position(|a| &a.asset.id == id) {
                reordered.push(record.assets.remove(index));
            }
        }
        record.assets = reordered;
        state.stats.reorders += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn store_with_set() -> (SnapshotStore, Localization, DeviceSet) {
        let store = SnapshotStore::new("com.example.app", "ios");
        let version = store.fetch_edit_version("ios").await.unwrap().unwrap();
        let localization = store.create_localization(&version, "en-US").await.unwrap();
        let set = store
            .create_device_set(&localization, AssetKind::Screenshot, "APP_IPHONE_47")
            .await
            .unwrap();
        (store, localization, set)
    }

    fn fixture(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_edit_version_per_platform() {
        let store = SnapshotStore::new("com.example.app", "ios");
        assert!(store.fetch_edit_version("ios").await.unwrap().is_some());
        assert!(store.fetch_edit_version("osx").await.unwrap().is_none());

        let empty = SnapshotStore::without_editable_version("com.example.app");
        assert!(empty.fetch_edit_version("ios").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_device_set_is_unique() {
        let (store, localization, set) = store_with_set().await;
        let again = store
            .create_device_set(&localization, AssetKind::Screenshot, "APP_IPHONE_47")
            .await
            .unwrap();
        assert_eq!(set, again);
        assert_eq!(store.stats().await.device_sets_created, 1);

        let preview_set = store
            .create_device_set(&localization, AssetKind::Preview, "IPHONE_47")
            .await
            .unwrap();
        assert_ne!(preview_set.id, set.id);
        let screenshot_sets = store.fetch_device_sets(&localization, AssetKind::Screenshot).await.unwrap();
        assert_eq!(screenshot_sets, vec![set]);
    }

    #[tokio::test]
    async fn test_unknown_locale_rejected() {
        let store = SnapshotStore::new("com.example.app", "ios");
        let version = store.fetch_edit_version("ios").await.unwrap().unwrap();
        let err = store.create_localization(&version, "xx-XX").await.unwrap_err();
        assert!(matches!(err.downcast_ref::<SyncError>(), Some(SyncError::UnknownLocale(_))));
    }

    #[tokio::test]
    async fn test_processing_after_polls() {
        let temp_dir = TempDir::new().unwrap();
        let (store, _, set) = store_with_set().await;
        store.set_processing_model(ProcessingModel::AfterPolls(1)).await;

        let uploaded = store
            .upload_asset(&set, &fixture(&temp_dir, "01.png", b"one"))
            .await
            .unwrap();
        assert_eq!(uploaded.state, ProcessingState::UploadComplete);
        assert_eq!(uploaded.file_name, "01.png");

        let first = store.fetch_assets(&set).await.unwrap();
        assert_eq!(first[0].state, ProcessingState::UploadComplete);
        let second = store.fetch_assets(&set).await.unwrap();
        assert_eq!(second[0].state, ProcessingState::Complete);
    }

    #[tokio::test]
    async fn test_fail_first_then_complete() {
        let temp_dir = TempDir::new().unwrap();
        let (store, _, set) = store_with_set().await;
        store.set_processing_model(ProcessingModel::FailFirst(1)).await;

        let a = store.upload_asset(&set, &fixture(&temp_dir, "a.png", b"a")).await.unwrap();
        let b = store.upload_asset(&set, &fixture(&temp_dir, "b.png", b"b")).await.unwrap();
        assert_eq!(a.state, ProcessingState::Failed);
        assert_eq!(b.state, ProcessingState::Complete);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let temp_dir = TempDir::new().unwrap();
        let (store, _, set) = store_with_set().await;
        let path = fixture(&temp_dir, "a.png", b"a");

        store.fail_next_uploads(1).await;
        assert!(store.upload_asset(&set, &path).await.is_err());
        let asset = store.upload_asset(&set, &path).await.unwrap();

        store.fail_next_deletes(1).await;
        assert!(store.delete_asset(&asset).await.is_err());
        store.delete_asset(&asset).await.unwrap();

        let stats = store.stats().await;
        assert_eq!(stats.uploads, 1);
        assert_eq!(stats.deletes, 1);
        assert_eq!(stats.rejected_calls, 2);
        assert_eq!(store.asset_count().await, 0);
    }

    #[tokio::test]
    async fn test_reorder_requires_same_ids() {
        let temp_dir = TempDir::new().unwrap();
        let (store, _, set) = store_with_set().await;
        let a = store.upload_asset(&set, &fixture(&temp_dir, "a.png", b"a")).await.unwrap();
        let b = store.upload_asset(&set, &fixture(&temp_dir, "b.png", b"b")).await.unwrap();

        assert!(store.reorder(&set, &[a.id.clone()]).await.is_err());
        store.reorder(&set, &[b.id.clone(), a.id.clone()]).await.unwrap();

        let assets = store.fetch_assets(&set).await.unwrap();
        let ids: Vec<&str> = assets.iter().map(|asset| asset.id.as_str()).collect();
        assert_eq!(ids, vec![b.id.as_str(), a.id.as_str()]);
    }

    #[tokio::test]
    async fn test_save_and_open_catalog() {
        let temp_dir = TempDir::new().unwrap();
        let catalog_path = temp_dir.path().join("nested").join("store.json");

        let store = SnapshotStore::open(&catalog_path, "com.example.app", "ios").await.unwrap();
        let version = store.fetch_edit_version("ios").await.unwrap().unwrap();
        store.create_localization(&version, "de-DE").await.unwrap();
        store.save().await.unwrap();

        let reopened = SnapshotStore::open(&catalog_path, "com.example.app", "ios").await.unwrap();
        let version = reopened.fetch_edit_version("ios").await.unwrap().unwrap();
        let localizations = reopened.fetch_localizations(&version).await.unwrap();
        assert_eq!(localizations.len(), 1);
        assert_eq!(localizations[0].locale, "de-DE");

        let other_app = SnapshotStore::open(&catalog_path, "com.example.other", "ios").await;
        assert!(other_app.is_err());
    }

    #[test]
    fn test_default_path_is_per_app() {
        let a = SnapshotStore::default_path("com.example.a").unwrap();
        let b = SnapshotStore::default_path("com.example.b").unwrap();
        assert_ne!(a, b);
        assert!(a.to_string_lossy().contains(".media-sync"));
    }
}
