//! # Sync Jobs Module
//!
//! Unità di lavoro eseguite dal `WorkerPool` contro lo store remoto.
//!
//! ## Responsabilità:
//! - `Job`: enum chiuso (delete, upload, reorder)
//! - `execute`: dispatch esaustivo verso l'`AssetStore`
//! - Descrizione leggibile di ogni job per i log del pool

use crate::remote::{AssetStore, DeviceSet, RemoteAsset};
use anyhow::{Context, Result};
use std::fmt;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

/// Unit of remote work
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    Delete {
        asset: RemoteAsset,
        locale: String,
        display_type: String,
    },
    Upload {
        set: DeviceSet,
        path: PathBuf,
    },
    /// `asset_ids` is the complete target order of the set
    Reorder {
        set: DeviceSet,
        asset_ids: Vec<String>,
    },
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Job::Delete {
                asset,
                locale,
                display_type,
            } => write!(f, "delete {} {} {}", locale, display_type, asset.file_name),
            Job::Upload { set, path } => write!(f, "upload {} to {}", path.display(), set.display_type),
            Job::Reorder { set, asset_ids } => {
                write!(f, "reorder {} ({} assets)", set.display_type, asset_ids.len())
            }
        }
    }
}

/// Esegue un singolo job contro lo store
pub async fn execute<S>(store: &S, job: Job) -> Result<()>
where
    S: AssetStore + ?Sized,
{
    let start_time = Instant::now();

    match job {
        Job::Delete {
            asset,
            locale,
            display_type,
        } => {
            debug!("Deleting '{}' for {} '{}'", asset.file_name, locale, display_type);
            store
                .delete_asset(&asset)
                .await
                .with_context(|| format!("Failed to delete '{}' for {}", asset.file_name, locale))?;
            info!(
                "Deleted '{}' for {} '{}' ({:.2} secs)",
                asset.file_name,
                locale,
                display_type,
                start_time.elapsed().as_secs_f64()
            );
        }
        Job::Upload { set, path } => {
            debug!("Uploading '{}'...", path.display());
            let asset = store
                .upload_asset(&set, &path)
                .await
                .with_context(|| format!("Failed to upload '{}'", path.display()))?;
            info!(
                "Uploaded '{}' as {} ({:.2} secs)",
                path.display(),
                asset.state,
                start_time.elapsed().as_secs_f64()
            );
        }
        Job::Reorder { set, asset_ids } => {
            store
                .reorder(&set, &asset_ids)
                .await
                .with_context(|| format!("Failed to reorder set {}", set.display_type))?;
            info!(
                "Reordered {} assets in {} ({:.2} secs)",
                asset_ids.len(),
                set.display_type,
                start_time.elapsed().as_secs_f64()
            );
        }
    }

    Ok(())
}
