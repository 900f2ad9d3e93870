//! # File Management Module
//!
//! Questo modulo gestisce la discovery dei file media locali per lingua.
//!
//! ## Responsabilità:
//! - Discovery delle cartelle lingua (`<root>/<locale>` e `<root>/iMessage/<locale>`)
//! - Validazione dei nomi cartella contro le lingue disponibili
//! - Raccolta e classificazione degli asset di un kind
//! - Checksum del contenuto per la deduplicazione degli upload
//!
//! ## Formati supportati:
//! - **Screenshot**: PNG, JPG, JPEG
//! - **Preview**: MOV, M4V, MP4
//!
//! ## Gestione errori:
//! - Cartella con lingua sconosciuta → errore fatale (salvo validazione disattivata)
//! - File con risoluzione non supportata → loggato e saltato
//! - Device non accettato dallo store (es. iPhone XR) → warning e saltato
//!
//! ## Esempio:
//! ```ignore
//! let assets = FileManager::collect_assets(&root, AssetKind::Screenshot, false, &MediaProbe)?;
//! let checksum = FileManager::checksum(&assets[0].path).await?;
//! ```

use crate::device::AssetKind;
use crate::error::SyncError;
use crate::languages::canonical_language;
use crate::media::{DimensionProbe, LocalAsset, COMPANION_DIR_NAME};
use anyhow::{Context, Result};
use md5::{Digest, Md5};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, warn};
use walkdir::WalkDir;

/// Manages local media discovery
pub struct FileManager;

impl FileManager {
    /// Trova le cartelle lingua sotto `root`, incluse quelle companion
    pub fn language_folders(root: &Path, ignore_validation: bool) -> Result<Vec<PathBuf>> {
        let companion_dir = root.join(COMPANION_DIR_NAME);

        let mut folders: Vec<PathBuf> = Self::subdirectories(root)?
            .into_iter()
            .filter(|folder| folder != &companion_dir)
            .collect();
        if companion_dir.is_dir() {
            folders.extend(Self::subdirectories(&companion_dir)?);
        }

        if !ignore_validation {
            let unsupported: Vec<String> = folders
                .iter()
                .map(|folder| Self::folder_name(folder))
                .filter(|name| canonical_language(name).is_none())
                .collect();
            if !unsupported.is_empty() {
                return Err(SyncError::UnknownLocale(unsupported.join(", ")).into());
            }
        }

        Ok(folders)
    }

    /// Raccoglie e classifica gli asset di un kind per tutte le lingue
    pub fn collect_assets(
        root: &Path,
        kind: AssetKind,
        ignore_validation: bool,
        probe: &dyn DimensionProbe,
    ) -> Result<Vec<LocalAsset>> {
        let mut assets = Vec::new();

        for folder in Self::language_folders(root, ignore_validation)? {
            let folder_name = Self::folder_name(&folder);
            let language = match canonical_language(&folder_name) {
                Some(language) => language.to_string(),
                None if ignore_validation => folder_name.clone(),
                None => return Err(SyncError::UnknownLocale(folder_name).into()),
            };

            let files = Self::find_media_files(&folder, kind)?;
            if files.is_empty() {
                continue;
            }

            if files.iter().any(|file| Self::is_framed(file)) {
                warn!("Framed {}s are detected in {}, non-framed files may be skipped", kind, folder.display());
            }

            for file in files {
                match LocalAsset::new(&file, language.clone(), kind, probe) {
                    Ok(asset) => assets.push(asset),
                    Err(e) if e.is_fatal() => return Err(e.into()),
                    Err(e) => error!("Skipping {} file {}: {}", kind, file.display(), e),
                }
            }
        }

        // The remote store does not accept every device class (e.g. 6.1-inch phones)
        let mut unaccepted_shown = false;
        assets.retain(|asset| {
            let accepted = asset.display_type().is_some();
            if !accepted {
                if !unaccepted_shown {
                    warn!("Unaccepted device {}s are detected, these files will be skipped", kind);
                    unaccepted_shown = true;
                }
                warn!(
                    "Skipping {} file: {} - {} is not an accepted device",
                    kind,
                    asset.path.display(),
                    asset.screen_size.formatted_name()
                );
            }
            accepted
        });

        Ok(assets)
    }

    /// Find media files of a kind directly inside a language folder, sorted
    pub fn find_media_files(folder: &Path, kind: AssetKind) -> Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = WalkDir::new(folder)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|path| Self::matches_kind(path, kind))
            .collect();

        files.sort();
        Ok(files)
    }

    /// Check extension for discovery (case-insensitive)
    pub fn matches_kind(path: &Path, kind: AssetKind) -> bool {
        if let Some(ext) = path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            match kind {
                AssetKind::Screenshot => matches!(ext_lower.as_str(), "png" | "jpg" | "jpeg"),
                AssetKind::Preview => matches!(ext_lower.as_str(), "mov" | "m4v" | "mp4"),
            }
        } else {
            false
        }
    }

    fn is_framed(path: &Path) -> bool {
        path.file_stem()
            .map(|stem| stem.to_string_lossy().to_lowercase().ends_with("_framed"))
            .unwrap_or(false)
    }

    fn subdirectories(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut folders: Vec<PathBuf> = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir())
            .map(|e| e.into_path())
            .collect();

        folders.sort();
        Ok(folders)
    }

    fn folder_name(folder: &Path) -> String {
        folder
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// MD5 hex of the file content, as reported by the remote store
    pub async fn checksum(path: &Path) -> Result<String> {
        let bytes = fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(hex::encode(Md5::digest(&bytes)))
    }
}
