//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione della sincronizzazione.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con tutti i parametri di sincronizzazione
//! - Fornisce validazione dei parametri di input
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Fornisce valori di default sensati per tutti i parametri
//!
//! ## Parametri di configurazione:
//! - `workers`: Numero di worker paralleli (default: 10, massimo 10)
//! - `deterministic`: Forza un solo worker (default: false)
//! - `max_tries`: Tentativi per le fasi di delete e upload (default: 5)
//! - `poll_interval_secs`: Intervallo di polling dello stato remoto (default: 5)
//! - `overwrite`: Cancella gli asset remoti delle lingue locali prima dell'upload
//! - `skip_screenshots` / `skip_previews`: Salta un kind di asset
//! - `edit_live`: La versione live non è modificabile, nessun upload
//! - `ignore_language_directory_validation`: Accetta qualsiasi nome di cartella
//! - `platform`: Piattaforma della versione da modificare (default: "ios")
//! - `json_output`: Output JSON per uso programmatico
//!
//! ## Esempio:
//! ```ignore
//! let config = Config {
//!     workers: 4,
//!     overwrite: true,
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use crate::error::SyncError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Tetto massimo di worker concorrenti verso lo store remoto
pub const MAX_WORKERS: usize = 10;

/// Piattaforme supportate per la versione in modifica
pub const PLATFORMS: &[&str] = &["ios", "osx", "appletvos"];

/// Configuration for a sync run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of parallel workers (capped at MAX_WORKERS)
    pub workers: usize,
    /// Force a single worker for reproducible runs
    pub deterministic: bool,
    /// Attempts for the delete and upload phases
    pub max_tries: u32,
    /// Seconds between two polls of the remote processing state
    pub poll_interval_secs: u64,
    /// Delete remote assets of the local languages before uploading
    pub overwrite: bool,
    pub skip_screenshots: bool,
    pub skip_previews: bool,
    /// Live versions cannot be edited
    pub edit_live: bool,
    pub ignore_language_directory_validation: bool,
    pub platform: String,
    pub screenshots_path: Option<PathBuf>,
    pub previews_path: Option<PathBuf>,
    /// Output progress and status as JSON for programmatic use
    pub json_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: MAX_WORKERS,
            deterministic: false,
            max_tries: 5,
            poll_interval_secs: 5,
            overwrite: false,
            skip_screenshots: false,
            skip_previews: false,
            edit_live: false,
            ignore_language_directory_validation: false,
            platform: "ios".to_string(),
            screenshots_path: None,
            previews_path: None,
            json_output: false,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(SyncError::InvalidConfig("Number of workers must be greater than 0".to_string()).into());
        }

        if self.max_tries == 0 {
            return Err(SyncError::InvalidConfig("Number of tries must be at least 1".to_string()).into());
        }

        if !PLATFORMS.contains(&self.platform.as_str()) {
            return Err(SyncError::InvalidConfig(format!(
                "Unknown platform '{}', expected one of {}",
                self.platform,
                PLATFORMS.join(", ")
            ))
            .into());
        }

        for path in [&self.screenshots_path, &self.previews_path].into_iter().flatten() {
            if !path.is_dir() {
                return Err(SyncError::InvalidConfig(format!(
                    "Media path is not a directory: {}",
                    path.display()
                ))
                .into());
            }
        }

        Ok(())
    }

    /// Worker effettivi: 1 in modalità deterministica, altrimenti al massimo MAX_WORKERS
    pub fn effective_workers(&self) -> usize {
        if self.deterministic {
            1
        } else {
            self.workers.clamp(1, MAX_WORKERS)
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Load configuration from file
    pub async fn from_file(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &PathBuf) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.workers = 0;
        assert!(config.validate().is_err());

        config.workers = 4;
        config.max_tries = 0;
        assert!(config.validate().is_err());

        config.max_tries = 5;
        config.platform = "android".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err.downcast_ref::<SyncError>(), Some(SyncError::InvalidConfig(_))));

        config.platform = "osx".to_string();
        config.screenshots_path = Some(PathBuf::from("/definitely/not/here"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.workers, 10);
        assert_eq!(config.max_tries, 5);
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.platform, "ios");
        assert!(!config.overwrite);
        assert!(!config.deterministic);
    }

    #[test]
    fn test_effective_workers() {
        let mut config = Config { workers: 32, ..Default::default() };
        assert_eq!(config.effective_workers(), MAX_WORKERS);

        config.workers = 3;
        assert_eq!(config.effective_workers(), 3);

        config.deterministic = true;
        assert_eq!(config.effective_workers(), 1);
    }

    #[tokio::test]
    async fn test_config_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let original_config = Config {
            workers: 4,
            max_tries: 3,
            poll_interval_secs: 1,
            overwrite: true,
            platform: "appletvos".to_string(),
            ..Default::default()
        };

        original_config.save_to_file(&config_path).await.unwrap();
        let loaded_config = Config::from_file(&config_path).await.unwrap();

        assert_eq!(loaded_config.workers, 4);
        assert_eq!(loaded_config.max_tries, 3);
        assert_eq!(loaded_config.poll_interval_secs, 1);
        assert!(loaded_config.overwrite);
        assert_eq!(loaded_config.platform, "appletvos");
    }

    #[tokio::test]
    async fn test_missing_config_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::from_file(&temp_dir.path().join("missing.json")).await.unwrap();
        assert_eq!(config.workers, MAX_WORKERS);
    }
}
