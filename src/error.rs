//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom della sincronizzazione.
//!
//! ## Responsabilità:
//! - Definisce `SyncError` enum per categorizzare tutti gli errori possibili
//! - Fornisce messaggi di errore descrittivi e strutturati
//! - Integra con `thiserror` per automatic error conversion
//! - Distingue errori fatali da errori locali a un singolo file o job
//!
//! ## Categorie di errori:
//! - **Validazione** (`UnsupportedResolution`, `UnsupportedFormat`, `Probe`):
//!   il file viene saltato, la sincronizzazione continua
//! - **Configurazione** (`UnknownLocale`, `NoEditableVersion`, `InvalidConfig`):
//!   fatali, immediati
//! - **Remote** (`Remote`): fallimento di un singolo job, contenuto nel worker pool
//! - **Convergenza** (`DeleteNotConverged`, `UploadNotConverged`):
//!   budget di tentativi esaurito, fatali
//!
//! ## Esempio:
//! ```ignore
//! if version.is_none() {
//!     return Err(SyncError::NoEditableVersion { app: app_id.to_string(), platform }.into());
//! }
//! ```

use std::path::PathBuf;

/// Custom error types for media synchronization
#[derive(thiserror::Error, Debug)]
pub enum SyncError {
    #[error("Unsupported screen size {width}x{height} for path '{}'", path.display())]
    UnsupportedResolution {
        path: PathBuf,
        width: u32,
        height: u32,
    },

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Could not find or parse file at path '{}': {reason}", path.display())]
    Probe { path: PathBuf, reason: String },

    #[error("{0} is not an available language")]
    UnknownLocale(String),

    #[error("Could not find a version to edit for app '{app}' for '{platform}'")]
    NoEditableVersion { app: String, platform: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Remote store error: {0}")]
    Remote(String),

    #[error("Failed verification of all assets deleted... {remaining} asset(s) still exist")]
    DeleteNotConverged { remaining: usize },

    #[error("Failed verification of all assets uploaded... {incomplete} incomplete asset(s) still exist")]
    UploadNotConverged { incomplete: usize },
}

impl SyncError {
    /// Errori che interrompono l'intera esecuzione
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::UnknownLocale(_)
                | Self::NoEditableVersion { .. }
                | Self::InvalidConfig(_)
                | Self::DeleteNotConverged { .. }
                | Self::UploadNotConverged { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(SyncError::UploadNotConverged { incomplete: 2 }.is_fatal());
        assert!(SyncError::UnknownLocale("xx-XX".to_string()).is_fatal());
        assert!(!SyncError::Remote("timeout".to_string()).is_fatal());
        assert!(!SyncError::UnsupportedResolution {
            path: PathBuf::from("en-US/shot.png"),
            width: 1,
            height: 1,
        }
        .is_fatal());
    }

    #[test]
    fn test_messages_carry_counts() {
        let err = SyncError::DeleteNotConverged { remaining: 3 };
        assert_eq!(
            err.to_string(),
            "Failed verification of all assets deleted... 3 asset(s) still exist"
        );
    }
}
