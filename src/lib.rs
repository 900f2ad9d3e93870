//! # Store Media Sync Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per altri consumatori
//!
//! ## Architettura dei moduli:
//! - `config`: Gestione configurazione e validazione parametri
//! - `error`: Tipi di errore custom
//! - `device`: Tabelle delle risoluzioni accettate per device
//! - `media`: Classificazione dei file locali (screenshot e preview)
//! - `languages`: Lingue accettate dallo store remoto
//! - `file_manager`: Discovery dei file per lingua e checksum
//! - `remote`: Interfaccia `AssetStore` e store su file JSON
//! - `sync`: Worker pool, enumerazione remota e orchestratore
//! - `progress`: Spinner e statistiche
//! - `json_output`: Eventi JSON per uso programmatico
//!
//! ## Utilizzo:
//! ```ignore
//! use store_media_sync::{AssetKind, Config, FileManager, MediaProbe, SnapshotStore, SyncOrchestrator};
//!
//! let store = Arc::new(SnapshotStore::new("com.example.app", "ios"));
//! let assets = FileManager::collect_assets(&root, AssetKind::Screenshot, false, &MediaProbe)?;
//! let orchestrator = SyncOrchestrator::new(store, Config::default(), "com.example.app");
//! let stats = orchestrator.run(AssetKind::Screenshot, &assets).await?;
//! ```

pub mod config;
pub mod device;
pub mod error;
pub mod file_manager;
pub mod json_output;
pub mod languages;
pub mod media;
pub mod progress;
pub mod remote;
pub mod sync;

pub use config::Config;
pub use device::{AssetKind, ScreenSize};
pub use error::SyncError;
pub use file_manager::FileManager;
pub use media::{DimensionProbe, LocalAsset, MediaProbe};
pub use progress::SyncStats;
pub use remote::{AssetStore, SnapshotStore};
pub use sync::{SyncOrchestrator, WorkerPool};
