//! # JSON Output Module
//!
//! Questo modulo gestisce l'output strutturato in JSON per uso programmatico.
//!
//! ## Responsabilità:
//! - Emette un messaggio JSON per riga su stdout
//! - Usa `SyncStats` per il riepilogo finale
//!
//! ## Tipi di messaggi:
//! - `start`: Inizio sincronizzazione di un kind
//! - `phase`: Fine di una fase (delete, upload, poll, reorder) con i conteggi
//! - `complete`: Fine sincronizzazione con statistiche finali
//! - `error`: Errore fatale

use crate::config::Config;
use crate::device::AssetKind;
use crate::progress::SyncStats;
use serde::{Deserialize, Serialize};

/// Tipo di messaggio JSON
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum JsonMessage {
    /// Inizio della sincronizzazione di un kind
    #[serde(rename = "start")]
    Start {
        app_id: String,
        kind: AssetKind,
        total_assets: usize,
        config: JsonConfig,
    },

    /// Fase completata
    #[serde(rename = "phase")]
    Phase {
        kind: AssetKind,
        phase: String,
        attempt: u32,
        jobs: usize,
        failed: usize,
    },

    /// Sincronizzazione completata
    #[serde(rename = "complete")]
    Complete {
        kind: AssetKind,
        stats: SyncStats,
        duration_seconds: f64,
    },

    /// Errore generale
    #[serde(rename = "error")]
    Error {
        message: String,
        details: Option<String>,
    },
}

/// Configurazione per output JSON
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonConfig {
    pub workers: usize,
    pub max_tries: u32,
    pub overwrite: bool,
    pub platform: String,
    pub deterministic: bool,
}

impl JsonMessage {
    /// Emette il messaggio JSON su stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    pub fn start(app_id: &str, kind: AssetKind, total_assets: usize, config: &Config) -> Self {
        Self::Start {
            app_id: app_id.to_string(),
            kind,
            total_assets,
            config: JsonConfig::from(config),
        }
    }

    pub fn phase(kind: AssetKind, phase: &str, attempt: u32, jobs: usize, failed: usize) -> Self {
        Self::Phase {
            kind,
            phase: phase.to_string(),
            attempt,
            jobs,
            failed,
        }
    }

    pub fn complete(kind: AssetKind, stats: &SyncStats, duration_seconds: f64) -> Self {
        Self::Complete {
            kind,
            stats: stats.clone(),
            duration_seconds,
        }
    }

    /// Crea un messaggio di errore
    pub fn error(message: String, details: Option<String>) -> Self {
        Self::Error { message, details }
    }
}

impl From<&Config> for JsonConfig {
    fn from(config: &Config) -> Self {
        Self {
            workers: config.effective_workers(),
            max_tries: config.max_tries,
            overwrite: config.overwrite,
            platform: config.platform.clone(),
            deterministic: config.deterministic,
        }
    }
}
