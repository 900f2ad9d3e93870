//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce il feedback visivo e le statistiche di sincronizzazione.
//!
//! ## Responsabilità:
//! - Spinner con `indicatif` per le attese lunghe (attivazione lingue,
//!   processing remoto, ordinamento)
//! - Tracking delle statistiche di una sincronizzazione
//! - Report finale su una riga
//!
//! ## Statistiche tracciate:
//! - **deleted**: Asset remoti cancellati (solo con overwrite)
//! - **locales_activated**: Lingue attivate sullo store
//! - **uploaded**: Upload andati a buon fine
//! - **duplicates_skipped**: Asset già presenti (stesso checksum)
//! - **over_limit_skipped**: Asset oltre il limite per device set
//! - **invalid_skipped**: Asset che non superano più la validazione
//! - **failed_jobs**: Job falliti nel pool
//! - **reordered_sets**: Device set riordinati
//! - **upload_attempts**: Tentativi di upload consumati
//!
//! ## Esempio:
//! ```ignore
//! let spinner = ProgressManager::spinner_for(config.json_output, "Waiting for processing...");
//! // ...
//! spinner.finish_and_clear();
//! println!("{}", stats.format_summary());
//! ```

use crate::device::AssetKind;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::time::Duration;

/// Spinner factory
pub struct ProgressManager;

impl ProgressManager {
    /// Create a spinner for indeterminate progress
    pub fn spinner(message: &str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();

        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed}] {msg}") {
            spinner.set_style(style);
        }

        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));

        spinner
    }

    /// Spinner nascosto quando l'output è JSON
    pub fn spinner_for(json_output: bool, message: &str) -> ProgressBar {
        if json_output {
            ProgressBar::hidden()
        } else {
            Self::spinner(message)
        }
    }
}

/// Statistics of one sync run for one asset kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    pub kind: Option<AssetKind>,
    pub deleted: usize,
    pub locales_activated: usize,
    pub uploaded: usize,
    pub duplicates_skipped: usize,
    pub over_limit_skipped: usize,
    pub invalid_skipped: usize,
    pub failed_jobs: usize,
    pub reordered_sets: usize,
    pub upload_attempts: u32,
}

impl SyncStats {
    pub fn new(kind: AssetKind) -> Self {
        Self {
            kind: Some(kind),
            ..Default::default()
        }
    }

    /// Accumula le statistiche di un'altra run
    pub fn merge(&mut self, other: &SyncStats) {
        self.deleted += other.deleted;
        self.locales_activated += other.locales_activated;
        self.uploaded += other.uploaded;
        self.duplicates_skipped += other.duplicates_skipped;
        self.over_limit_skipped += other.over_limit_skipped;
        self.invalid_skipped += other.invalid_skipped;
        self.failed_jobs += other.failed_jobs;
        self.reordered_sets += other.reordered_sets;
        self.upload_attempts += other.upload_attempts;
    }

    pub fn format_summary(&self) -> String {
        let label = self.kind.map(|kind| kind.label()).unwrap_or("assets");
        format!(
            "{}: Uploaded: {} | Duplicates: {} | Over limit: {} | Invalid: {} | Deleted: {} | Languages activated: {} | Reordered sets: {} | Failed jobs: {} | Attempts: {}",
            label,
            self.uploaded,
            self.duplicates_skipped,
            self.over_limit_skipped,
            self.invalid_skipped,
            self.deleted,
            self.locales_activated,
            self.reordered_sets,
            self.failed_jobs,
            self.upload_attempts
        )
    }
}
