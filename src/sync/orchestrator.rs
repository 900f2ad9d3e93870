//! # Sync Orchestrator Module
//!
//! Coordina la sincronizzazione di un kind di asset con lo store remoto.
//!
//! ## Responsabilità:
//! - Verifica le precondizioni (asset locali, versione modificabile)
//! - Cancella gli asset remoti delle lingue locali (solo con overwrite)
//! - Attiva le lingue mancanti, una alla volta
//! - Carica gli asset nuovi, saltando i duplicati per checksum
//! - Attende il processing remoto e ritenta fino a `max_tries`
//! - Ordina ogni device set per nome file
//!
//! ## Flusso:
//! ```text
//! precondizioni → delete* → attivazione lingue → upload → poll ─┐
//!                                                   ↑   retry ──┘
//!                                                   └→ reorder
//! ```
//!
//! Tutti i job remoti passano dal `WorkerPool`: il fallimento di un singolo
//! job non interrompe la fase, la convergenza viene verificata rileggendo
//! lo stato remoto.

use super::iterator::RemoteCollection;
use super::jobs::{self, Job};
use super::pool::{PoolReport, WorkerPool};
use crate::config::Config;
use crate::device::AssetKind;
use crate::error::SyncError;
use crate::file_manager::FileManager;
use crate::json_output::JsonMessage;
use crate::media::{DimensionProbe, LocalAsset, MediaProbe};
use crate::progress::{ProgressManager, SyncStats};
use crate::remote::{AppVersion, AssetStore, Localization, ProcessingState, RemoteAsset};
use anyhow::{Context, Result};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Massimo numero di asset caricati per device set
pub const MAX_ASSETS_PER_SET: usize = 3;

/// Remote assets counted per processing state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateTally(BTreeMap<ProcessingState, usize>);

impl StateTally {
    pub fn from_assets<'a>(assets: impl IntoIterator<Item = &'a RemoteAsset>) -> Self {
        let mut counts = BTreeMap::new();
        for asset in assets {
            *counts.entry(asset.state).or_insert(0) += 1;
        }
        Self(counts)
    }

    pub fn count(&self, state: ProcessingState) -> usize {
        self.0.get(&state).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    /// Asset non ancora COMPLETE
    pub fn incomplete(&self) -> usize {
        self.total() - self.count(ProcessingState::Complete)
    }
}

impl fmt::Display for StateTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(state, count)| format!("{}: {}", state, count)).collect();
        if parts.is_empty() {
            f.write_str("no assets")
        } else {
            f.write_str(&parts.join(", "))
        }
    }
}

/// Drives one sync run per asset kind against an `AssetStore`
pub struct SyncOrchestrator<S> {
    store: Arc<S>,
    config: Config,
    app_id: String,
    probe: Arc<dyn DimensionProbe>,
}

impl<S> SyncOrchestrator<S>
where
    S: AssetStore + 'static,
{
    pub fn new(store: Arc<S>, config: Config, app_id: impl Into<String>) -> Self {
        Self {
            store,
            config,
            app_id: app_id.into(),
            probe: Arc::new(MediaProbe),
        }
    }

    /// Sostituisce la lettura delle dimensioni usata per rivalidare gli asset prima dell'upload
    pub fn with_probe(mut self, probe: Arc<dyn DimensionProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Sincronizza gli asset locali di un kind
    pub async fn run(&self, kind: AssetKind, assets: &[LocalAsset]) -> Result<SyncStats> {
        let start_time = Instant::now();
        let mut stats = SyncStats::new(kind);

        if self.is_skipped(kind) {
            info!("Skipping {}s", kind);
            return Ok(stats);
        }

        let assets: Vec<LocalAsset> = assets.iter().filter(|asset| asset.kind == kind).cloned().collect();
        if assets.is_empty() {
            info!("No local {}s found, nothing to upload", kind);
            return Ok(stats);
        }

        if self.config.edit_live {
            info!("Live versions cannot be edited, skipping {}s", kind);
            return Ok(stats);
        }

        let version = self
            .store
            .fetch_edit_version(&self.config.platform)
            .await?
            .ok_or_else(|| SyncError::NoEditableVersion {
                app: self.app_id.clone(),
                platform: self.config.platform.clone(),
            })?;

        if self.config.json_output {
            JsonMessage::start(&self.app_id, kind, assets.len(), &self.config).emit();
        }
        info!(
            "Will begin uploading {} {}s for version {}",
            assets.len(),
            kind,
            version.version_string
        );

        let by_language = group_by_language(&assets);
        let mut localizations = self.store.fetch_localizations(&version).await?;

        if self.config.overwrite {
            let collection = self.collection(kind, &localizations, &by_language);
            self.delete_all(&collection, &mut stats).await?;
        }

        stats.locales_activated = self.activate_locales(&version, &by_language, &localizations).await?;
        if stats.locales_activated > 0 {
            localizations = self.store.fetch_localizations(&version).await?;
        }

        let collection = self.collection(kind, &localizations, &by_language);
        self.upload_until_converged(&collection, &by_language, &mut stats).await?;
        self.reorder_sets(&collection, &mut stats).await?;

        info!("{}", stats.format_summary());
        if self.config.json_output {
            JsonMessage::complete(kind, &stats, start_time.elapsed().as_secs_f64()).emit();
        }
        Ok(stats)
    }

    fn is_skipped(&self, kind: AssetKind) -> bool {
        match kind {
            AssetKind::Screenshot => self.config.skip_screenshots,
            AssetKind::Preview => self.config.skip_previews,
        }
    }

    /// Collezione limitata alle localization delle lingue locali
    fn collection(
        &self,
        kind: AssetKind,
        localizations: &[Localization],
        by_language: &BTreeMap<String, Vec<LocalAsset>>,
    ) -> RemoteCollection<S> {
        let targeted = localizations
            .iter()
            .filter(|localization| by_language.contains_key(&localization.locale))
            .cloned()
            .collect();
        RemoteCollection::new(Arc::clone(&self.store), kind, targeted, self.config.effective_workers())
    }

    async fn delete_all(&self, collection: &RemoteCollection<S>, stats: &mut SyncStats) -> Result<()> {
        let kind = collection.kind();
        info!("Deleting all {}s for the local languages...", kind);

        let mut tries_left = self.config.max_tries;
        let mut attempt = 0;
        loop {
            attempt += 1;
            tries_left = tries_left.saturating_sub(1);

            let mut pool = WorkerPool::new(self.config.effective_workers());
            for (localization, set, asset) in collection.collect_assets().await? {
                pool.enqueue(Job::Delete {
                    asset,
                    locale: localization.locale,
                    display_type: set.display_type,
                });
            }
            let report = self.drain(pool).await?;
            stats.deleted += report.succeeded();
            stats.failed_jobs += report.failed();
            self.emit_phase(kind, "delete", attempt, &report);

            let remaining = collection.collect_assets().await?.len();
            if remaining == 0 {
                info!("Successfully deleted all {}s", kind);
                return Ok(());
            }
            if tries_left == 0 {
                error!("Failed to delete all {}s, {} still exist", kind, remaining);
                return Err(SyncError::DeleteNotConverged { remaining }.into());
            }
            warn!(
                "Failed to delete all {}s ({} remaining), tries remaining: {}",
                kind, remaining, tries_left
            );
        }
    }

    /// Crea in sequenza le localization mancanti
    async fn activate_locales(
        &self,
        version: &AppVersion,
        by_language: &BTreeMap<String, Vec<LocalAsset>>,
        localizations: &[Localization],
    ) -> Result<usize> {
        let remote: HashSet<&str> = localizations.iter().map(|l| l.locale.as_str()).collect();
        let missing: Vec<&str> = by_language
            .keys()
            .map(String::as_str)
            .filter(|locale| !remote.contains(locale))
            .collect();
        if missing.is_empty() {
            return Ok(0);
        }

        let plural = if missing.len() == 1 { "" } else { "s" };
        let spinner = ProgressManager::spinner_for(
            self.config.json_output,
            &format!("Activating language{} {}...", plural, missing.join(", ")),
        );
        let result: Result<()> = async {
            for locale in &missing {
                self.store
                    .create_localization(version, locale)
                    .await
                    .with_context(|| format!("Failed to activate language {}", locale))?;
            }
            Ok(())
        }
        .await;
        spinner.finish_and_clear();
        result?;

        info!("Activated language{} {}", plural, missing.join(", "));
        Ok(missing.len())
    }

    async fn upload_until_converged(
        &self,
        collection: &RemoteCollection<S>,
        by_language: &BTreeMap<String, Vec<LocalAsset>>,
        stats: &mut SyncStats,
    ) -> Result<()> {
        let kind = collection.kind();

        let mut tries_left = self.config.max_tries;
        let mut attempt = 0;
        loop {
            attempt += 1;
            tries_left = tries_left.saturating_sub(1);
            stats.upload_attempts = attempt;

            let expected = self.upload_pending(collection, by_language, attempt, stats).await?;
            let tally = self.wait_for_processing(collection).await?;
            self.emit_tally(kind, attempt, &tally);

            if tally.count(ProcessingState::Failed) == 0 && tally.total() == expected {
                info!("Successfully uploaded all {}s", kind);
                return Ok(());
            }
            if tries_left == 0 {
                error!("Failed to upload all {}s ({})", kind, tally);
                return Err(SyncError::UploadNotConverged {
                    incomplete: tally.incomplete(),
                }
                .into());
            }
            warn!(
                "Failed to upload all {}s ({}, expected {}), tries remaining: {}",
                kind, tally, expected, tries_left
            );
            self.delete_incomplete(collection, attempt, stats).await?;
        }
    }

    /// Accoda gli upload mancanti e ritorna il numero di asset attesi sullo store
    async fn upload_pending(
        &self,
        collection: &RemoteCollection<S>,
        by_language: &BTreeMap<String, Vec<LocalAsset>>,
        attempt: u32,
        stats: &mut SyncStats,
    ) -> Result<usize> {
        let kind = collection.kind();
        let first_attempt = attempt == 1;
        let placements = collection.local_placements(by_language).await?;

        let mut pool = WorkerPool::new(self.config.effective_workers());
        let mut queued: HashSet<(String, String)> = HashSet::new();
        let mut expected = 0;

        for placement in placements {
            let path = &placement.asset.path;
            if placement.index >= MAX_ASSETS_PER_SET {
                if first_attempt {
                    warn!(
                        "Too many {}s found for device '{}' in '{}', skipping {}",
                        kind,
                        placement.set.set.display_type,
                        placement.localization.locale,
                        path.display()
                    );
                    stats.over_limit_skipped += 1;
                }
                continue;
            }

            // the file may have changed since discovery
            let valid = {
                let probe = Arc::clone(&self.probe);
                let asset = placement.asset.clone();
                tokio::task::spawn_blocking(move || asset.is_valid(probe.as_ref())).await?
            };
            if !valid {
                if first_attempt {
                    warn!(
                        "{} '{}' no longer matches {}, skipping",
                        kind,
                        path.display(),
                        placement.asset.screen_size
                    );
                    stats.invalid_skipped += 1;
                }
                continue;
            }

            let checksum = FileManager::checksum(path).await?;
            if !queued.insert((placement.set.set.id.clone(), checksum.clone())) {
                if first_attempt {
                    info!("Duplicate content in this batch, skipping '{}'", path.display());
                    stats.duplicates_skipped += 1;
                }
                continue;
            }

            expected += 1;
            if placement.set.contains_checksum(&checksum) {
                if first_attempt {
                    info!("Previously uploaded, skipping '{}'", path.display());
                    stats.duplicates_skipped += 1;
                }
                continue;
            }

            debug!("Queued upload job for {}", path.display());
            pool.enqueue(Job::Upload {
                set: placement.set.set,
                path: placement.asset.path,
            });
        }

        if !pool.is_empty() {
            info!("Uploading {} {}s...", pool.len(), kind);
        }
        let report = self.drain(pool).await?;
        stats.uploaded += report.succeeded();
        stats.failed_jobs += report.failed();
        self.emit_phase(kind, "upload", attempt, &report);

        Ok(expected)
    }

    /// Rilegge lo stato remoto finché nessun asset è UPLOAD_COMPLETE
    async fn wait_for_processing(&self, collection: &RemoteCollection<S>) -> Result<StateTally> {
        let kind = collection.kind();
        let spinner = ProgressManager::spinner_for(
            self.config.json_output,
            &format!("Waiting for all the {}s to be processed...", kind),
        );

        let result: Result<StateTally> = async {
            loop {
                let assets = collection.collect_assets().await?;
                let tally = StateTally::from_assets(assets.iter().map(|(_, _, asset)| asset));
                if tally.count(ProcessingState::UploadComplete) == 0 {
                    return Ok(tally);
                }
                debug!("There are still incomplete {}s - {}", kind, tally);
                tokio::time::sleep(self.config.poll_interval()).await;
            }
        }
        .await;

        spinner.finish_and_clear();
        result
    }

    /// Cancella gli asset non COMPLETE prima di un nuovo tentativo
    async fn delete_incomplete(
        &self,
        collection: &RemoteCollection<S>,
        attempt: u32,
        stats: &mut SyncStats,
    ) -> Result<()> {
        let mut pool = WorkerPool::new(self.config.effective_workers());
        for (localization, set, asset) in collection.collect_assets().await? {
            if !asset.is_complete() {
                pool.enqueue(Job::Delete {
                    asset,
                    locale: localization.locale,
                    display_type: set.display_type,
                });
            }
        }

        let report = self.drain(pool).await?;
        stats.failed_jobs += report.failed();
        self.emit_phase(collection.kind(), "cleanup", attempt, &report);
        Ok(())
    }

    /// Ordina i device set per nome file, solo dove l'ordine differisce
    async fn reorder_sets(&self, collection: &RemoteCollection<S>, stats: &mut SyncStats) -> Result<()> {
        let kind = collection.kind();
        let mut pool = WorkerPool::new(self.config.effective_workers());
        for (_, remote_set) in collection.collect_device_sets().await? {
            let target = remote_set.sorted_asset_ids();
            if target != remote_set.asset_ids() {
                pool.enqueue(Job::Reorder {
                    set: remote_set.set,
                    asset_ids: target,
                });
            }
        }

        if pool.is_empty() {
            debug!("All {} sets are already sorted", kind);
            return Ok(());
        }

        let spinner = ProgressManager::spinner_for(self.config.json_output, &format!("Sorting {}s uploaded...", kind));
        let report = self.drain(pool).await;
        spinner.finish_and_clear();
        let report = report?;

        stats.reordered_sets += report.succeeded();
        stats.failed_jobs += report.failed();
        self.emit_phase(kind, "reorder", 1, &report);
        Ok(())
    }

    async fn drain(&self, pool: WorkerPool<Job>) -> Result<PoolReport> {
        let store = Arc::clone(&self.store);
        pool.start(move |job| {
            let store = Arc::clone(&store);
            async move { jobs::execute(store.as_ref(), job).await }
        })
        .await
    }

    fn emit_phase(&self, kind: AssetKind, phase: &str, attempt: u32, report: &PoolReport) {
        if self.config.json_output {
            JsonMessage::phase(kind, phase, attempt, report.outcomes.len(), report.failed()).emit();
        }
    }

    fn emit_tally(&self, kind: AssetKind, attempt: u32, tally: &StateTally) {
        if self.config.json_output {
            JsonMessage::phase(kind, "poll", attempt, tally.total(), tally.count(ProcessingState::Failed)).emit();
        }
    }
}

/// Raggruppa gli asset per lingua, in ordine deterministico
fn group_by_language(assets: &[LocalAsset]) -> BTreeMap<String, Vec<LocalAsset>> {
    let mut by_language: BTreeMap<String, Vec<LocalAsset>> = BTreeMap::new();
    for asset in assets {
        by_language.entry(asset.language.clone()).or_default().push(asset.clone());
    }
    by_language
}
