//! # Store Media Sync - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Merge della configurazione (file JSON + flag CLI) e validazione
//! - Discovery dei file locali e avvio dell'orchestratore per ogni kind
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI (app id, cartelle media, workers, etc.)
//! 2. Configura il logging (INFO o DEBUG a seconda del flag verbose, `RUST_LOG` se presente)
//! 3. Carica la configurazione e applica i flag
//! 4. Apre lo store remoto
//! 5. Per screenshot e preview: discovery, sincronizzazione, salvataggio dello store
//!
//! ## Esempio di utilizzo:
//! ```bash
//! media-sync com.example.app --screenshots-path ./screenshots --overwrite --workers 4
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use store_media_sync::json_output::JsonMessage;
use store_media_sync::{AssetKind, Config, FileManager, MediaProbe, SnapshotStore, SyncError, SyncOrchestrator, SyncStats};

#[derive(Parser)]
#[command(name = "media-sync")]
#[command(about = "Upload screenshots and app previews to the app store, skipping what is already there")]
struct Args {
    /// Application identifier on the store
    app_id: String,

    /// Directory with one folder per language containing screenshots
    #[arg(long)]
    screenshots_path: Option<PathBuf>,

    /// Directory with one folder per language containing app previews
    #[arg(long)]
    previews_path: Option<PathBuf>,

    /// Delete the remote assets of the local languages before uploading
    #[arg(long)]
    overwrite: bool,

    /// Number of parallel workers (max 10)
    #[arg(short, long, env = "MEDIA_SYNC_WORKERS")]
    workers: Option<usize>,

    /// Use a single worker
    #[arg(long)]
    deterministic: bool,

    /// Attempts for the delete and upload phases
    #[arg(long)]
    max_tries: Option<u32>,

    /// Seconds between two checks of the remote processing state
    #[arg(long)]
    poll_interval: Option<u64>,

    #[arg(long)]
    skip_screenshots: bool,

    #[arg(long)]
    skip_previews: bool,

    /// Target the live version (it cannot be edited, nothing is uploaded)
    #[arg(long)]
    edit_live: bool,

    /// Accept any language folder name
    #[arg(long)]
    ignore_language_directory_validation: bool,

    /// Platform of the version to edit (ios, osx, appletvos)
    #[arg(long)]
    platform: Option<String>,

    /// Store catalog file (default: ~/.media-sync/store_<hash>.json)
    #[arg(long)]
    store: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output progress and results as JSON lines
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let json_output = args.json;
    let result = run(args).await;
    if let Err(ref e) = result {
        if json_output {
            JsonMessage::error(e.to_string(), Some(format!("{:#}", e))).emit();
        }
    }
    result
}

async fn run(args: Args) -> Result<()> {
    let mut config = match args.config {
        Some(ref path) => Config::from_file(path).await?,
        None => Config::default(),
    };
    apply_args(&mut config, &args);
    config.validate()?;

    if config.screenshots_path.is_none() && config.previews_path.is_none() {
        return Err(SyncError::InvalidConfig(
            "Nothing to sync, pass --screenshots-path and/or --previews-path".to_string(),
        )
        .into());
    }

    let store_path = match args.store {
        Some(ref path) => path.clone(),
        None => SnapshotStore::default_path(&args.app_id)?,
    };
    let store = Arc::new(SnapshotStore::open(&store_path, &args.app_id, &config.platform).await?);
    info!("Using store catalog {}", store_path.display());

    let orchestrator = SyncOrchestrator::new(Arc::clone(&store), config.clone(), args.app_id.as_str());
    let mut total = SyncStats::default();

    let sources = [
        (AssetKind::Screenshot, config.screenshots_path.clone(), config.skip_screenshots),
        (AssetKind::Preview, config.previews_path.clone(), config.skip_previews),
    ];
    for (kind, root, skipped) in sources {
        let Some(root) = root else { continue };
        if skipped {
            info!("Skipping {}s", kind);
            continue;
        }

        let ignore_validation = config.ignore_language_directory_validation;
        let assets = tokio::task::spawn_blocking(move || {
            FileManager::collect_assets(&root, kind, ignore_validation, &MediaProbe)
        })
        .await??;
        info!("Found {} {}s", assets.len(), kind);

        let result = orchestrator.run(kind, &assets).await;
        store.save().await?;
        total.merge(&result?);
    }

    if !config.json_output {
        println!("{}", total.format_summary());
    }
    Ok(())
}

/// I flag CLI hanno la precedenza sul file di configurazione
fn apply_args(config: &mut Config, args: &Args) {
    if let Some(ref path) = args.screenshots_path {
        config.screenshots_path = Some(path.clone());
    }
    if let Some(ref path) = args.previews_path {
        config.previews_path = Some(path.clone());
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(max_tries) = args.max_tries {
        config.max_tries = max_tries;
    }
    if let Some(poll_interval) = args.poll_interval {
        config.poll_interval_secs = poll_interval;
    }
    if let Some(ref platform) = args.platform {
        config.platform = platform.clone();
    }

    config.overwrite |= args.overwrite;
    config.deterministic |= args.deterministic;
    config.skip_screenshots |= args.skip_screenshots;
    config.skip_previews |= args.skip_previews;
    config.edit_live |= args.edit_live;
    config.ignore_language_directory_validation |= args.ignore_language_directory_validation;
    config.json_output |= args.json;
}
