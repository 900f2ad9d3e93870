//! # Sync Module
//!
//! Questo modulo coordina la sincronizzazione con lo store remoto.
//!
//! ## Architettura:
//! - `pool`: Worker pool a concorrenza fissa
//! - `jobs`: Job remoti (delete, upload, reorder)
//! - `iterator`: Enumerazione dello stato remoto e join con i file locali
//! - `orchestrator`: Fasi della sincronizzazione con retry e polling

pub mod iterator;
pub mod jobs;
pub mod orchestrator;
pub mod pool;

pub use iterator::{Placement, RemoteCollection};
pub use jobs::Job;
pub use orchestrator::{StateTally, SyncOrchestrator, MAX_ASSETS_PER_SET};
pub use pool::{JobOutcome, PoolReport, WorkerPool};
