//! # Worker Pool Module
//!
//! Executor a concorrenza fissa per i job verso lo store remoto.
//!
//! ## Responsabilità:
//! - Coda di job riempita dal coordinatore prima di `start()`
//! - Al massimo N handler in esecuzione (semaforo)
//! - Ogni job eseguito esattamente una volta
//! - Un job che fallisce (o va in panic) viene loggato e registrato,
//!   senza bloccare gli altri: il pool si svuota sempre
//!
//! ## Esempio:
//! ```ignore
//! let mut pool = WorkerPool::new(config.effective_workers());
//! pool.enqueue(job);
//! let report = pool.start(|job| async move { execute(job).await }).await?;
//! info!("{} succeeded, {} failed", report.succeeded(), report.failed());
//! ```

use anyhow::Result;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error};

/// Result of one job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub description: String,
    pub error: Option<String>,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcomes of a drained pool, in enqueue order
#[derive(Debug, Clone, Default)]
pub struct PoolReport {
    pub outcomes: Vec<JobOutcome>,
}

impl PoolReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = &JobOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}

/// Fixed-concurrency executor isolating per-job failures
pub struct WorkerPool<J> {
    workers: usize,
    queue: Vec<J>,
}

impl<J> WorkerPool<J>
where
    J: fmt::Display + Send + 'static,
{
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            queue: Vec::new(),
        }
    }

    pub fn enqueue(&mut self, job: J) {
        self.queue.push(job);
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Esegue tutti i job in coda e ritorna quando ognuno è terminato
    pub async fn start<F, Fut>(self, handler: F) -> Result<PoolReport>
    where
        F: Fn(J) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let handler = Arc::new(handler);
        let mut tasks = Vec::with_capacity(self.queue.len());

        for job in self.queue {
            let permit = semaphore.clone().acquire_owned().await?;
            let description = job.to_string();
            let handler = Arc::clone(&handler);

            let task = tokio::spawn(async move {
                let _permit = permit; // released when the job ends
                let start_time = Instant::now();
                let result = handler(job).await;
                (result, start_time.elapsed())
            });
            tasks.push((description, task));
        }

        let mut report = PoolReport::default();
        for (description, task) in tasks {
            let error = match task.await {
                Ok((Ok(()), elapsed)) => {
                    debug!("Finished '{}' ({:.2} secs)", description, elapsed.as_secs_f64());
                    None
                }
                Ok((Err(e), elapsed)) => {
                    error!("Failed '{}' ({:.2} secs): {:#}", description, elapsed.as_secs_f64(), e);
                    Some(format!("{:#}", e))
                }
                Err(e) => {
                    error!("Job '{}' panicked: {}", description, e);
                    Some(e.to_string())
                }
            };
            report.outcomes.push(JobOutcome { description, error });
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Mutex;

    #[tokio::test]
    async fn test_every_job_runs_exactly_once() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut pool = WorkerPool::new(4);
        for job in 0..25u32 {
            pool.enqueue(job);
        }
        assert_eq!(pool.len(), 25);

        let seen_by_handler = Arc::clone(&seen);
        let report = pool
            .start(move |job| {
                let seen = Arc::clone(&seen_by_handler);
                async move {
                    seen.lock().await.push(job);
                    Ok(())
                }
            })
            .await
            .unwrap();

        let mut seen = seen.lock().await.clone();
        seen.sort_unstable();
        assert_eq!(seen, (0..25).collect::<Vec<_>>());
        assert_eq!(report.succeeded(), 25);
        assert_eq!(report.failed(), 0);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_siblings() {
        let executed = Arc::new(AtomicUsize::new(0));
        let mut pool = WorkerPool::new(2);
        for job in 0..10u32 {
            pool.enqueue(job);
        }

        let counter = Arc::clone(&executed);
        let report = pool
            .start(move |job| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    if job == 3 {
                        panic!("job {} blew up", job);
                    }
                    if job % 2 == 0 {
                        anyhow::bail!("job {} failed", job);
                    }
                    Ok(())
                }
            })
            .await
            .unwrap();

        assert_eq!(executed.load(Ordering::SeqCst), 10);
        assert_eq!(report.outcomes.len(), 10);
        // 0, 2, 4, 6, 8 return errors and 3 panics
        assert_eq!(report.failed(), 6);
        assert_eq!(report.succeeded(), 4);
        let failed: Vec<&str> = report.failures().map(|o| o.description.as_str()).collect();
        assert_eq!(failed, vec!["0", "2", "3", "4", "6", "8"]);
        assert!(report.outcomes[2].error.as_deref().unwrap().contains("job 2 failed"));
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));
        let mut pool = WorkerPool::new(3);
        for job in 0..12u32 {
            pool.enqueue(job);
        }

        let (in_flight_h, max_seen_h) = (Arc::clone(&in_flight), Arc::clone(&max_seen));
        pool.start(move |_job| {
            let in_flight = Arc::clone(&in_flight_h);
            let max_seen = Arc::clone(&max_seen_h);
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await
        .unwrap();

        assert!(max_seen.load(Ordering::SeqCst) <= 3);
        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_single_worker_keeps_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut pool = WorkerPool::new(0); // clamped to one worker
        for job in ["c", "a", "b"] {
            pool.enqueue(job.to_string());
        }

        let seen_by_handler = Arc::clone(&seen);
        pool.start(move |job| {
            let seen = Arc::clone(&seen_by_handler);
            async move {
                seen.lock().await.push(job);
                Ok(())
            }
        })
        .await
        .unwrap();

        assert_eq!(*seen.lock().await, vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn test_empty_pool_drains_immediately() {
        let pool: WorkerPool<u32> = WorkerPool::new(4);
        assert!(pool.is_empty());
        let report = pool.start(|_job| async { Ok(()) }).await.unwrap();
        assert!(report.outcomes.is_empty());
    }
}
