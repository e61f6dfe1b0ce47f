// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Queue engine: owns the store, the worker pool and the background loops
// for the lifetime of the process.
//
// Lifecycle:
//   QueueEngine::open(...)   open the database (fatal on error)
//   engine.start()           spawn workers, sweeper, reaper
//   engine.client()          cheap handle for the HTTP layer
//   engine.shutdown().await  signal every loop and wait for it

use std::path::Path;
use std::sync::Arc;

use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tracing::{error, info};

use etikett_core::config::ServiceConfig;
use etikett_core::error::Result;
use etikett_core::types::{Job, JobId, NewJob, StatusCounts};

use crate::output::LabelOutput;
use crate::pool::WorkerPool;
use crate::reaper::StaleReaper;
use crate::retry::RetryPolicy;
use crate::status::{StatusAggregator, StatusReport};
use crate::store::JobStore;
use crate::sweeper::RetentionSweeper;
use crate::worker::DispatchWorker;

/// Tasks spawned by `start`.
struct Running {
    pool: WorkerPool,
    background: Vec<(&'static str, JoinHandle<()>)>,
}

/// The job queue and everything that drains it.
pub struct QueueEngine {
    config: ServiceConfig,
    store: JobStore,
    output: Arc<dyn LabelOutput>,
    wake: Arc<Notify>,
    shutdown: watch::Sender<bool>,
    running: Option<Running>,
}

impl QueueEngine {
    /// Open the store at `database_path` and prepare (but do not start)
    /// the engine.
    pub fn open(
        database_path: impl AsRef<Path>,
        config: &ServiceConfig,
        output: Arc<dyn LabelOutput>,
    ) -> Result<Self> {
        config.validate()?;
        let store = JobStore::open(database_path, config.busy_timeout())?;
        let (shutdown, _) = watch::channel(false);

        Ok(Self {
            config: config.clone(),
            store,
            output,
            wake: Arc::new(Notify::new()),
            shutdown,
            running: None,
        })
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Handle for submitting and inspecting jobs.
    pub fn client(&self) -> QueueClient {
        QueueClient {
            store: self.store.clone(),
            wake: Arc::clone(&self.wake),
        }
    }

    /// Spawn the worker pool, the retention sweeper and the stale reaper.
    ///
    /// Must be called from within a Tokio runtime.  Calling it twice is a
    /// no-op.
    pub fn start(&mut self) {
        if self.running.is_some() {
            return;
        }
        let policy = RetryPolicy::from(&self.config);
        let count = self.config.effective_worker_count();

        let workers = (0..count)
            .map(|index| {
                DispatchWorker::new(index, self.store.clone(), Arc::clone(&self.output), policy)
                    .with_idle_poll(self.config.idle_poll())
                    .with_wake(Arc::clone(&self.wake))
            })
            .collect();

        let rx = self.shutdown.subscribe();
        let pool = WorkerPool::spawn(workers, &rx);

        let sweeper = RetentionSweeper::new(
            self.store.clone(),
            self.config.retention(),
            self.config.sweep_interval(),
        );
        let reaper = StaleReaper::new(
            self.store.clone(),
            self.config.stale_after(),
            self.config.stale_check_interval(),
        );
        let background = vec![
            ("retention sweeper", tokio::spawn(sweeper.run(self.shutdown.subscribe()))),
            ("stale reaper", tokio::spawn(reaper.run(self.shutdown.subscribe()))),
        ];

        info!(
            workers = count,
            output = self.output.name(),
            max_attempts = policy.max_attempts,
            "queue engine started"
        );
        self.running = Some(Running { pool, background });
    }

    /// Stop every loop and wait for it to finish.  Jobs in flight complete
    /// their current output call first.
    pub async fn shutdown(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        info!("queue engine shutting down");
        self.shutdown.send_replace(true);

        running.pool.join().await;
        for (name, handle) in running.background {
            if let Err(e) = handle.await {
                error!(task = name, error = %e, "background task terminated abnormally");
            }
        }
        info!("queue engine stopped");
    }
}

/// Cloneable handle to the queue used by the interface layer.
#[derive(Debug, Clone)]
pub struct QueueClient {
    store: JobStore,
    wake: Arc<Notify>,
}

impl QueueClient {
    /// Store a new job and wake one idle worker.
    pub async fn enqueue(&self, job: NewJob) -> Result<JobId> {
        let id = self.store.blocking(move |s| s.enqueue(&job)).await?;
        self.wake.notify_one();
        Ok(id)
    }

    /// Validate and store a job from its raw parts.
    pub async fn submit(
        &self,
        label: impl Into<String>,
        content: impl Into<String>,
        metadata: etikett_core::types::Metadata,
    ) -> Result<JobId> {
        self.enqueue(NewJob::new(label, content, metadata)?).await
    }

    pub async fn counts(&self) -> Result<StatusCounts> {
        StatusAggregator::new(self.store.clone()).counts().await
    }

    pub async fn status(&self) -> Result<StatusReport> {
        StatusAggregator::new(self.store.clone()).report().await
    }

    pub async fn job(&self, job_id: JobId) -> Result<Option<Job>> {
        self.store.blocking(move |s| s.get_job(job_id)).await
    }
}
