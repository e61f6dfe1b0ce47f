// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Worker pool supervisor.
//
// The pool is sized once at startup and never grows or shrinks.  Each
// worker runs in its own Tokio task, so a worker that panics takes down
// only its own task; the rest keep draining the queue.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::worker::DispatchWorker;

/// A fixed set of running dispatch workers.
pub struct WorkerPool {
    handles: Vec<(usize, JoinHandle<()>)>,
}

impl WorkerPool {
    /// Spawn one task per worker, all watching the same shutdown flag.
    pub fn spawn(workers: Vec<DispatchWorker>, shutdown: &watch::Receiver<bool>) -> Self {
        let handles: Vec<_> = workers
            .into_iter()
            .map(|worker| {
                let index = worker.index();
                (index, tokio::spawn(worker.run(shutdown.clone())))
            })
            .collect();

        info!(workers = handles.len(), "worker pool started");
        Self { handles }
    }

    /// Wait for every worker to exit.  Panics are logged, not re-raised.
    pub async fn join(self) {
        for (index, handle) in self.handles {
            if let Err(e) = handle.await {
                error!(worker = index, error = %e, "dispatch worker terminated abnormally");
            }
        }
        info!("worker pool stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::output::output_from_config;
    use crate::retry::RetryPolicy;
    use crate::store::JobStore;
    use etikett_core::config::OutputConfig;

    #[tokio::test]
    async fn pool_starts_and_joins() {
        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::open(dir.path().join("q.db"), Duration::from_secs(5)).unwrap();
        let output = output_from_config(&OutputConfig::default());

        let workers = (0..3)
            .map(|i| {
                DispatchWorker::new(i, store.clone(), Arc::clone(&output), RetryPolicy::default())
                    .with_idle_poll(Duration::from_millis(10))
            })
            .collect();

        let (tx, rx) = watch::channel(false);
        let pool = WorkerPool::spawn(workers, &rx);
        assert_eq!(pool.handles.len(), 3);

        tokio::time::sleep(Duration::from_millis(30)).await;
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), pool.join())
            .await
            .expect("pool did not stop");
    }
}
