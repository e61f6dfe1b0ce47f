// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Retention sweeper: purge old terminal jobs on a fixed period.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{error, info};

use etikett_core::error::Result;

use crate::store::JobStore;

/// Background loop deleting `Done`/`Failed` jobs past the retention window.
pub struct RetentionSweeper {
    store: JobStore,
    retention: chrono::Duration,
    interval: Duration,
}

impl RetentionSweeper {
    pub fn new(store: JobStore, retention: chrono::Duration, interval: Duration) -> Self {
        Self {
            store,
            retention,
            interval,
        }
    }

    /// Purge once, right now.  Returns the number of rows removed.
    pub async fn sweep_once(&self) -> Result<usize> {
        let threshold = Utc::now() - self.retention;
        self.store
            .blocking(move |s| s.purge_older_than(threshold))
            .await
    }

    /// Sweep immediately, then every `interval`, until shutdown.
    /// A failed sweep is logged and retried on the next tick.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            retention_days = self.retention.num_days(),
            interval_secs = self.interval.as_secs(),
            "retention sweeper started"
        );

        while !*shutdown.borrow() {
            if let Err(e) = self.sweep_once().await {
                error!(error = %e, "retention sweep failed");
            }

            tokio::select! {
                _ = shutdown.changed() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!("retention sweeper stopped");
    }
}
