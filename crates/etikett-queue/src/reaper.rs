// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stale claim reaper.
//
// A worker that dies between claim and report leaves its job in
// `Processing` forever.  The reaper returns any claim older than
// `stale_after` to `Pending`, once at startup and then periodically.
// `stale_after` must comfortably exceed the longest possible dispatch
// (quantity x output timeout), or a slow job may be printed twice.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{error, info};

use etikett_core::error::Result;

use crate::store::JobStore;

pub struct StaleReaper {
    store: JobStore,
    stale_after: chrono::Duration,
    interval: Duration,
}

impl StaleReaper {
    pub fn new(store: JobStore, stale_after: chrono::Duration, interval: Duration) -> Self {
        Self {
            store,
            stale_after,
            interval,
        }
    }

    /// Requeue stale claims now.  Returns how many jobs went back to `Pending`.
    pub async fn reap_once(&self) -> Result<usize> {
        let older_than = Utc::now() - self.stale_after;
        self.store
            .blocking(move |s| s.requeue_stale(older_than))
            .await
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            stale_after_secs = self.stale_after.num_seconds(),
            interval_secs = self.interval.as_secs(),
            "stale reaper started"
        );

        while !*shutdown.borrow() {
            if let Err(e) = self.reap_once().await {
                error!(error = %e, "stale claim check failed");
            }

            tokio::select! {
                _ = shutdown.changed() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!("stale reaper stopped");
    }
}
