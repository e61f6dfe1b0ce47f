// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Status aggregator: read-only queue depth per status.

use serde::{Deserialize, Serialize};

use etikett_core::error::Result;
use etikett_core::types::StatusCounts;

use crate::store::JobStore;

/// Queue depth as reported to HTTP callers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub pending_jobs: u64,
    pub processing_jobs: u64,
    pub failed_jobs: u64,
    pub done_jobs: u64,
}

impl From<StatusCounts> for StatusReport {
    fn from(counts: StatusCounts) -> Self {
        Self {
            pending_jobs: counts.pending,
            processing_jobs: counts.processing,
            failed_jobs: counts.failed,
            done_jobs: counts.done,
        }
    }
}

/// Stateless view over the store.
#[derive(Debug, Clone)]
pub struct StatusAggregator {
    store: JobStore,
}

impl StatusAggregator {
    pub fn new(store: JobStore) -> Self {
        Self { store }
    }

    pub async fn counts(&self) -> Result<StatusCounts> {
        self.store.blocking(|s| s.count_by_status()).await
    }

    pub async fn report(&self) -> Result<StatusReport> {
        self.counts().await.map(StatusReport::from)
    }
}
