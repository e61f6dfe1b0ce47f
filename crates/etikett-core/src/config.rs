// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EtikettError, Result};

/// Which printer transport the dispatch workers feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputConfig {
    /// ESC/POS over raw TCP (JetDirect).
    Network {
        host: String,
        port: u16,
        timeout_secs: u64,
    },
    /// TSPL written to a local character device (USB printer class).
    Device { path: PathBuf, timeout_secs: u64 },
}

impl OutputConfig {
    pub fn timeout(&self) -> Duration {
        match self {
            Self::Network { timeout_secs, .. } | Self::Device { timeout_secs, .. } => {
                Duration::from_secs(*timeout_secs)
            }
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::Network {
            host: "192.168.1.100".into(),
            port: 9100,
            timeout_secs: 10,
        }
    }
}

/// Persistent service settings.
///
/// Every field has a default so a partial JSON file is enough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// SQLite database file.  `None` resolves to `print_queue.db` inside the
    /// data directory.
    pub database_path: Option<PathBuf>,
    /// Listen address for the HTTP interface.
    pub http_bind: String,
    /// Number of dispatch workers.  `None` uses the host's available
    /// parallelism.
    pub worker_count: Option<usize>,
    /// Failed attempts after which a job becomes `Failed`.
    pub max_attempts: u32,
    /// How long an idle worker waits before polling again.
    pub idle_poll_ms: u64,
    /// Pause a worker takes after a failed job.
    pub failure_pause_ms: u64,
    /// Minimum age of a terminal job before it is purged.
    pub retention_days: u32,
    pub sweep_interval_secs: u64,
    /// Age after which a `Processing` claim is considered orphaned.
    pub stale_after_secs: u64,
    pub stale_check_secs: u64,
    /// SQLite busy timeout applied to every connection.
    pub busy_timeout_ms: u64,
    pub output: OutputConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            http_bind: "0.0.0.0:8000".into(),
            worker_count: None,
            max_attempts: 3,
            idle_poll_ms: 1_000,
            failure_pause_ms: 5_000,
            retention_days: 7,
            sweep_interval_secs: 24 * 3600,
            stale_after_secs: 600,
            stale_check_secs: 300,
            busy_timeout_ms: 5_000,
            output: OutputConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(EtikettError::Config("max_attempts must be at least 1".into()));
        }
        if self.worker_count == Some(0) {
            return Err(EtikettError::Config("worker_count must be at least 1".into()));
        }
        if self.retention_days == 0 {
            return Err(EtikettError::Config("retention_days must be at least 1".into()));
        }
        let timeout_secs = self.output.timeout().as_secs();
        if self.stale_after_secs <= timeout_secs {
            return Err(EtikettError::Config(format!(
                "stale_after_secs ({}) must exceed the output timeout ({timeout_secs}s)",
                self.stale_after_secs
            )));
        }
        Ok(())
    }

    /// Effective pool size: the configured count, or one worker per
    /// available processing unit (minimum 1).
    pub fn effective_worker_count(&self) -> usize {
        self.worker_count
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            })
            .max(1)
    }

    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }

    pub fn failure_pause(&self) -> Duration {
        Duration::from_millis(self.failure_pause_ms)
    }

    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.retention_days))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn stale_after(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.stale_after_secs as i64)
    }

    pub fn stale_check_interval(&self) -> Duration {
        Duration::from_secs(self.stale_check_secs)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}
