// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Etikett label print queue.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EtikettError, Result};

/// Opaque key/value metadata attached to a job.
///
/// The queue never looks inside; only the output collaborator interprets it
/// (see [`crate::LabelSettings`]).
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Unique identifier for a print job, assigned by the store on insertion.
///
/// Identifiers increase monotonically and double as the tie-break when two
/// jobs share a creation timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub i64);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle states of a print job.
///
/// `Pending -> Processing -> {Done, Pending (retry), Failed}`.  `Done` and
/// `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Queued, waiting to be claimed by a worker.
    Pending,
    /// Claimed by exactly one worker and being sent to the printer.
    Processing,
    /// Every requested copy was sent.
    Done,
    /// Retry ceiling reached.
    Failed,
}

impl JobStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [JobStatus; 4] = [
        JobStatus::Pending,
        JobStatus::Processing,
        JobStatus::Done,
        JobStatus::Failed,
    ];

    /// The value stored in the `status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Whether no further processing transition can occur.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = EtikettError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "done" => Ok(Self::Done),
            "failed" => Ok(Self::Failed),
            other => Err(EtikettError::Database(format!("unknown job status {other:?}"))),
        }
    }
}

/// A validated print request that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewJob {
    pub label: String,
    pub content: String,
    pub metadata: Metadata,
}

impl NewJob {
    /// Build a print request, rejecting an empty barcode payload.
    pub fn new(label: impl Into<String>, content: impl Into<String>, metadata: Metadata) -> Result<Self> {
        let content = content.into();
        if content.is_empty() {
            return Err(EtikettError::Validation("Missing content field.".into()));
        }
        Ok(Self {
            label: label.into(),
            content,
            metadata,
        })
    }
}

/// A stored print job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    /// Human-readable text printed above the barcode; may be empty.
    pub label: String,
    /// Barcode payload.
    pub content: String,
    pub status: JobStatus,
    /// Number of failed dispatch attempts so far.
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
    /// When the current (or last) claim was taken.  `None` until first claimed.
    pub claimed_at: Option<DateTime<Utc>>,
    pub metadata: Metadata,
}

/// Per-status job counts.
///
/// A snapshot taken without a transaction; counts may lag concurrent writers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: u64,
    pub processing: u64,
    pub done: u64,
    pub failed: u64,
}

impl StatusCounts {
    /// Record `count` jobs in `status`.
    pub fn set(&mut self, status: JobStatus, count: u64) {
        match status {
            JobStatus::Pending => self.pending = count,
            JobStatus::Processing => self.processing = count,
            JobStatus::Done => self.done = count,
            JobStatus::Failed => self.failed = count,
        }
    }

    pub fn get(&self, status: JobStatus) -> u64 {
        match status {
            JobStatus::Pending => self.pending,
            JobStatus::Processing => self.processing,
            JobStatus::Done => self.done,
            JobStatus::Failed => self.failed,
        }
    }
}
