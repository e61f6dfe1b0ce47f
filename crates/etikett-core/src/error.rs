// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Etikett.

use thiserror::Error;

use crate::types::JobId;

/// Top-level error type for all Etikett operations.
#[derive(Debug, Error)]
pub enum EtikettError {
    // -- Intake --
    #[error("invalid print request: {0}")]
    Validation(String),

    // -- Storage / persistence --
    #[error("database error: {0}")]
    Database(String),

    #[error("job {0} is not held in processing")]
    NotClaimed(JobId),

    // -- Output --
    #[error("label dispatch failed: {0}")]
    Dispatch(String),

    #[error("job {job_id} failed permanently after {attempts} attempts")]
    Exhausted { job_id: JobId, attempts: u32 },

    // -- Process --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP server error: {0}")]
    Server(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, EtikettError>;
