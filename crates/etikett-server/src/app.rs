// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP routes.
//
//   GET  /health                   liveness
//   POST /print/barcodes           enqueue a label
//   GET  /status/print-barcodes    queue depth per status
//   GET  /jobs/:id                 one job's state

use axum::body::Bytes;
use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use etikett_core::error::{EtikettError, Result};
use etikett_core::types::{JobId, JobStatus, Metadata};
use etikett_queue::QueueClient;

use crate::errors::{error_response, json_error};

/// Build the router around a queue handle.
pub fn router(queue: QueueClient) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/print/barcodes", post(print_barcodes))
        .route("/status/print-barcodes", get(print_status))
        .route("/jobs/:id", get(job_detail))
        .layer(Extension(queue))
}

/// Body of `POST /print/barcodes`.
#[derive(Debug, Deserialize)]
struct PrintRequest {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    meta: Option<Value>,
}

impl PrintRequest {
    /// Parse a request body into label, content and metadata.
    fn parse(body: &[u8]) -> Result<(String, String, Metadata)> {
        let request: PrintRequest = serde_json::from_slice(body)
            .map_err(|e| EtikettError::Validation(format!("Invalid JSON body: {e}")))?;

        let content = request.content.unwrap_or_default();
        if content.is_empty() {
            return Err(EtikettError::Validation("Missing content field.".into()));
        }

        let meta = match request.meta {
            None | Some(Value::Null) => Metadata::new(),
            Some(Value::Object(map)) => map,
            Some(_) => return Err(EtikettError::Validation("meta must be a JSON object.".into())),
        };

        Ok((request.label.unwrap_or_default(), content, meta))
    }
}

/// Public view of a job.
#[derive(Debug, Serialize)]
struct JobView {
    id: JobId,
    status: JobStatus,
    attempts: u32,
    created_at: DateTime<Utc>,
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn print_barcodes(Extension(queue): Extension<QueueClient>, body: Bytes) -> Response {
    let (label, content, meta) = match PrintRequest::parse(&body) {
        Ok(parts) => parts,
        Err(e) => return error_response(e),
    };

    match queue.submit(label, content, meta).await {
        Ok(job_id) => {
            info!(job_id = %job_id, "print job queued");
            (
                StatusCode::ACCEPTED,
                Json(json!({ "message": "Print job queued.", "job_id": job_id })),
            )
                .into_response()
        }
        Err(e) => error_response(e),
    }
}

async fn print_status(Extension(queue): Extension<QueueClient>) -> Response {
    match queue.status().await {
        Ok(report) => Json(report).into_response(),
        Err(e) => error_response(e),
    }
}

async fn job_detail(Extension(queue): Extension<QueueClient>, Path(raw): Path<String>) -> Response {
    let Ok(id) = raw.parse::<i64>() else {
        return json_error(StatusCode::BAD_REQUEST, format!("invalid job id {raw:?}"));
    };
    match queue.job(JobId(id)).await {
        Ok(Some(job)) => Json(JobView {
            id: job.id,
            status: job.status,
            attempts: job.attempts,
            created_at: job.created_at,
        })
        .into_response(),
        Ok(None) => json_error(StatusCode::NOT_FOUND, format!("job {id} not found")),
        Err(e) => error_response(e),
    }
}
