// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use etikett_core::EtikettError;

/// Map a queue error onto an HTTP response with a `{ "error": ... }` body.
///
/// Validation problems are the caller's fault (400); anything else is ours
/// (500) and is logged.
pub fn error_response(err: EtikettError) -> Response {
    match err {
        EtikettError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, msg),
        other => {
            error!(error = %other, "request failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
        }
    }
}

pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}
