//! Protocol envelope → HTTP response mapping.
//!
//! # Design Decisions
//! - `SUCCESS` bodies are the bare `data` value, as existing clients expect
//! - Every failure body is `{"message": ...}`; never a stack trace
//! - Failing to reach the protocol service is a 502, distinct from a
//!   protocol-level `ERROR` (500)

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::client::ClientError;
use crate::protocol::{Envelope, Status};

/// Body of every non-success response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

/// HTTP status for a protocol status.
pub fn status_code(status: Status) -> StatusCode {
    match status {
        Status::Success => StatusCode::OK,
        Status::InvalidRequest => StatusCode::BAD_REQUEST,
        Status::NotFound => StatusCode::NOT_FOUND,
        Status::Error => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            message: message.into(),
        }),
    )
        .into_response()
}

/// Map a protocol envelope to the façade's response.
pub fn envelope_response(envelope: Envelope) -> Response {
    let status = status_code(envelope.status);
    if envelope.is_success() {
        (status, Json(envelope.data.unwrap_or(Value::Null))).into_response()
    } else {
        error_response(status, envelope.message)
    }
}

/// Map a failed round trip to a 502.
pub fn transport_error_response(error: &ClientError) -> Response {
    error_response(
        StatusCode::BAD_GATEWAY,
        format!("robot service unavailable: {}", error),
    )
}
