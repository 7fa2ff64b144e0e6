//! REST handlers.
//!
//! Each handler builds one protocol request and forwards it over a fresh
//! TCP connection. The path id and body fields are passed through
//! unchanged; the protocol service validates them.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::Response;
use axum::Json;
use serde_json::{json, Map, Value};

use crate::protocol::Request;

use super::request::request_id;
use super::response::{envelope_response, error_response, transport_error_response};
use super::server::AppState;

pub async fn root() -> Json<Value> {
    Json(json!({"message": "Robot Management API is running"}))
}

pub async fn ping(State(state): State<AppState>, headers: HeaderMap) -> Response {
    forward(&state, &headers, Request::new("PING")).await
}

pub async fn list_robots(State(state): State<AppState>, headers: HeaderMap) -> Response {
    forward(&state, &headers, Request::new("GET_ALL_ROBOTS")).await
}

pub async fn robot_positions(State(state): State<AppState>, headers: HeaderMap) -> Response {
    forward(&state, &headers, Request::new("GET_ROBOT_POSITIONS")).await
}

pub async fn get_robot(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let request = Request::new("GET_ROBOT_BY_ID").with_param("robotId", id);
    forward(&state, &headers, request).await
}

pub async fn update_position(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    update(&state, &headers, "UPDATE_ROBOT_POSITION", id, &body, &["x", "y", "battery"]).await
}

pub async fn update_speed(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    update(&state, &headers, "UPDATE_ROBOT_SPEED", id, &body, &["speed"]).await
}

pub async fn update_battery(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    update(&state, &headers, "UPDATE_ROBOT_BATTERY", id, &body, &["battery"]).await
}

pub async fn not_found(uri: Uri) -> Response {
    error_response(StatusCode::NOT_FOUND, format!("route not found - {}", uri))
}

async fn update(
    state: &AppState,
    headers: &HeaderMap,
    command: &str,
    id: String,
    body: &[u8],
    fields: &[&str],
) -> Response {
    let body = match parse_body(body) {
        Ok(body) => body,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };

    let mut request = Request::new(command).with_param("robotId", id);
    for field in fields {
        if let Some(value) = body.get(*field) {
            request = request.with_param(*field, value.clone());
        }
    }
    forward(state, headers, request).await
}

/// An empty body counts as `{}`.
fn parse_body(body: &[u8]) -> Result<Map<String, Value>, String> {
    if body.trim_ascii().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_slice(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("request body must be a JSON object".to_string()),
        Err(e) => Err(format!("invalid JSON body: {}", e)),
    }
}

async fn forward(state: &AppState, headers: &HeaderMap, request: Request) -> Response {
    let request_id = request_id(headers);
    let command = request.command.clone();

    match state.client.send(request).await {
        Ok(envelope) => {
            tracing::debug!(
                request_id,
                command = %command,
                status = %envelope.status,
                "Protocol response"
            );
            envelope_response(envelope)
        }
        Err(e) => {
            tracing::warn!(
                request_id,
                command = %command,
                error = %e,
                "Protocol round trip failed"
            );
            transport_error_response(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_is_empty_object() {
        assert!(parse_body(b"").unwrap().is_empty());
        assert!(parse_body(b"  \n").unwrap().is_empty());
    }

    #[test]
    fn non_object_body_is_rejected() {
        assert!(parse_body(b"[1,2]").unwrap_err().contains("JSON object"));
        assert!(parse_body(b"{oops").unwrap_err().starts_with("invalid JSON body"));
    }
}
