//! Command Dispatcher.
//!
//! # Data Flow
//! ```text
//! Request
//!     → catalog lookup (unknown name → INVALID_REQUEST)
//!     → parameter validation (bad params → INVALID_REQUEST, no store call)
//!     → handler → StoreGateway
//!     → record → SUCCESS | absent → NOT_FOUND | StoreError → ERROR
//! ```
//!
//! # Design Decisions
//! - This is the only place store failures are observed; the store's
//!   message is forwarded, never a backtrace
//! - No retries: a failed call is reported once

use std::sync::Arc;
use std::time::Instant;

use crate::catalog::{self, HandlerError};
use crate::observability::metrics;
use crate::protocol::{Envelope, Payload, Request};
use crate::store::StoreGateway;

/// Message of the `NOT_FOUND` envelope.
pub const ROBOT_NOT_FOUND: &str = "robot not found";

/// Routes decoded requests to catalog handlers.
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<dyn StoreGateway>,
}

impl Dispatcher {
    /// Create a dispatcher over an injected store.
    pub fn new(store: Arc<dyn StoreGateway>) -> Self {
        Self { store }
    }

    /// Produce the single envelope answering `request`.
    pub async fn dispatch(&self, request: &Request) -> Envelope<Payload> {
        let started = Instant::now();

        let Some(spec) = catalog::lookup(&request.command) else {
            tracing::debug!(command = %request.command, "Unrecognized command");
            let envelope = Envelope::invalid_request(format!(
                "unrecognized command: {}",
                request.command
            ));
            metrics::record_request("UNKNOWN", envelope.status, started);
            return envelope;
        };
        let command = spec.name.as_str();

        let envelope = match spec.validate(&request.params) {
            Err(error) => {
                tracing::debug!(command, error = %error, "Rejected parameters");
                Envelope::invalid_request(error.to_string())
            }
            Ok(args) => match (spec.handler)(self.store.as_ref(), &args).await {
                Ok(Some(payload)) => Envelope::success(payload),
                Ok(None) => Envelope::not_found(ROBOT_NOT_FOUND),
                Err(HandlerError::Store(error)) => {
                    tracing::warn!(command, kind = error.kind(), error = %error, "Store operation failed");
                    Envelope::error(error.message())
                }
                Err(error @ HandlerError::Argument(_)) => {
                    tracing::error!(command, error = %error, "Handler and schema disagree");
                    Envelope::error("internal server error")
                }
            },
        };

        tracing::debug!(
            command,
            status = %envelope.status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Request dispatched"
        );
        metrics::record_request(command, envelope.status, started);
        envelope
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}
