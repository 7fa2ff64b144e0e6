//! HTTP façade subsystem.
//!
//! # Data Flow
//! ```text
//! REST request
//!     → server.rs (Axum router, request ID, tracing, timeout, CORS)
//!     → handlers.rs (path + body → protocol Request)
//!     → ProtocolClient (one TCP connection per request)
//!     → response.rs (envelope status → HTTP status, data or message body)
//! ```
//!
//! # Design Decisions
//! - The façade shares no memory with the protocol service; it is only a
//!   client of the wire protocol
//! - No retries; callers own their retry policy

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer, HttpServerError};
