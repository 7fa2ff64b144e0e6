//! Connection Manager subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (bind, accept)
//!     → server.rs (accept loop, one task per connection)
//!     → connection.rs (id, state, tracking for drain)
//!     → session.rs (framing, idle timeout, dispatch, write)
//! ```
//!
//! # Design Decisions
//! - No connection limit; the store's pool is the admission control
//! - Each connection tracked for graceful shutdown
//! - A failure on one connection never touches another

pub mod connection;
pub mod listener;
pub mod server;
pub mod session;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionState, ConnectionTracker};
pub use listener::{Listener, ListenerError};
pub use server::ProtocolServer;
pub use session::{CloseReason, Session, SessionSettings};
