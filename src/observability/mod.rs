//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! net, dispatch, http produce:
//!     → logging.rs (structured log events, connection spans)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stderr (pretty or JSON)
//!     → Prometheus scrape endpoint
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogFormat, LoggingError};
