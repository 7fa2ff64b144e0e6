//! Wire Codec subsystem.
//!
//! # Data Flow
//! ```text
//! socket bytes
//!     → frame.rs (newline delimiting, accumulation, size limit)
//!     → request.rs (JSON object → Request, or DecodeFailure)
//!     → [dispatcher]
//!     → envelope.rs + payload.rs (status, data, message, timestamp)
//!     → codec.rs (one JSON line per envelope)
//!     → socket bytes
//! ```
//!
//! # Design Decisions
//! - Newline-delimited JSON: every message ends in `\n`, so split and
//!   coalesced TCP reads are both handled
//! - Malformed input never becomes a codec error; it becomes an
//!   `INVALID_REQUEST` envelope and the connection stays open
//! - Frames are size-limited; oversized frames are skipped to their delimiter

pub mod codec;
pub mod envelope;
pub mod error;
pub mod frame;
pub mod payload;
pub mod request;

pub use codec::{ClientCodec, ServerCodec, DEFAULT_MAX_FRAME_BYTES};
pub use envelope::{Envelope, Status};
pub use error::{CodecError, DecodeFailure};
pub use payload::Payload;
pub use request::Request;
