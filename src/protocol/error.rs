//! Wire-level error types.

use thiserror::Error;

/// Why a frame could not be turned into a request.
///
/// Every variant degrades to an `INVALID_REQUEST` envelope; none of them
/// closes the connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeFailure {
    #[error("empty request")]
    Empty,

    #[error("invalid request format, expected a JSON object: {0}")]
    MalformedJson(String),

    #[error("invalid request format, expected a JSON object")]
    NotAnObject,

    #[error("missing 'command' field")]
    MissingCommand,

    #[error("'params' must be an object")]
    InvalidParams,

    #[error("request of {size} bytes exceeds the {max} byte limit")]
    FrameTooLarge { size: usize, max: usize },
}

impl DecodeFailure {
    /// Short label used as a metric dimension.
    pub fn reason(&self) -> &'static str {
        match self {
            DecodeFailure::Empty => "empty",
            DecodeFailure::MalformedJson(_) => "malformed_json",
            DecodeFailure::NotAnObject => "not_an_object",
            DecodeFailure::MissingCommand => "missing_command",
            DecodeFailure::InvalidParams => "invalid_params",
            DecodeFailure::FrameTooLarge { .. } => "frame_too_large",
        }
    }
}

/// Failure on the byte stream itself.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("malformed response frame: {0}")]
    MalformedResponse(String),

    #[error("response of {size} bytes exceeds the {max} byte limit")]
    FrameTooLarge { size: usize, max: usize },
}
