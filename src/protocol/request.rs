//! Protocol request decoding.
//!
//! A request frame is a JSON object:
//!
//! ```json
//! {"command":"UPDATE_ROBOT_SPEED","params":{"robotId":7,"speed":2.5}}
//! ```
//!
//! Only the envelope shape is checked here. Whether the command exists and
//! whether its parameters are well typed is decided by the command catalog.

use serde::Serialize;
use serde_json::{Map, Value};

use super::error::DecodeFailure;

/// One decoded protocol request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    /// Command name, as sent. Not yet checked against the catalog.
    pub command: String,
    /// Named parameters. Empty when the client sent none.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
}

impl Request {
    /// Create a request with no parameters.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            params: Map::new(),
        }
    }

    /// Add a parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Decode one frame's bytes into a request.
    ///
    /// Surrounding whitespace, including a `\r` left by telnet-style clients,
    /// is ignored.
    pub fn decode(frame: &[u8]) -> Result<Self, DecodeFailure> {
        let trimmed = frame.trim_ascii();
        if trimmed.is_empty() {
            return Err(DecodeFailure::Empty);
        }

        let value: Value = serde_json::from_slice(trimmed)
            .map_err(|e| DecodeFailure::MalformedJson(e.to_string()))?;
        let Value::Object(mut object) = value else {
            return Err(DecodeFailure::NotAnObject);
        };

        let command = match object.remove("command") {
            Some(Value::String(command)) => command,
            _ => return Err(DecodeFailure::MissingCommand),
        };

        let params = match object.remove("params") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(params)) => params,
            Some(_) => return Err(DecodeFailure::InvalidParams),
        };

        Ok(Self { command, params })
    }
}
