//! `tokio_util` codecs for both ends of a connection.
//!
//! `ServerCodec` turns frames into requests (or decode failures) and writes
//! envelopes. `ClientCodec` does the reverse. Both share the newline framer.

use bytes::{BufMut, BytesMut};
use serde::Serialize;
use serde_json::Value;
use tokio_util::codec::{Decoder, Encoder};

use super::envelope::Envelope;
use super::error::{CodecError, DecodeFailure};
use super::frame::{Frame, LineFramer};
use super::request::Request;

/// Default upper bound on a single frame.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 64 * 1024;

fn write_json_line<T: Serialize>(item: &T, dst: &mut BytesMut) -> Result<(), CodecError> {
    let json = serde_json::to_vec(item)?;
    dst.reserve(json.len() + 1);
    dst.extend_from_slice(&json);
    dst.put_u8(b'\n');
    Ok(())
}

/// Server side: decodes requests, encodes envelopes.
///
/// Malformed frames are yielded as `Err(DecodeFailure)` items rather than
/// codec errors, so the stream keeps going after them.
#[derive(Debug, Clone)]
pub struct ServerCodec {
    framer: LineFramer,
}

impl ServerCodec {
    pub fn new(max_frame_bytes: usize) -> Self {
        Self {
            framer: LineFramer::new(max_frame_bytes),
        }
    }

    fn request_from(&self, frame: Frame) -> Result<Request, DecodeFailure> {
        match frame {
            Frame::Line(bytes) => Request::decode(&bytes),
            Frame::Oversized(size) => Err(DecodeFailure::FrameTooLarge {
                size,
                max: self.framer.max_len(),
            }),
        }
    }
}

impl Default for ServerCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_BYTES)
    }
}

impl Decoder for ServerCodec {
    type Item = Result<Request, DecodeFailure>;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Ok(self.framer.next_frame(src).map(|frame| self.request_from(frame)))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(item) = self.decode(src)? {
            return Ok(Some(item));
        }
        Ok(self.framer.finish(src).map(|frame| self.request_from(frame)))
    }
}

impl<T: Serialize> Encoder<Envelope<T>> for ServerCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Envelope<T>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        write_json_line(&item, dst)
    }
}

/// Client side: encodes requests, decodes envelopes.
#[derive(Debug, Clone)]
pub struct ClientCodec {
    framer: LineFramer,
}

impl ClientCodec {
    pub fn new(max_frame_bytes: usize) -> Self {
        Self {
            framer: LineFramer::new(max_frame_bytes),
        }
    }

    fn envelope_from(&self, frame: Frame) -> Result<Envelope<Value>, CodecError> {
        match frame {
            Frame::Line(bytes) => serde_json::from_slice(bytes.trim_ascii())
                .map_err(|e| CodecError::MalformedResponse(e.to_string())),
            Frame::Oversized(size) => Err(CodecError::FrameTooLarge {
                size,
                max: self.framer.max_len(),
            }),
        }
    }
}

impl Default for ClientCodec {
    fn default() -> Self {
        // Responses carrying the whole fleet can be far larger than requests.
        Self::new(DEFAULT_MAX_FRAME_BYTES * 64)
    }
}

impl Decoder for ClientCodec {
    type Item = Envelope<Value>;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.framer
            .next_frame(src)
            .map(|frame| self.envelope_from(frame))
            .transpose()
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(item) = self.decode(src)? {
            return Ok(Some(item));
        }
        self.framer
            .finish(src)
            .map(|frame| self.envelope_from(frame))
            .transpose()
    }
}

impl Encoder<Request> for ClientCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Request, dst: &mut BytesMut) -> Result<(), Self::Error> {
        write_json_line(&item, dst)
    }
}

/// A caller-supplied line, written as is. One trailing newline is
/// normalised; nothing else is checked.
impl<'a> Encoder<&'a str> for ClientCodec {
    type Error = CodecError;

    fn encode(&mut self, item: &'a str, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let line = item.strip_suffix('\n').unwrap_or(item);
        dst.reserve(line.len() + 1);
        dst.extend_from_slice(line.as_bytes());
        dst.put_u8(b'\n');
        Ok(())
    }
}
