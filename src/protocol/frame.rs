//! Newline-delimited framing.
//!
//! TCP delivers a byte stream, not messages: one read may carry half a frame
//! or several frames. The framer scans an accumulation buffer for `\n` and
//! yields one frame per delimiter, remembering how far it has already
//! searched so partial frames are not rescanned.
//!
//! A frame longer than the limit is discarded up to its delimiter and
//! reported once as `Frame::Oversized`, which keeps the buffer bounded and
//! the connection usable.

use bytes::{Buf, BytesMut};

/// One delimited unit from the stream.
#[derive(Debug, PartialEq, Eq)]
pub enum Frame {
    /// Frame contents without the trailing newline.
    Line(BytesMut),
    /// A frame that exceeded the limit. Carries the number of bytes dropped.
    Oversized(usize),
}

#[derive(Debug, Clone)]
pub struct LineFramer {
    max_len: usize,
    /// Offset up to which the buffer is known to hold no delimiter.
    next_index: usize,
    /// Bytes dropped so far while skipping an oversized frame.
    discarding: Option<usize>,
}

impl LineFramer {
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len,
            next_index: 0,
            discarding: None,
        }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Extract the next complete frame, if the buffer holds one.
    pub fn next_frame(&mut self, buf: &mut BytesMut) -> Option<Frame> {
        let newline = buf[self.next_index..]
            .iter()
            .position(|b| *b == b'\n')
            .map(|offset| offset + self.next_index);

        match (self.discarding, newline) {
            (Some(dropped), Some(pos)) => {
                buf.advance(pos + 1);
                self.reset();
                Some(Frame::Oversized(dropped + pos))
            }
            (Some(dropped), None) => {
                let len = buf.len();
                buf.advance(len);
                self.next_index = 0;
                self.discarding = Some(dropped + len);
                None
            }
            (None, Some(pos)) => {
                self.reset();
                let mut line = buf.split_to(pos + 1);
                if pos > self.max_len {
                    return Some(Frame::Oversized(pos));
                }
                line.truncate(pos);
                Some(Frame::Line(line))
            }
            (None, None) if buf.len() > self.max_len => {
                let len = buf.len();
                buf.advance(len);
                self.next_index = 0;
                self.discarding = Some(len);
                None
            }
            (None, None) => {
                self.next_index = buf.len();
                None
            }
        }
    }

    /// Flush whatever is left when the peer has stopped sending.
    ///
    /// Trailing bytes without a delimiter count as a final frame, unless they
    /// are only whitespace.
    pub fn finish(&mut self, buf: &mut BytesMut) -> Option<Frame> {
        let dropped = self.discarding;
        self.reset();
        if let Some(dropped) = dropped {
            let len = buf.len();
            buf.advance(len);
            return Some(Frame::Oversized(dropped + len));
        }
        if buf.trim_ascii().is_empty() {
            buf.clear();
            return None;
        }
        Some(Frame::Line(buf.split()))
    }

    fn reset(&mut self) {
        self.next_index = 0;
        self.discarding = None;
    }
}
