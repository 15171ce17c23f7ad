//! # RESP: the wire codec
//!
//! The server speaks a subset of RESP2, the length-prefixed text protocol
//! used by Redis clients. The first byte of every frame identifies its type:
//!
//! - `+` simple string: `+OK\r\n`
//! - `-` simple error: `-ERR message\r\n`
//! - `:` integer: `:1000\r\n`
//! - `$` bulk string: `$5\r\nhello\r\n`; the null bulk string is `$-1\r\n`
//! - `*` array: `*2\r\n$3\r\nfoo\r\n$3\r\nbar\r\n`
//!
//! `\r\n` (CRLF) terminates every part of the protocol.
//!
//! Clients send commands as arrays of bulk strings; the first element is the
//! command name, the rest are its arguments. Requests can be pipelined: a
//! client may send any number of commands before reading a single reply.
//!
//! The decoder here is incremental and resumable. TCP delivers an unframed
//! byte stream, so a read may end in the middle of a frame; [`Parser::feed`]
//! appends whatever arrived to an internal buffer and extracts as many
//! complete frames as it can. A partially received frame consumes nothing:
//! its bytes stay buffered until the rest shows up. Only malformed input is
//! an error, and such errors are fatal to the connection that sent them.
//!
//! [Official protocol documentation](https://redis.io/docs/latest/develop/reference/protocol-spec/)

use crate::constants::MAX_INPUT_BUFFER_LEN;
use crate::errors::ProtocolError;
use bytes::{Buf, Bytes, BytesMut};
use memchr::memmem;
use std::collections::VecDeque;
use std::fmt::{Display, Formatter};

const CRLF: &[u8] = b"\r\n";
const CRLF_LEN: usize = CRLF.len();

/// Default prefix for simple errors
const ERROR_PREFIX: &str = "ERR";

/// A fully decoded RESP frame
///
/// Commands arrive as [`Frame::Array`]; the remaining variants occur only in
/// replies, which a [`Mode::Client`] parser decodes.
///
/// Arrays carry their elements as already-decoded strings because the only
/// arrays this protocol subset admits are command arrays of bulk strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// `+<text>\r\n`, text free of CR and LF
    Simple(String),
    /// `-<prefix> <message>\r\n`
    Error(String),
    /// `:<decimal>\r\n`, a signed base-10 64-bit integer
    Integer(i64),
    /// `$<n>\r\n<n bytes>\r\n`; `None` is the null bulk string `$-1\r\n`,
    /// which is distinct from the empty bulk string `$0\r\n\r\n`
    Bulk(Option<String>),
    /// `*<m>\r\n` followed by `m` bulk strings
    Array(Vec<String>),
}

/// In case we'd like to print a [`Frame`] the way `redis-cli` would.
impl Display for Frame {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Frame::Simple(text) => write!(f, "{text}"),
            Frame::Error(message) => write!(f, "(error) {message}"),
            Frame::Integer(value) => write!(f, "(integer) {value}"),
            Frame::Bulk(Some(text)) => write!(f, "\"{text}\""),
            Frame::Bulk(None) => write!(f, "(nil)"),
            Frame::Array(items) => {
                if items.is_empty() {
                    return write!(f, "(empty array)");
                }
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}) \"{item}\"", i + 1)?;
                }
                Ok(())
            }
        }
    }
}

/// Which side of the protocol a [`Parser`] sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Requests: only top-level arrays of bulk strings are accepted.
    Server,
    /// Replies: all five frame kinds are accepted at top level.
    Client,
}

/// Per-connection parser state
///
/// Owns an input buffer and a FIFO of fully decoded frames. Cheap to
/// construct; [`feed`](Self::feed) copies the caller's bytes, so no borrow
/// outlives the call.
#[derive(Debug)]
pub struct Parser {
    mode: Mode,
    buffer: BytesMut,
    commands: VecDeque<Frame>,
}

impl Parser {
    /// Creates an empty parser for one side of the protocol.
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            buffer: BytesMut::new(),
            commands: VecDeque::new(),
        }
    }

    /// Appends raw network data and decodes as many complete frames as the
    /// buffer now holds, queuing each for [`next_command`](Self::next_command).
    ///
    /// A frame's bytes are removed from the buffer exactly when the whole
    /// frame has been decoded; an incomplete frame leaves the buffer and the
    /// queue untouched, so feeding the remaining bytes later resumes where
    /// the stream left off.
    ///
    /// # Errors
    /// - [`ProtocolError::RequestTooLarge`] once the buffer outgrows
    ///   [`MAX_INPUT_BUFFER_LEN`]
    /// - any decoding error for malformed (not merely incomplete) input
    pub fn feed(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        self.buffer.extend_from_slice(data);
        if self.buffer.len() > MAX_INPUT_BUFFER_LEN {
            return Err(ProtocolError::RequestTooLarge(self.buffer.len()));
        }
        while !self.buffer.is_empty() {
            match decode_frame(&self.buffer, self.mode)? {
                Some((frame, consumed)) => {
                    self.buffer.advance(consumed);
                    self.commands.push_back(frame);
                }
                None => break,
            }
        }
        Ok(())
    }

    /// Dequeues the oldest fully decoded frame, if any.
    pub fn next_command(&mut self) -> Option<Frame> {
        self.commands.pop_front()
    }
}

/// Attempts to decode one frame starting at `buf[0]`.
///
/// Returns the frame and the number of bytes it occupied, or `Ok(None)` when
/// the buffer does not yet hold the complete frame. `buf` must be non-empty.
fn decode_frame(buf: &[u8], mode: Mode) -> Result<Option<(Frame, usize)>, ProtocolError> {
    let tag = buf[0];
    match (mode, tag) {
        (_, b'*') => decode_array(buf),
        (Mode::Client, b'$') => {
            Ok(decode_bulk(buf)?.map(|(payload, used)| (Frame::Bulk(payload), used)))
        }
        (Mode::Client, b'+') => {
            Ok(decode_line(buf)?.map(|(text, used)| (Frame::Simple(text), used)))
        }
        (Mode::Client, b'-') => {
            Ok(decode_line(buf)?.map(|(text, used)| (Frame::Error(text), used)))
        }
        (Mode::Client, b':') => decode_integer(buf),
        _ => Err(ProtocolError::UnsupportedRequestType(tag as char)),
    }
}

/// Decodes a command array: `*<m>\r\n` followed by `m` bulk strings.
///
/// Negative and non-numeric counts are rejected (null arrays are not part of
/// this subset). If any element is still incomplete, nothing is consumed.
fn decode_array(buf: &[u8]) -> Result<Option<(Frame, usize)>, ProtocolError> {
    let Some(header_end) = memmem::find(buf, CRLF) else {
        return Ok(None);
    };
    let line = &buf[1..header_end];
    let count = std::str::from_utf8(line)
        .ok()
        .and_then(|text| text.parse::<usize>().ok())
        .ok_or_else(|| {
            ProtocolError::InvalidArrayLength(String::from_utf8_lossy(line).into_owned())
        })?;

    // Counts are attacker-controlled, so never preallocate more than a
    // plausible command's worth.
    let mut parts = Vec::with_capacity(count.min(64));
    let mut offset = header_end + CRLF_LEN;
    for _ in 0..count {
        if offset >= buf.len() {
            return Ok(None);
        }
        match decode_bulk(&buf[offset..])? {
            None => return Ok(None),
            // A command argument cannot be the null bulk string.
            Some((None, _)) => {
                return Err(ProtocolError::InvalidBulkStringLength("-1".to_string()))
            }
            Some((Some(part), used)) => {
                parts.push(part);
                offset += used;
            }
        }
    }
    Ok(Some((Frame::Array(parts), offset)))
}

/// Decodes a single bulk string starting at `buf[0]` (the `$` tag).
///
/// Returns the payload and bytes consumed; the null bulk string `$-1\r\n`
/// yields `None` as payload. `Ok(None)` means the complete frame has not
/// arrived yet.
///
/// Examples:
/// - `$5\r\nhello\r\n` => `(Some("hello"), 11)`
/// - `$0\r\n\r\n` => `(Some(""), 6)`
/// - `$-1\r\n` => `(None, 5)`
fn decode_bulk(buf: &[u8]) -> Result<Option<(Option<String>, usize)>, ProtocolError> {
    if buf[0] != b'$' {
        return Err(ProtocolError::UnsupportedRequestType(buf[0] as char));
    }
    let Some(header_end) = memmem::find(buf, CRLF) else {
        return Ok(None);
    };
    let line = &buf[1..header_end];
    if line == b"-1" {
        return Ok(Some((None, header_end + CRLF_LEN)));
    }
    let len = std::str::from_utf8(line)
        .ok()
        .and_then(|text| text.parse::<usize>().ok())
        .ok_or_else(|| {
            ProtocolError::InvalidBulkStringLength(String::from_utf8_lossy(line).into_owned())
        })?;
    // A payload longer than the input-buffer cap can never complete, and an
    // unchecked `start + len` could overflow on an absurd declared length.
    if len > MAX_INPUT_BUFFER_LEN {
        return Err(ProtocolError::RequestTooLarge(len));
    }

    let start = header_end + CRLF_LEN;
    let end = start + len;
    if buf.len() < end + CRLF_LEN {
        return Ok(None);
    }
    if &buf[end..end + CRLF_LEN] != CRLF {
        return Err(ProtocolError::MissingCrlf);
    }
    let payload = std::str::from_utf8(&buf[start..end])?.to_string();
    Ok(Some((Some(payload), end + CRLF_LEN)))
}

/// Decodes a line frame (`+` or `-`): everything between the tag byte and
/// the first CRLF.
fn decode_line(buf: &[u8]) -> Result<Option<(String, usize)>, ProtocolError> {
    let Some(end) = memmem::find(buf, CRLF) else {
        return Ok(None);
    };
    let text = std::str::from_utf8(&buf[1..end])?.to_string();
    Ok(Some((text, end + CRLF_LEN)))
}

/// Decodes an integer frame: `:<decimal>\r\n`.
fn decode_integer(buf: &[u8]) -> Result<Option<(Frame, usize)>, ProtocolError> {
    let Some((text, used)) = decode_line(buf)? else {
        return Ok(None);
    };
    let value = text
        .parse::<i64>()
        .map_err(|_| ProtocolError::InvalidInteger(text))?;
    Ok(Some((Frame::Integer(value), used)))
}

/// Encodes a simple string: `+<text>\r\n`.
///
/// The caller must not pass text containing CR or LF; the dispatcher never
/// produces such content.
pub fn encode_simple_string(text: &str) -> Bytes {
    Bytes::from(format!("+{text}\r\n"))
}

/// Encodes a simple error with the default `ERR` prefix.
pub fn encode_simple_error(message: &str) -> Bytes {
    encode_prefixed_error(ERROR_PREFIX, message)
}

/// Encodes a simple error: `-<prefix> <message>\r\n`.
pub fn encode_prefixed_error(prefix: &str, message: &str) -> Bytes {
    Bytes::from(format!("-{prefix} {message}\r\n"))
}

/// Encodes an integer: `:<decimal>\r\n`.
pub fn encode_integer(value: i64) -> Bytes {
    Bytes::from(format!(":{value}\r\n"))
}

/// Encodes a bulk string: `$<n>\r\n<payload>\r\n`.
///
/// `None` encodes the null bulk string `$-1\r\n`, which signals a missing
/// value. The empty string encodes as `$0\r\n\r\n` and stays distinct from
/// the null bulk.
pub fn encode_bulk_string(payload: Option<&str>) -> Bytes {
    match payload {
        None => Bytes::from_static(b"$-1\r\n"),
        Some(text) => Bytes::from(format!("${}\r\n{text}\r\n", text.len())),
    }
}

/// Encodes an array of bulk strings: `*<m>\r\n` followed by each element.
///
/// This is the request encoding clients use to send commands.
pub fn encode_array<S: AsRef<str>>(items: &[S]) -> Bytes {
    let mut out = BytesMut::new();
    out.extend_from_slice(format!("*{}\r\n", items.len()).as_bytes());
    for item in items {
        out.extend_from_slice(&encode_bulk_string(Some(item.as_ref())));
    }
    out.freeze()
}
