//! # Errors
//!
//! Error types and helper functions used in the library

use std::str::Utf8Error;
use thiserror::Error;

/// Application errors
#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    ServerError(#[from] ServerError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors related to working with [`crate::server`]
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Connection limit semaphore closed: {0}")]
    AcquireError(#[from] tokio::sync::AcquireError),

    #[error(transparent)]
    ConnectionError(#[from] ConnectionError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors related to working with [`crate::conn`] and [`crate::client`]
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    ProtocolError(#[from] ProtocolError),

    #[error("Connection closed by peer")]
    Closed,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors raised by the RESP decoder in [`crate::resp`].
///
/// All of these are malformed-input errors and are fatal to the connection
/// that produced them. Incomplete input is not an error: the decoder simply
/// waits for more bytes.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The top-level frame tag is not one this side of the protocol accepts.
    #[error("unsupported request type: {0}")]
    UnsupportedRequestType(char),

    #[error("invalid array length: {0}")]
    InvalidArrayLength(String),

    #[error("invalid bulk string length: {0}")]
    InvalidBulkStringLength(String),

    #[error("invalid integer: {0}")]
    InvalidInteger(String),

    /// Bulk string payloads and line contents must decode as UTF-8.
    #[error("invalid utf-8 in frame: {0}")]
    InvalidUtf8(#[from] Utf8Error),

    /// A bulk string payload was not followed by CRLF.
    #[error("bulk string not terminated by CRLF")]
    MissingCrlf,

    /// The connection's input buffer outgrew
    /// [`MAX_INPUT_BUFFER_LEN`](crate::constants::MAX_INPUT_BUFFER_LEN).
    #[error("request too large: {0} bytes buffered")]
    RequestTooLarge(usize),
}

/// Raised by list operations against a key holding a plain string.
///
/// The dispatcher turns this into the `-ERR wrong type` reply.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("wrong type")]
pub struct WrongTypeError;
