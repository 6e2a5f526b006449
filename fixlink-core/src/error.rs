/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Error types for the fixlink FIX client.
//!
//! Transport failures are fatal to the session that raised them. Protocol
//! level rejections (a refused logon, a market data reject) are not errors at
//! all: the session reports them as ordinary return values.

use thiserror::Error;

/// Result type alias using [`FixError`] as the error type.
pub type Result<T> = std::result::Result<T, FixError>;

/// Top-level error type for all fixlink operations.
#[derive(Debug, Error)]
pub enum FixError {
    /// A received message could not be interpreted.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The session rejected the call or its configuration.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// The underlying connection failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl FixError {
    /// Returns true if this error ended the session.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Errors raised while reading values out of a received message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// An expected field is absent from the message.
    #[error("missing required field: tag {tag}")]
    MissingRequiredField {
        /// The tag number of the missing field.
        tag: u32,
    },

    /// A field is present but its value has the wrong shape.
    #[error("invalid field value for tag {tag}: {reason}")]
    InvalidFieldValue {
        /// The tag number of the field.
        tag: u32,
        /// Description of why the value is invalid.
        reason: String,
    },

    /// Field value is not valid UTF-8.
    #[error("invalid utf-8 in field: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

/// Errors raised by the socket and TLS layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// TCP connection could not be established.
    #[error("connection to {addr} failed: {reason}")]
    ConnectionFailed {
        /// The `host:port` that was dialled.
        addr: String,
        /// Underlying socket error.
        reason: String,
    },

    /// TLS configuration or handshake failure.
    #[error("tls error: {0}")]
    Tls(String),

    /// No response arrived within the read timeout.
    #[error("read timed out after {elapsed_ms} milliseconds")]
    Timeout {
        /// The timeout that elapsed, in milliseconds.
        elapsed_ms: u64,
    },

    /// The counterparty closed the connection.
    #[error("connection closed by counterparty")]
    ConnectionClosed,

    /// Any other I/O failure on the established stream.
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Errors in session layer operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Session is not in the correct state for the operation.
    #[error("invalid session state: expected {expected}, current {current}")]
    InvalidState {
        /// State the operation requires.
        expected: String,
        /// Current session state.
        current: String,
    },

    /// Session configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),
}
