//! Error types for SMTP operations.

use std::io;

use crate::types::Reply;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMTP error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error, including TLS handshake failures surfaced by the stream.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Server answered a command with a non-success reply.
    #[error("SMTP error {code}: {message}")]
    Rejected {
        /// Reply code (e.g., 535).
        code: u16,
        /// Reply text from the server.
        message: String,
    },

    /// The server sent something that is not a valid SMTP reply, or closed
    /// the connection mid-reply.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Message is larger than the limit advertised with the SIZE extension.
    #[error("Message of {size} bytes exceeds the server limit of {limit} bytes")]
    MessageTooLarge {
        /// Size of the message being submitted.
        size: usize,
        /// Limit advertised by the server.
        limit: usize,
    },

    /// Feature not offered by the server.
    #[error("Server does not support {0}")]
    NotSupported(String),
}

impl Error {
    /// Builds a rejection error from a server reply.
    #[must_use]
    pub fn rejected(reply: &Reply) -> Self {
        Self::Rejected {
            code: reply.code.as_u16(),
            message: reply.message_text(),
        }
    }

    /// Returns the reply code if the server rejected a command.
    #[must_use]
    pub const fn reply_code(&self) -> Option<u16> {
        match self {
            Self::Rejected { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Returns true if this is a permanent error (5xx).
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::Rejected { code, .. } if *code >= 500 && *code < 600)
    }

    /// Returns true if this is a transient error (4xx).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Rejected { code, .. } if *code >= 400 && *code < 500)
    }
}
