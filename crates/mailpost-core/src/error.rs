//! Error types for the core library.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while composing a message.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// The attachment exists but could not be read.
    #[error("{source}")]
    Attachment {
        /// Path that was given.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The MIME tree could not be built or serialized.
    #[error("MIME error: {0}")]
    Mime(#[from] mailpost_mime::Error),
}

/// Why a send failed. Every variant is terminal; nothing is retried.
#[derive(Debug, Error)]
pub enum SendError {
    /// The server rejected the credentials.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The server could not be reached or the session could not be set up
    /// (connect, greeting, EHLO, STARTTLS or TLS handshake).
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The attachment could not be read. Raised before any network activity.
    #[error("Attachment error: {0}")]
    Attachment(String),

    /// Any other failure during composition or transmission.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl SendError {
    /// The message shown to the user, with remediation hints where the
    /// failure class has them.
    #[must_use]
    pub fn guidance(&self) -> String {
        match self {
            Self::Authentication(_) => "Authentication failed! Please check:\n\
                 - Email address\n\
                 - App Password (16 characters)\n\
                 - 2-Factor Authentication is enabled"
                .to_string(),
            Self::Connection(_) => "Connection failed! Check:\n\
                 - Internet connection\n\
                 - SMTP server and port\n\
                 - Firewall settings"
                .to_string(),
            Self::Attachment(cause) => format!("Error processing attachment: {cause}"),
            Self::Transport(cause) => format!("Error: {cause}"),
        }
    }

    /// Returns the underlying cause text.
    #[must_use]
    pub fn cause(&self) -> &str {
        match self {
            Self::Authentication(cause)
            | Self::Connection(cause)
            | Self::Attachment(cause)
            | Self::Transport(cause) => cause,
        }
    }
}

impl From<ComposeError> for SendError {
    fn from(err: ComposeError) -> Self {
        match err {
            ComposeError::Attachment { source, .. } => Self::Attachment(source.to_string()),
            ComposeError::Mime(e) => Self::Transport(e.to_string()),
        }
    }
}
