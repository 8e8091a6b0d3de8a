//! The structured result of a send.

use crate::compose::{AttachmentFile, EmailMessage};
use crate::config::ServerConfig;
use crate::error::SendError;
use serde::{Deserialize, Serialize};

/// Message shown after a successful send.
pub const SUCCESS_MESSAGE: &str = "Email sent successfully!";

/// Metadata about the attached file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentInfo {
    /// Base name of the file.
    pub filename: String,
    /// Size in bytes.
    pub size: u64,
    /// Size in MiB, rounded to two decimals.
    pub size_mb: f64,
}

impl AttachmentInfo {
    /// Describes an attachment.
    #[must_use]
    pub fn from_file(file: &AttachmentFile) -> Self {
        let size = file.size_bytes();
        Self {
            filename: file.filename.clone(),
            size,
            size_mb: size_mb(size),
        }
    }
}

/// Echo of a successful send, for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendDetails {
    /// Sender address.
    pub from: String,
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Number of characters in the plain body.
    pub body_length: usize,
    /// Whether an HTML alternative was included. Always true.
    pub html_included: bool,
    /// Relay hostname.
    pub smtp_server: String,
    /// Relay port.
    pub port: u16,
    /// Attachment metadata, `null` without an attachment.
    pub attachment: Option<AttachmentInfo>,
}

impl SendDetails {
    /// Builds the details for a message delivered to `server`.
    #[must_use]
    pub fn new(message: &EmailMessage, server: &ServerConfig) -> Self {
        Self {
            from: message.sender.clone(),
            to: message.recipient.clone(),
            subject: message.subject.clone(),
            body_length: message.plain_body.chars().count(),
            html_included: true,
            smtp_server: server.host.clone(),
            port: server.port,
            attachment: message.attachment.as_ref().map(AttachmentInfo::from_file),
        }
    }
}

/// Outcome of a send: never an `Err`, always something to show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendOutcome {
    /// True when the relay accepted the message.
    pub ok: bool,
    /// Human-readable status, with remediation hints on failure.
    pub message: String,
    /// Present only on success.
    pub details: Option<SendDetails>,
}

impl SendOutcome {
    /// A successful outcome.
    #[must_use]
    pub fn success(details: SendDetails) -> Self {
        Self {
            ok: true,
            message: SUCCESS_MESSAGE.to_string(),
            details: Some(details),
        }
    }

    /// A failed outcome.
    #[must_use]
    pub fn failure(error: &SendError) -> Self {
        Self {
            ok: false,
            message: error.guidance(),
            details: None,
        }
    }

    /// Renders the outcome as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl From<Result<SendDetails, SendError>> for SendOutcome {
    fn from(result: Result<SendDetails, SendError>) -> Self {
        match result {
            Ok(details) => Self::success(details),
            Err(error) => Self::failure(&error),
        }
    }
}

/// Converts a byte count to MiB rounded to two decimals, halves to even.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn size_mb(bytes: u64) -> f64 {
    (bytes as f64 / 1_048_576.0 * 100.0).round_ties_even() / 100.0
}
