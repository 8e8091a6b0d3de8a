//! The composed email and the composer itself.

use super::template::html_body;
use crate::error::ComposeError;
use mailpost_mime::{Attachment, Message, MessageBuilder};
use std::path::Path;
use tracing::{debug, warn};

/// A file read into memory for attaching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentFile {
    /// Base name of the source path.
    pub filename: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl AttachmentFile {
    /// Size of the file in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// A message ready to be sent. Built once per send and then discarded.
///
/// The HTML view is derived from the plain body and never stored
/// separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// Sender address (`From`, envelope sender and AUTH identity).
    pub sender: String,
    /// The single recipient (`To` and envelope recipient).
    pub recipient: String,
    /// Subject line.
    pub subject: String,
    /// Plain text body.
    pub plain_body: String,
    /// Optional attachment, present only when the file was read.
    pub attachment: Option<AttachmentFile>,
}

impl EmailMessage {
    /// The HTML alternative of [`Self::plain_body`].
    #[must_use]
    pub fn html_body(&self) -> String {
        html_body(&self.plain_body)
    }

    /// Builds the MIME tree:
    /// `multipart/mixed { multipart/alternative { text/plain, text/html }, attachment? }`.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be assembled.
    pub fn to_mime(&self) -> Result<Message, ComposeError> {
        let mut builder = MessageBuilder::new()
            .from(&self.sender)
            .to(&self.recipient)
            .subject(&self.subject)
            .text_body(&self.plain_body)
            .html_body(self.html_body())
            .mixed();

        if let Some(file) = &self.attachment {
            builder = builder.attach(Attachment::new(&file.filename, file.bytes.clone()));
        }

        Ok(builder.build()?)
    }

    /// Serializes the message to RFC 5322 bytes with CRLF line endings.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be assembled.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ComposeError> {
        Ok(self.to_mime()?.to_bytes()?)
    }
}

/// Builds an [`EmailMessage`] from the raw fields.
///
/// An `attachment_path` that does not exist is treated as no attachment. A
/// path that exists but cannot be read fails with
/// [`ComposeError::Attachment`].
///
/// # Errors
///
/// Returns [`ComposeError::Attachment`] if the attachment cannot be read.
pub fn compose(
    sender: &str,
    recipient: &str,
    subject: &str,
    plain_body: &str,
    attachment_path: Option<&Path>,
) -> Result<EmailMessage, ComposeError> {
    let attachment = match attachment_path {
        Some(path) => read_attachment(path)?,
        None => None,
    };

    Ok(EmailMessage {
        sender: sender.to_string(),
        recipient: recipient.to_string(),
        subject: subject.to_string(),
        plain_body: plain_body.to_string(),
        attachment,
    })
}

fn read_attachment(path: &Path) -> Result<Option<AttachmentFile>, ComposeError> {
    if !path.exists() {
        warn!(path = %path.display(), "Attachment not found, sending without it");
        return Ok(None);
    }

    let bytes = std::fs::read(path).map_err(|source| ComposeError::Attachment {
        path: path.to_path_buf(),
        source,
    })?;

    let filename = path
        .file_name()
        .map_or_else(|| "attachment".to_string(), |n| n.to_string_lossy().into_owned());

    debug!(%filename, size = bytes.len(), "Attachment loaded");
    Ok(Some(AttachmentFile { filename, bytes }))
}
