//! Builder for outgoing MIME messages.

use crate::content_type::{ContentType, quote_if_needed};
use crate::encoding::{encode_base64_lines, encode_quoted_printable, encode_rfc2047};
use crate::error::{Error, Result};
use crate::header::Headers;
use crate::message::{Message, Part, TransferEncoding};
use chrono::{DateTime, FixedOffset, Local, Utc};
use std::sync::atomic::{AtomicU64, Ordering};

/// Boundary prefix. Neither quoted-printable nor base64 output can contain
/// `=_`, so the boundary never collides with an encoded body.
const BOUNDARY_PREFIX: &str = "=_mailpost_";

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// A file to attach to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File name shown to the recipient.
    pub filename: String,
    /// Content type, `application/octet-stream` unless set.
    pub content_type: ContentType,
    /// Raw file contents.
    pub data: Vec<u8>,
}

impl Attachment {
    /// Creates an `application/octet-stream` attachment.
    #[must_use]
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: ContentType::application_octet_stream(),
            data,
        }
    }

    fn into_part(self) -> Part {
        let filename = quote_if_needed(&encode_rfc2047(&self.filename, "utf-8"));

        let mut headers = Headers::new();
        headers.add("Content-Type", self.content_type.to_string());
        headers.add(
            "Content-Disposition",
            format!("attachment; filename={filename}"),
        );
        headers.add(
            "Content-Transfer-Encoding",
            TransferEncoding::Base64.to_string(),
        );

        Part::new(headers, encode_base64_lines(&self.data).into_bytes())
    }
}

/// Builds a [`Message`].
///
/// Text and HTML bodies become a `multipart/alternative`; attachments wrap
/// that in a `multipart/mixed`. A message with a single body and no
/// attachments is emitted as a single part.
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    from: Option<String>,
    to: Vec<String>,
    subject: Option<String>,
    date: Option<DateTime<FixedOffset>>,
    message_id: Option<String>,
    text: Option<String>,
    html: Option<String>,
    attachments: Vec<Attachment>,
    always_mixed: bool,
}

impl MessageBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the `From` address.
    #[must_use]
    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Adds a `To` recipient.
    #[must_use]
    pub fn to(mut self, to: impl Into<String>) -> Self {
        self.to.push(to.into());
        self
    }

    /// Sets the subject.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Sets the `Date` header. Defaults to the current local time.
    #[must_use]
    pub const fn date(mut self, date: DateTime<FixedOffset>) -> Self {
        self.date = Some(date);
        self
    }

    /// Sets the `Message-ID` (angle brackets included). Generated when unset.
    #[must_use]
    pub fn message_id(mut self, id: impl Into<String>) -> Self {
        self.message_id = Some(id.into());
        self
    }

    /// Sets the plain text body.
    #[must_use]
    pub fn text_body(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Sets the HTML body.
    #[must_use]
    pub fn html_body(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    /// Adds an attachment.
    #[must_use]
    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Wraps the body in `multipart/mixed` even when there are no
    /// attachments, so the structure is the same either way.
    #[must_use]
    pub const fn mixed(mut self) -> Self {
        self.always_mixed = true;
        self
    }

    /// Assembles the message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingHeader`] without a sender or recipient and
    /// [`Error::MissingBody`] without any body.
    pub fn build(self) -> Result<Message> {
        let from = self
            .from
            .ok_or_else(|| Error::MissingHeader("From".to_string()))?;
        if self.to.is_empty() {
            return Err(Error::MissingHeader("To".to_string()));
        }

        let mut body = Vec::new();
        if let Some(text) = &self.text {
            body.push(text_part(ContentType::text_plain(), text));
        }
        if let Some(html) = &self.html {
            body.push(text_part(ContentType::text_html(), html));
        }

        let body = match body.len() {
            0 => return Err(Error::MissingBody),
            1 => body.remove(0),
            _ => multipart_part(ContentType::multipart_alternative(boundary()), body),
        };

        let root = if self.attachments.is_empty() && !self.always_mixed {
            body
        } else {
            let mut parts = vec![body];
            parts.extend(self.attachments.into_iter().map(Attachment::into_part));
            multipart_part(ContentType::multipart_mixed(boundary()), parts)
        };

        let date = self.date.unwrap_or_else(|| Local::now().fixed_offset());
        let message_id = self
            .message_id
            .unwrap_or_else(|| generate_message_id(&from));

        let mut headers = Headers::new();
        headers.add("Date", date.to_rfc2822());
        headers.add("From", &from);
        headers.add("To", self.to.join(", "));
        headers.add(
            "Subject",
            encode_rfc2047(self.subject.as_deref().unwrap_or_default(), "utf-8"),
        );
        headers.add("Message-ID", message_id);
        headers.add("MIME-Version", "1.0");
        for (name, value) in root.headers.iter() {
            headers.add(name, value);
        }

        if root.parts.is_empty() {
            Ok(Message::single_part(headers, root.body))
        } else {
            Ok(Message::multipart(headers, root.parts))
        }
    }
}

fn text_part(content_type: ContentType, text: &str) -> Part {
    let mut headers = Headers::new();
    headers.add("Content-Type", content_type.to_string());
    headers.add(
        "Content-Transfer-Encoding",
        TransferEncoding::QuotedPrintable.to_string(),
    );
    Part::new(headers, encode_quoted_printable(text).into_bytes())
}

fn multipart_part(content_type: ContentType, parts: Vec<Part>) -> Part {
    let mut headers = Headers::new();
    headers.add("Content-Type", content_type.to_string());
    Part::multipart(headers, parts)
}

/// A token unique within this process and, through the timestamp and pid,
/// practically unique across processes.
fn unique_token() -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{nanos:x}.{:x}.{sequence:x}", std::process::id())
}

fn boundary() -> String {
    format!("{BOUNDARY_PREFIX}{}", unique_token())
}

fn generate_message_id(from: &str) -> String {
    let domain = from
        .rsplit_once('@')
        .map(|(_, domain)| domain.trim_end_matches('>').trim())
        .filter(|domain| !domain.is_empty())
        .unwrap_or("localhost");
    format!("<{}@{domain}>", unique_token())
}
