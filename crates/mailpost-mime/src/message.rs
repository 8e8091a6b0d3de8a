//! MIME message structure, serialization and parsing.

use crate::content_type::{ContentType, header_parameter};
use crate::encoding::{decode_base64, decode_quoted_printable, decode_rfc2047};
use crate::error::{Error, Result};
use crate::header::Headers;
use std::fmt;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit text.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from a header value. Unknown values count as
    /// 7bit.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit,
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// A MIME entity inside a message.
///
/// Leaf parts carry an encoded `body`; multipart parts carry child `parts`
/// and an empty body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Part {
    /// Part headers.
    pub headers: Headers,
    /// Body as it appears on the wire (still transfer-encoded).
    pub body: Vec<u8>,
    /// Child parts of a multipart entity.
    pub parts: Vec<Part>,
}

impl Part {
    /// Creates a leaf part.
    #[must_use]
    pub const fn new(headers: Headers, body: Vec<u8>) -> Self {
        Self {
            headers,
            body,
            parts: Vec::new(),
        }
    }

    /// Creates a multipart part. `headers` must carry a multipart
    /// Content-Type with a boundary.
    #[must_use]
    pub const fn multipart(headers: Headers, parts: Vec<Self>) -> Self {
        Self {
            headers,
            body: Vec::new(),
            parts,
        }
    }

    /// Gets the content type, defaulting to `text/plain`.
    ///
    /// # Errors
    ///
    /// Returns an error if the Content-Type header is invalid.
    pub fn content_type(&self) -> Result<ContentType> {
        content_type_of(&self.headers)
    }

    /// Gets the transfer encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        transfer_encoding_of(&self.headers)
    }

    /// Decodes the body according to the transfer encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails.
    pub fn decode_body(&self) -> Result<Vec<u8>> {
        decode(&self.body, self.transfer_encoding())
    }

    /// Gets the decoded body as text, with CRLF line breaks turned back into
    /// `\n`.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding or UTF-8 conversion fails.
    pub fn body_text(&self) -> Result<String> {
        let text = String::from_utf8(self.decode_body()?)?;
        Ok(text.replace("\r\n", "\n"))
    }

    /// Returns true if the part is marked as an attachment.
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        self.headers
            .get("content-disposition")
            .is_some_and(|d| d.trim_start().to_ascii_lowercase().starts_with("attachment"))
    }

    /// Returns the attachment filename from Content-Disposition, falling back
    /// to the Content-Type `name` parameter.
    #[must_use]
    pub fn filename(&self) -> Option<String> {
        let raw = self
            .headers
            .get("content-disposition")
            .and_then(|d| header_parameter(d, "filename"))
            .or_else(|| {
                self.headers
                    .get("content-type")
                    .and_then(|ct| header_parameter(ct, "name"))
            })?;

        Some(decode_rfc2047(&raw).unwrap_or(raw))
    }

    /// Serializes the part (headers, blank line, body).
    ///
    /// # Errors
    ///
    /// Returns an error if a multipart part has no boundary.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        write_entity(&mut out, &self.headers, &self.body, &self.parts)?;
        Ok(out)
    }

    /// Parses a single entity, recursing into multipart bodies.
    ///
    /// # Errors
    ///
    /// Returns an error if the Content-Type is invalid or a multipart body
    /// is malformed.
    pub fn parse(text: &str) -> Result<Self> {
        let (headers, body) = split_entity(text);
        let headers = Headers::parse(headers);
        let content_type = content_type_of(&headers)?;

        if content_type.is_multipart() {
            let boundary = content_type.boundary().ok_or(Error::MissingBoundary)?;
            let parts = parse_multipart(body, boundary)?;
            Ok(Self::multipart(headers, parts))
        } else {
            Ok(Self::new(headers, body.as_bytes().to_vec()))
        }
    }

    fn walk<'a>(&'a self, found: &mut Vec<&'a Self>) {
        if self.parts.is_empty() {
            found.push(self);
        }
        for part in &self.parts {
            part.walk(found);
        }
    }
}

/// A complete MIME message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Top-level headers, including the root Content-Type.
    pub headers: Headers,
    /// Parts of a multipart message (empty for single-part messages).
    pub parts: Vec<Part>,
    /// Body of a single-part message.
    pub body: Option<Vec<u8>>,
}

impl Message {
    /// Creates a single-part message.
    #[must_use]
    pub const fn single_part(headers: Headers, body: Vec<u8>) -> Self {
        Self {
            headers,
            parts: Vec::new(),
            body: Some(body),
        }
    }

    /// Creates a multipart message.
    #[must_use]
    pub const fn multipart(headers: Headers, parts: Vec<Part>) -> Self {
        Self {
            headers,
            parts,
            body: None,
        }
    }

    /// Gets the content type, defaulting to `text/plain`.
    ///
    /// # Errors
    ///
    /// Returns an error if the Content-Type header is invalid.
    pub fn content_type(&self) -> Result<ContentType> {
        content_type_of(&self.headers)
    }

    /// Checks if this is a multipart message.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        !self.parts.is_empty()
    }

    /// Gets the From header.
    #[must_use]
    pub fn from(&self) -> Option<&str> {
        self.headers.get("from")
    }

    /// Gets the To header.
    #[must_use]
    pub fn to(&self) -> Option<&str> {
        self.headers.get("to")
    }

    /// Gets the Subject header, decoding an RFC 2047 encoded word.
    #[must_use]
    pub fn subject(&self) -> Option<String> {
        let raw = self.headers.get("subject")?;
        Some(decode_rfc2047(raw).unwrap_or_else(|_| raw.to_string()))
    }

    /// Gets the Date header.
    #[must_use]
    pub fn date(&self) -> Option<&str> {
        self.headers.get("date")
    }

    /// Gets the Message-ID header.
    #[must_use]
    pub fn message_id(&self) -> Option<&str> {
        self.headers.get("message-id")
    }

    /// Gets the body as text for single-part messages.
    ///
    /// # Errors
    ///
    /// Returns an error if this is a multipart message or decoding fails.
    pub fn body_text(&self) -> Result<String> {
        let body = self.body.as_ref().ok_or_else(|| {
            Error::InvalidMultipart("Use parts for multipart messages".to_string())
        })?;

        let decoded = decode(body, transfer_encoding_of(&self.headers))?;
        Ok(String::from_utf8(decoded)?.replace("\r\n", "\n"))
    }

    /// Returns every leaf part, depth first.
    #[must_use]
    pub fn leaf_parts(&self) -> Vec<&Part> {
        let mut found = Vec::new();
        for part in &self.parts {
            part.walk(&mut found);
        }
        found
    }

    /// Finds the first inline text/plain part, searching nested multiparts.
    ///
    /// # Errors
    ///
    /// Returns an error if no text part is found or decoding fails.
    pub fn text_part(&self) -> Result<String> {
        self.find_text("plain")
    }

    /// Finds the first inline text/html part, searching nested multiparts.
    ///
    /// # Errors
    ///
    /// Returns an error if no HTML part is found or decoding fails.
    pub fn html_part(&self) -> Result<String> {
        self.find_text("html")
    }

    /// Returns the parts marked as attachments.
    #[must_use]
    pub fn attachments(&self) -> Vec<&Part> {
        self.leaf_parts()
            .into_iter()
            .filter(|p| p.is_attachment())
            .collect()
    }

    /// Serializes the message with CRLF line endings.
    ///
    /// # Errors
    ///
    /// Returns an error if a multipart entity has no boundary.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let body = self.body.as_deref().unwrap_or_default();
        write_entity(&mut out, &self.headers, body, &self.parts)?;
        Ok(out)
    }

    /// Parses a message, recursing into nested multiparts.
    ///
    /// # Errors
    ///
    /// Returns an error if the Content-Type is invalid or a multipart body
    /// is malformed.
    pub fn parse(text: &str) -> Result<Self> {
        let root = Part::parse(text)?;
        if root.parts.is_empty() {
            Ok(Self::single_part(root.headers, root.body))
        } else {
            Ok(Self::multipart(root.headers, root.parts))
        }
    }

    fn find_text(&self, sub_type: &str) -> Result<String> {
        if self.parts.is_empty() {
            if self.content_type()?.is("text", sub_type) {
                return self.body_text();
            }
        } else {
            for part in self.leaf_parts() {
                if !part.is_attachment() && part.content_type()?.is("text", sub_type) {
                    return part.body_text();
                }
            }
        }

        Err(Error::Parse(format!("No text/{sub_type} part found")))
    }
}

fn content_type_of(headers: &Headers) -> Result<ContentType> {
    headers
        .get("content-type")
        .map_or_else(|| Ok(ContentType::text_plain()), ContentType::parse)
}

fn transfer_encoding_of(headers: &Headers) -> TransferEncoding {
    headers
        .get("content-transfer-encoding")
        .map_or(TransferEncoding::SevenBit, TransferEncoding::parse)
}

fn decode(body: &[u8], encoding: TransferEncoding) -> Result<Vec<u8>> {
    match encoding {
        TransferEncoding::Base64 => decode_base64(&String::from_utf8_lossy(body)),
        TransferEncoding::QuotedPrintable => {
            decode_quoted_printable(&String::from_utf8_lossy(body))
        }
        _ => Ok(body.to_vec()),
    }
}

fn write_entity(out: &mut Vec<u8>, headers: &Headers, body: &[u8], parts: &[Part]) -> Result<()> {
    out.extend_from_slice(headers.to_string().as_bytes());
    out.extend_from_slice(b"\r\n");

    if parts.is_empty() {
        out.extend_from_slice(body);
        return Ok(());
    }

    let content_type = content_type_of(headers)?;
    let boundary = content_type.boundary().ok_or(Error::MissingBoundary)?;

    for part in parts {
        out.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        write_entity(out, &part.headers, &part.body, &part.parts)?;
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    Ok(())
}

/// Splits an entity at the first blank line.
fn split_entity(text: &str) -> (&str, &str) {
    // An entity with no headers starts with the blank line itself.
    if let Some(body) = text.strip_prefix("\r\n").or_else(|| text.strip_prefix('\n')) {
        return ("", body);
    }

    let crlf = text.find("\r\n\r\n").map(|i| (i, 4));
    let lf = text.find("\n\n").map(|i| (i, 2));

    let split = match (crlf, lf) {
        (Some(a), Some(b)) => Some(if a.0 < b.0 { a } else { b }),
        (a, b) => a.or(b),
    };

    match split {
        Some((index, len)) => (&text[..index], &text[index + len..]),
        None => (text, ""),
    }
}

fn parse_multipart(body: &str, boundary: &str) -> Result<Vec<Part>> {
    let delimiter = format!("--{boundary}");
    let close = format!("{delimiter}--");

    let mut parts = Vec::new();
    let mut current: Option<String> = None;
    let mut closed = false;

    for line in body.split_inclusive('\n') {
        let bare = line.trim_end();
        if bare == delimiter || bare == close {
            if let Some(section) = current.take() {
                parts.push(Part::parse(strip_line_break(&section))?);
            }
            if bare == close {
                closed = true;
                break;
            }
            current = Some(String::new());
        } else if let Some(section) = current.as_mut() {
            section.push_str(line);
        }
    }

    if !closed {
        if let Some(section) = current {
            parts.push(Part::parse(strip_line_break(&section))?);
        }
    }

    if parts.is_empty() {
        return Err(Error::InvalidMultipart(format!(
            "No parts found for boundary '{boundary}'"
        )));
    }

    Ok(parts)
}

/// Drops the line break that belongs to the following delimiter.
fn strip_line_break(section: &str) -> &str {
    section
        .strip_suffix("\r\n")
        .or_else(|| section.strip_suffix('\n'))
        .unwrap_or(section)
}
