//! # mailpost-mime
//!
//! MIME generation for outgoing email, plus a reader good enough to take
//! generated messages apart again.
//!
//! ## Features
//!
//! - **Message building**: text, HTML and attachments assembled into the
//!   right multipart tree
//! - **Encoding**: Base64 (line-wrapped), Quoted-Printable, RFC 2047 headers
//! - **Reading**: headers, nested multiparts, decoded bodies
//!
//! ## Building a message
//!
//! ```ignore
//! use mailpost_mime::{Attachment, MessageBuilder};
//!
//! let message = MessageBuilder::new()
//!     .from("sender@example.com")
//!     .to("recipient@example.com")
//!     .subject("Report")
//!     .text_body("See attached.")
//!     .html_body("<p>See attached.</p>")
//!     .attach(Attachment::new("report.pdf", std::fs::read("report.pdf")?))
//!     .build()?;
//!
//! let wire: Vec<u8> = message.to_bytes()?;
//! ```
//!
//! With an attachment the result is
//! `multipart/mixed { multipart/alternative { text/plain, text/html }, attachment }`.
//!
//! ## Reading it back
//!
//! ```ignore
//! let parsed = mailpost_mime::Message::parse(std::str::from_utf8(&wire)?)?;
//! assert_eq!(parsed.attachments().len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod builder;
mod content_type;
mod error;
mod header;
mod message;

pub mod encoding;

pub use builder::{Attachment, MessageBuilder};
pub use content_type::{ContentType, header_parameter};
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{Message, Part, TransferEncoding};
