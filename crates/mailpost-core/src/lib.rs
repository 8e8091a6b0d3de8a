//! # mailpost-core
//!
//! Composes an email and hands it to an SMTP relay.
//!
//! This crate provides:
//! - **Message Composer**: plain text body, the generated HTML view and an
//!   optional file attachment, assembled into one multipart message
//! - **Transport Client**: connect, STARTTLS, AUTH and a single submission
//! - **Send outcome**: success flag, a human-readable status with
//!   remediation hints, and the details of what was sent
//! - Server presets and request validation for front ends
//!
//! ## Example
//!
//! ```ignore
//! use mailpost_core::{SendRequest, SmtpTransport, send_email};
//!
//! let request = SendRequest::new("me@gmail.com", "app-password", "you@example.com", "Hi", "Hello");
//! let outcome = send_email(&request, &SmtpTransport::new()).await;
//! println!("{}", outcome.message);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod compose;
pub mod config;
mod error;
pub mod outcome;
pub mod request;
pub mod service;

pub use compose::{AttachmentFile, EmailMessage, compose, html_body};
pub use config::{Credentials, Provider, Security, ServerConfig};
pub use error::{ComposeError, SendError};
pub use outcome::{AttachmentInfo, SendDetails, SendOutcome};
pub use request::{SendRequest, ValidationError, validate_request};
pub use service::{SmtpTransport, Transport, blocking, send, send_email};
