//! # mailpost-smtp
//!
//! A small SMTP submission client implementing the subset of RFC 5321 needed
//! to hand one message to a relay: greeting, EHLO, STARTTLS, AUTH, MAIL FROM,
//! RCPT TO, DATA and QUIT.
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailpost_smtp::{Address, Client};
//! use mailpost_smtp::connection::connect;
//!
//! #[tokio::main]
//! async fn main() -> mailpost_smtp::Result<()> {
//!     let stream = connect("smtp.gmail.com", 587).await?;
//!     let client = Client::from_stream(stream).await?;
//!
//!     let client = client.ehlo("localhost").await?;
//!     let client = client.starttls("smtp.gmail.com").await?;
//!     let client = client.authenticate("me@gmail.com", "app-password").await?;
//!
//!     let client = client
//!         .mail_from(Address::new("me@gmail.com")?)
//!         .await?
//!         .rcpt_to(Address::new("you@example.com")?)
//!         .await?
//!         .data()
//!         .await?;
//!
//!     let client = client.send_message(b"Subject: Hi\r\n\r\nHello!\r\n").await?;
//!     client.quit().await
//! }
//! ```
//!
//! ## Connection States
//!
//! The client is a type-state machine, so commands can only be issued in an
//! order the server will accept:
//!
//! ```text
//! Connected ── authenticate() ──→ Authenticated
//!     │                                │
//!     └──────── mail_from() ───────────┴──→ MailTransaction
//!                                               │ rcpt_to()
//!                                               ▼
//!                              Data ←─ data() ─ RecipientAdded
//!                                │
//!                                └─ send_message() ──→ Connected
//! ```
//!
//! ## Modules
//!
//! - [`command`]: SMTP command serialization
//! - [`connection`]: streams and the type-state client
//! - [`parser`]: reply parser
//! - [`types`]: addresses, extensions, replies

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use connection::{
    Authenticated, Client, Connected, Data, MailTransaction, RecipientAdded, ServerInfo,
    SmtpConnection, SmtpStream,
};
pub use error::{Error, Result};
pub use types::{Address, AuthMechanism, Extension, Reply, ReplyCode};
