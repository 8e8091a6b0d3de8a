//! SMTP command serialization.

use crate::types::{Address, AuthMechanism};

/// A command sent by the client.
#[derive(Clone, PartialEq, Eq)]
pub enum Command {
    /// EHLO with the client's hostname.
    Ehlo {
        /// Client hostname
        hostname: String,
    },
    /// STARTTLS
    StartTls,
    /// AUTH with an optional initial response (SASL-IR).
    Auth {
        /// Authentication mechanism
        mechanism: AuthMechanism,
        /// Base64 initial response
        initial_response: Option<String>,
    },
    /// A bare base64 line answering a 334 challenge.
    AuthResponse(String),
    /// MAIL FROM, with the SIZE parameter when the server advertises it.
    MailFrom {
        /// Envelope sender
        from: Address,
        /// Declared message size in bytes
        size: Option<usize>,
    },
    /// RCPT TO
    RcptTo {
        /// Envelope recipient
        to: Address,
    },
    /// DATA
    Data,
    /// QUIT
    Quit,
}

impl Command {
    /// Serializes the command, including the trailing CRLF.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut line = match self {
            Self::Ehlo { hostname } => format!("EHLO {hostname}"),
            Self::StartTls => "STARTTLS".to_string(),
            Self::Auth {
                mechanism,
                initial_response: Some(resp),
            } => format!("AUTH {} {resp}", mechanism.as_str()),
            Self::Auth {
                mechanism,
                initial_response: None,
            } => format!("AUTH {}", mechanism.as_str()),
            Self::AuthResponse(resp) => resp.clone(),
            Self::MailFrom {
                from,
                size: Some(size),
            } => format!("MAIL FROM:<{from}> SIZE={size}"),
            Self::MailFrom { from, size: None } => format!("MAIL FROM:<{from}>"),
            Self::RcptTo { to } => format!("RCPT TO:<{to}>"),
            Self::Data => "DATA".to_string(),
            Self::Quit => "QUIT".to_string(),
        }
        .into_bytes();

        line.extend_from_slice(b"\r\n");
        line
    }
}

/// Credentials never reach logs: AUTH payloads are masked.
impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auth { mechanism, .. } => write!(f, "AUTH {} <redacted>", mechanism.as_str()),
            Self::AuthResponse(_) => f.write_str("<redacted>"),
            other => {
                let line = other.serialize();
                f.write_str(String::from_utf8_lossy(&line).trim_end())
            }
        }
    }
}
