//! SMTP connection management with type-state pattern.

mod client;
mod stream;

pub use client::{
    Authenticated, Client, Connected, Data, MailTransaction, RecipientAdded, SmtpConnection,
};
pub use stream::{AsyncStream, SmtpStream, connect, connect_tls};

use crate::types::{AuthMechanism, Extension};
use std::collections::HashSet;

/// What the server told us about itself.
#[derive(Debug, Clone, Default)]
pub struct ServerInfo {
    /// Server hostname from the greeting.
    pub hostname: String,
    /// Extensions from the latest EHLO reply.
    pub extensions: HashSet<Extension>,
}

impl ServerInfo {
    /// Replaces the extension set with the one in an EHLO reply.
    ///
    /// The first reply line is the server's greeting and is skipped.
    pub fn update_from_ehlo(&mut self, lines: &[String]) {
        self.extensions = lines.iter().skip(1).map(|l| Extension::parse(l)).collect();
    }

    /// Checks if the server supports an extension.
    #[must_use]
    pub fn supports(&self, ext: &Extension) -> bool {
        self.extensions.contains(ext)
    }

    /// Checks if STARTTLS is offered.
    #[must_use]
    pub fn supports_starttls(&self) -> bool {
        self.supports(&Extension::StartTls)
    }

    /// Returns the maximum message size, if advertised with a value.
    #[must_use]
    pub fn max_message_size(&self) -> Option<usize> {
        self.extensions.iter().find_map(|ext| match ext {
            Extension::Size(size) => *size,
            _ => None,
        })
    }

    /// Returns true if SIZE is advertised at all.
    #[must_use]
    pub fn supports_size(&self) -> bool {
        self.extensions
            .iter()
            .any(|ext| matches!(ext, Extension::Size(_)))
    }

    /// Returns the advertised authentication mechanisms.
    #[must_use]
    pub fn auth_mechanisms(&self) -> Vec<AuthMechanism> {
        self.extensions
            .iter()
            .find_map(|ext| match ext {
                Extension::Auth(mechanisms) => Some(mechanisms.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Picks the mechanism to log in with: PLAIN, then LOGIN.
    ///
    /// A server that does not list AUTH at all gets PLAIN and the chance to
    /// reject it.
    #[must_use]
    pub fn preferred_auth(&self) -> Option<AuthMechanism> {
        let offered = self.auth_mechanisms();
        if offered.is_empty() || offered.contains(&AuthMechanism::Plain) {
            Some(AuthMechanism::Plain)
        } else if offered.contains(&AuthMechanism::Login) {
            Some(AuthMechanism::Login)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(lines: &[&str]) -> ServerInfo {
        let lines: Vec<String> = lines.iter().map(ToString::to_string).collect();
        let mut info = ServerInfo::default();
        info.update_from_ehlo(&lines);
        info
    }

    #[test]
    fn greeting_line_is_not_an_extension() {
        let info = info(&["smtp.example.com Hello", "STARTTLS"]);
        assert_eq!(info.extensions.len(), 1);
        assert!(info.supports_starttls());
    }

    #[test]
    fn size_limit() {
        assert_eq!(
            info(&["hi", "SIZE 1024"]).max_message_size(),
            Some(1024)
        );
        let no_value = info(&["hi", "SIZE"]);
        assert!(no_value.supports_size());
        assert_eq!(no_value.max_message_size(), None);
        assert!(!info(&["hi"]).supports_size());
    }

    #[test]
    fn auth_preference() {
        assert_eq!(
            info(&["hi", "AUTH LOGIN PLAIN"]).preferred_auth(),
            Some(AuthMechanism::Plain)
        );
        assert_eq!(
            info(&["hi", "AUTH LOGIN XOAUTH2"]).preferred_auth(),
            Some(AuthMechanism::Login)
        );
        assert_eq!(info(&["hi", "AUTH XOAUTH2"]).preferred_auth(), None);
        assert_eq!(info(&["hi"]).preferred_auth(), Some(AuthMechanism::Plain));
    }
}
