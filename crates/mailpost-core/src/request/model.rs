//! Send request model.

use crate::config::{Credentials, ServerConfig};
use std::fmt;
use std::path::PathBuf;

/// Everything needed for one send, collected by the front end.
#[derive(Clone, PartialEq, Eq)]
pub struct SendRequest {
    /// Sender address, also the AUTH username.
    pub sender: String,
    /// App password for the sender account.
    pub password: String,
    /// The single recipient.
    pub recipient: String,
    /// Subject line.
    pub subject: String,
    /// Plain text body.
    pub body: String,
    /// Optional file to attach.
    pub attachment: Option<PathBuf>,
    /// Relay settings.
    pub server: ServerConfig,
}

impl SendRequest {
    /// Creates a request for the default relay without an attachment.
    #[must_use]
    pub fn new(
        sender: impl Into<String>,
        password: impl Into<String>,
        recipient: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            password: password.into(),
            recipient: recipient.into(),
            subject: subject.into(),
            body: body.into(),
            attachment: None,
            server: ServerConfig::default(),
        }
    }

    /// Attaches a file.
    #[must_use]
    pub fn with_attachment(mut self, path: impl Into<PathBuf>) -> Self {
        self.attachment = Some(path.into());
        self
    }

    /// Sets the relay.
    #[must_use]
    pub fn with_server(mut self, server: ServerConfig) -> Self {
        self.server = server;
        self
    }

    /// AUTH credentials: the sender address and the password.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.sender, &self.password)
    }
}

impl fmt::Debug for SendRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendRequest")
            .field("sender", &self.sender)
            .field("password", &"<redacted>")
            .field("recipient", &self.recipient)
            .field("subject", &self.subject)
            .field("body_len", &self.body.len())
            .field("attachment", &self.attachment)
            .field("server", &self.server)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_credentials() {
        let request = SendRequest::new("a@x.com", "secret", "b@y.com", "Hi", "Hello")
            .with_attachment("/tmp/report.pdf")
            .with_server(ServerConfig::new("localhost", 2525));

        assert_eq!(request.server.port, 2525);
        assert_eq!(request.attachment, Some(PathBuf::from("/tmp/report.pdf")));

        let credentials = request.credentials();
        assert_eq!(credentials.username, "a@x.com");
        assert_eq!(credentials.password(), "secret");
        assert!(!format!("{request:?}").contains("secret"));
    }
}
