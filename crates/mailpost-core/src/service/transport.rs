//! Transport Client: hands a composed message to an SMTP relay.

use crate::compose::EmailMessage;
use crate::config::{Credentials, Security, ServerConfig};
use crate::error::SendError;
use mailpost_smtp::connection::{connect, connect_tls};
use mailpost_smtp::{Address, Client, Connected, SmtpConnection};
use std::future::Future;
use tracing::{debug, info, warn};

/// Hostname announced in EHLO when none is configured.
pub const DEFAULT_CLIENT_NAME: &str = "localhost";

/// Something that can deliver a composed message.
///
/// The SMTP implementation is [`SmtpTransport`]; tests substitute their own.
pub trait Transport {
    /// Delivers `message` to `server`, authenticating with `credentials`.
    ///
    /// # Errors
    ///
    /// Returns the [`SendError`] class of the step that failed.
    fn deliver(
        &self,
        message: &EmailMessage,
        server: &ServerConfig,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<(), SendError>> + Send;
}

/// Delivers over SMTP: connect, EHLO, STARTTLS, EHLO, AUTH, MAIL FROM, one
/// RCPT TO, DATA, QUIT.
#[derive(Debug, Clone)]
pub struct SmtpTransport {
    client_name: String,
}

impl SmtpTransport {
    /// Creates a transport announcing itself as `localhost`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client_name: DEFAULT_CLIENT_NAME.to_string(),
        }
    }

    /// Sets the hostname sent with EHLO.
    #[must_use]
    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    /// Opens the session up to the point where mail can be submitted.
    async fn open(&self, server: &ServerConfig) -> Result<Client<Connected>, SendError> {
        let host = server.host.as_str();
        info!(host, port = server.port, security = %server.security, "Connecting to SMTP server");

        let stream = match server.security {
            Security::Tls => connect_tls(host, server.port).await,
            Security::StartTls | Security::None => connect(host, server.port).await,
        }
        .map_err(connection_error)?;

        let client = Client::from_stream(stream)
            .await
            .map_err(connection_error)?
            .ehlo(&self.client_name)
            .await
            .map_err(connection_error)?;

        match server.security {
            Security::StartTls => {
                info!("Starting TLS encryption");
                client.starttls(host).await.map_err(connection_error)
            }
            Security::Tls => Ok(client),
            Security::None => {
                warn!(host, "Sending over an unencrypted connection");
                Ok(client)
            }
        }
    }
}

impl Default for SmtpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for SmtpTransport {
    async fn deliver(
        &self,
        message: &EmailMessage,
        server: &ServerConfig,
        credentials: &Credentials,
    ) -> Result<(), SendError> {
        info!("Preparing email content");
        let payload = message.to_bytes()?;

        let from = Address::new(&message.sender).map_err(transport_error)?;
        let to = Address::new(&message.recipient).map_err(transport_error)?;

        let client = self.open(server).await?;
        debug!(encrypted = client.is_encrypted(), "Session established");

        info!(username = %credentials.username, "Authenticating with server");
        let client = client
            .authenticate(&credentials.username, credentials.password())
            .await
            .map_err(auth_error)?;

        info!(bytes = payload.len(), "Sending email via SMTP");
        let client = client
            .mail_from(from, Some(payload.len()))
            .await
            .map_err(transport_error)?
            .rcpt_to(to)
            .await
            .map_err(transport_error)?
            .data()
            .await
            .map_err(transport_error)?
            .send_message(&payload)
            .await
            .map_err(transport_error)?;

        info!("Message accepted by server");

        // The message is already handed over; a failed QUIT does not undo that.
        if let Err(e) = client.quit().await {
            warn!(error = %e, "QUIT failed after delivery");
        }

        Ok(())
    }
}

fn connection_error(err: mailpost_smtp::Error) -> SendError {
    SendError::Connection(err.to_string())
}

/// A reply to AUTH means the server judged the credentials; anything else
/// means the session broke underneath.
fn auth_error(err: mailpost_smtp::Error) -> SendError {
    match err {
        mailpost_smtp::Error::Rejected { .. } | mailpost_smtp::Error::NotSupported(_) => {
            SendError::Authentication(err.to_string())
        }
        other => SendError::Connection(other.to_string()),
    }
}

fn transport_error(err: mailpost_smtp::Error) -> SendError {
    SendError::Transport(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_classification() {
        let rejected = mailpost_smtp::Error::Rejected {
            code: 535,
            message: "5.7.8 Username and Password not accepted".into(),
        };
        assert!(matches!(auth_error(rejected), SendError::Authentication(_)));

        let io = mailpost_smtp::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset",
        ));
        assert!(matches!(auth_error(io), SendError::Connection(_)));
    }

    #[test]
    fn test_client_name() {
        let transport = SmtpTransport::default().with_client_name("mailpost.local");
        assert_eq!(transport.client_name, "mailpost.local");
        assert_eq!(SmtpTransport::new().client_name, DEFAULT_CLIENT_NAME);
    }
}
