//! Turning a request into a [`SendOutcome`].

use super::transport::Transport;
use crate::compose::{EmailMessage, compose};
use crate::config::{Credentials, ServerConfig};
use crate::error::SendError;
use crate::outcome::{SendDetails, SendOutcome};
use crate::request::SendRequest;
use tracing::{info, warn};

/// Sends a composed message and reports the outcome.
///
/// Failures never escape as errors; they come back as an outcome with
/// `ok == false` and a guidance message.
pub async fn send<T: Transport>(
    transport: &T,
    message: &EmailMessage,
    server: &ServerConfig,
    credentials: &Credentials,
) -> SendOutcome {
    let result = transport
        .deliver(message, server, credentials)
        .await
        .map(|()| SendDetails::new(message, server));

    match &result {
        Ok(_) => info!(to = %message.recipient, "Email sent"),
        Err(error) => warn!(%error, "Email not sent"),
    }

    result.into()
}

/// Composes the request's message and sends it.
///
/// An unreadable attachment fails here, before any network activity.
/// Field validation is the caller's job (see
/// [`validate_request`](crate::request::validate_request)).
pub async fn send_email<T: Transport>(request: &SendRequest, transport: &T) -> SendOutcome {
    let message = match compose(
        &request.sender,
        &request.recipient,
        &request.subject,
        &request.body,
        request.attachment.as_deref(),
    ) {
        Ok(message) => message,
        Err(error) => {
            let error = SendError::from(error);
            warn!(%error, "Composition failed");
            return SendOutcome::failure(&error);
        }
    };

    send(transport, &message, &request.server, &request.credentials()).await
}

/// Blocking wrappers for callers without an async runtime.
pub mod blocking {
    use crate::error::SendError;
    use crate::outcome::SendOutcome;
    use crate::request::SendRequest;
    use crate::service::SmtpTransport;

    /// Sends over SMTP, blocking the calling thread until the relay answers.
    ///
    /// Runs on a private current-thread runtime, so it must not be called
    /// from inside another Tokio runtime.
    #[must_use]
    pub fn send_email(request: &SendRequest) -> SendOutcome {
        match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime.block_on(super::send_email(request, &SmtpTransport::new())),
            Err(e) => SendOutcome::failure(&SendError::Transport(e.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every delivery and answers with a canned result.
    #[derive(Default)]
    struct MockTransport {
        fail_with: Option<fn() -> SendError>,
        delivered: Mutex<Vec<(EmailMessage, ServerConfig, String)>>,
    }

    impl MockTransport {
        fn failing(error: fn() -> SendError) -> Self {
            Self {
                fail_with: Some(error),
                ..Self::default()
            }
        }
    }

    impl Transport for MockTransport {
        async fn deliver(
            &self,
            message: &EmailMessage,
            server: &ServerConfig,
            credentials: &Credentials,
        ) -> Result<(), SendError> {
            self.delivered.lock().unwrap().push((
                message.clone(),
                server.clone(),
                credentials.username.clone(),
            ));
            self.fail_with.map_or(Ok(()), |error| Err(error()))
        }
    }

    fn request() -> SendRequest {
        SendRequest::new("a@x.com", "app-password", "b@y.com", "Hi", "Hello\nWorld")
    }

    #[tokio::test]
    async fn test_fixed_input_succeeds() {
        let transport = MockTransport::default();
        let outcome = send_email(&request(), &transport).await;

        assert!(outcome.ok);
        assert_eq!(outcome.message, "Email sent successfully!");
        let details = outcome.details.unwrap();
        assert!(details.attachment.is_none());
        assert!(details.html_included);
        assert_eq!(details.body_length, 11);
        assert_eq!(details.from, "a@x.com");
        assert_eq!(details.to, "b@y.com");
        assert_eq!(details.smtp_server, "smtp.gmail.com");
        assert_eq!(details.port, 587);

        let delivered = transport.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].2, "a@x.com");
    }

    #[tokio::test]
    async fn test_body_length_counts_characters() {
        let transport = MockTransport::default();
        let mut req = request();
        req.body = "naïve café ☕".to_string();
        let outcome = send_email(&req, &transport).await;
        assert_eq!(outcome.details.unwrap().body_length, 12);
    }

    #[tokio::test]
    async fn test_auth_failure_gives_guidance() {
        let transport = MockTransport::failing(|| SendError::Authentication("535".into()));
        let outcome = send_email(&request(), &transport).await;

        assert!(!outcome.ok);
        assert!(outcome.details.is_none());
        assert!(outcome.message.contains("Authentication failed"));
        assert!(outcome.message.contains("App Password"));
    }

    #[tokio::test]
    async fn test_unreadable_attachment_skips_network() {
        let dir = tempfile::tempdir().unwrap();
        let transport = MockTransport::default();
        let outcome = send_email(&request().with_attachment(dir.path()), &transport).await;

        assert!(!outcome.ok);
        assert!(outcome.message.starts_with("Error processing attachment: "));
        assert!(transport.delivered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_attachment_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        std::fs::write(&path, vec![0xFF_u8; 1_572_864]).unwrap();

        let transport = MockTransport::default();
        let outcome = send_email(&request().with_attachment(&path), &transport).await;

        let attachment = outcome.details.unwrap().attachment.unwrap();
        assert_eq!(attachment.filename, "photo.jpg");
        assert_eq!(attachment.size, 1_572_864);
        assert!((attachment.size_mb - 1.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_missing_attachment_still_sends() {
        let transport = MockTransport::default();
        let outcome =
            send_email(&request().with_attachment("/definitely/not/here.pdf"), &transport).await;

        assert!(outcome.ok);
        assert!(outcome.details.unwrap().attachment.is_none());
    }

    #[test]
    fn test_blocking_send_reports_unreachable_relay() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let request = request().with_server(ServerConfig::new("127.0.0.1", port));
        let outcome = blocking::send_email(&request);

        assert!(!outcome.ok);
        assert!(outcome.details.is_none());
        assert!(outcome.message.starts_with("Connection failed!"));
    }
}
